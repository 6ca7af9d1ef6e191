//! Save serialization with explicit schema versioning and forward-only
//! migration.
//!
//! The save is a versioned JSON document keyed by catalog names, not dense
//! ids, so content reordering between releases cannot corrupt a save. All
//! amounts are carried as decimal strings to avoid precision loss. On load
//! the version field is read from the untyped JSON tree first: future
//! versions fail closed, older versions run the ordered migration chain
//! before the typed decode. Modifier-graph state is never persisted; it is
//! re-derived from the owned and granted sets.

use crate::amount::{parse_amount, Millis, Ticks};
use crate::catalog::Catalog;
use crate::engine::{Engine, EngineConfig};
use crate::state::{CraftingOrder, GameState, Golem, Shipment};
use crate::id::{OrderId, ShipmentId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::info;

/// Current save schema version.
pub const SAVE_VERSION: u32 = 2;

/// Why a save could not be written or reconstructed. Load failures are
/// surfaced to the player; the file is never auto-deleted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SaveError {
    #[error("save document is corrupt: {0}")]
    Corruption(String),

    #[error("save version {0} is newer than supported version {SAVE_VERSION}")]
    UnsupportedVersion(u32),

    #[error("migration from version {from} failed: {reason}")]
    Migration { from: u32, reason: String },

    #[error("save references unknown {kind} {name:?}")]
    UnknownName { kind: &'static str, name: String },
}

// ---------------------------------------------------------------------------
// Document layout (current version)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct GolemDoc {
    blueprint: String,
    work: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OrderDoc {
    id: u64,
    recipe: String,
    requester: String,
    expiry: Ticks,
}

#[derive(Debug, Serialize, Deserialize)]
struct ShipmentDoc {
    id: u64,
    route: String,
    arrival: Ticks,
}

#[derive(Debug, Serialize, Deserialize)]
struct SaveDoc {
    version: u32,
    saved_at_ms: Millis,
    tick: Ticks,
    remainder_ms: Millis,
    /// Resource name -> decimal string.
    ledger: BTreeMap<String, String>,
    unlocked_paths: Vec<String>,
    owned: Vec<String>,
    golems: Vec<GolemDoc>,
    orders: Vec<OrderDoc>,
    shipments: Vec<ShipmentDoc>,
    granted: Vec<String>,
    next_order: u64,
    next_shipment: u64,
}

// ---------------------------------------------------------------------------
// Serialize
// ---------------------------------------------------------------------------

/// Serialize the engine into the current save document.
pub fn serialize(engine: &Engine, saved_at_ms: Millis) -> Result<String, SaveError> {
    let catalog = engine.catalog();
    let state = engine.state();

    let name_of_ownable = |id: crate::id::OwnableId| -> Result<String, SaveError> {
        catalog
            .ownable(id)
            .map(|d| d.name.clone())
            .ok_or(SaveError::Corruption("ownable id out of range".into()))
    };

    let mut ledger = BTreeMap::new();
    for (id, def) in catalog.resources() {
        ledger.insert(def.name.clone(), state.ledger.get(id).to_string());
    }

    let unlocked_paths = catalog
        .paths()
        .filter(|(id, _)| state.paths[id.0 as usize].unlocked)
        .map(|(_, def)| def.name.clone())
        .collect();

    let owned = state
        .owned
        .iter()
        .map(|&id| name_of_ownable(id))
        .collect::<Result<_, _>>()?;

    let golems = state
        .golems
        .values()
        .map(|g| {
            Ok(GolemDoc {
                blueprint: name_of_ownable(g.blueprint)?,
                work: g.work,
            })
        })
        .collect::<Result<_, SaveError>>()?;

    let orders = state
        .orders
        .iter()
        .map(|o| {
            let requester = catalog
                .path(o.requester)
                .map(|d| d.name.clone())
                .ok_or(SaveError::Corruption("path id out of range".into()))?;
            Ok(OrderDoc {
                id: o.id.0,
                recipe: name_of_ownable(o.recipe)?,
                requester,
                expiry: o.expiry,
            })
        })
        .collect::<Result<_, SaveError>>()?;

    let shipments = state
        .shipments
        .iter()
        .map(|s| {
            Ok(ShipmentDoc {
                id: s.id.0,
                route: name_of_ownable(s.route)?,
                arrival: s.arrival,
            })
        })
        .collect::<Result<_, SaveError>>()?;

    let granted = state
        .granted
        .iter()
        .map(|&id| {
            catalog
                .achievement(id)
                .map(|d| d.name.clone())
                .ok_or(SaveError::Corruption("achievement id out of range".into()))
        })
        .collect::<Result<_, _>>()?;

    let (next_order, next_shipment) = state.id_counters();
    let doc = SaveDoc {
        version: SAVE_VERSION,
        saved_at_ms,
        tick: state.tick,
        remainder_ms: engine.remainder_ms(),
        ledger,
        unlocked_paths,
        owned,
        golems,
        orders,
        shipments,
        granted,
        next_order,
        next_shipment,
    };
    serde_json::to_string_pretty(&doc).map_err(|e| SaveError::Corruption(e.to_string()))
}

// ---------------------------------------------------------------------------
// Migrations
// ---------------------------------------------------------------------------

type MigrationFn = fn(Value) -> Result<Value, SaveError>;

/// Ordered chain of forward-only migration steps. `steps[n]` migrates a
/// version `n + 1` document to version `n + 2`.
struct MigrationRegistry {
    steps: Vec<MigrationFn>,
}

impl MigrationRegistry {
    fn new() -> Self {
        Self {
            steps: vec![migrate_v1_to_v2],
        }
    }

    fn migrate(&self, mut doc: Value, from: u32) -> Result<Value, SaveError> {
        for version in from..SAVE_VERSION {
            let step = self
                .steps
                .get((version - 1) as usize)
                .ok_or(SaveError::Migration {
                    from: version,
                    reason: "no migration step registered".into(),
                })?;
            info!(from = version, to = version + 1, "migrating save");
            doc = step(doc)?;
            if let Some(field) = doc.get_mut("version") {
                *field = Value::from(version + 1);
            }
        }
        Ok(doc)
    }
}

/// v1 stored ledger amounts as JSON numbers and predates the `reputation`
/// resource. Amounts become decimal strings; `reputation` defaults to "0".
fn migrate_v1_to_v2(mut doc: Value) -> Result<Value, SaveError> {
    let err = |reason: &str| SaveError::Migration {
        from: 1,
        reason: reason.into(),
    };
    let ledger = doc
        .get_mut("ledger")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| err("ledger is not an object"))?;
    for (_, amount) in ledger.iter_mut() {
        match amount {
            Value::Number(n) => *amount = Value::from(n.to_string()),
            Value::String(_) => {}
            _ => return Err(err("ledger amount is neither number nor string")),
        }
    }
    ledger
        .entry("reputation".to_string())
        .or_insert_with(|| Value::from("0"));
    Ok(doc)
}

// ---------------------------------------------------------------------------
// Deserialize
// ---------------------------------------------------------------------------

/// Reconstruct an engine from a save document.
pub fn deserialize(
    text: &str,
    catalog: Catalog,
    config: EngineConfig,
) -> Result<(Engine, Millis), SaveError> {
    let raw: Value =
        serde_json::from_str(text).map_err(|e| SaveError::Corruption(e.to_string()))?;
    let version = raw
        .get("version")
        .and_then(Value::as_u64)
        .ok_or(SaveError::Corruption("missing version field".into()))? as u32;
    if version > SAVE_VERSION {
        return Err(SaveError::UnsupportedVersion(version));
    }
    let raw = if version < SAVE_VERSION {
        MigrationRegistry::new().migrate(raw, version)?
    } else {
        raw
    };
    let doc: SaveDoc =
        serde_json::from_value(raw).map_err(|e| SaveError::Corruption(e.to_string()))?;
    info!(tick = doc.tick, "save loaded");

    let mut state = GameState::new(&catalog);

    for (name, text) in &doc.ledger {
        let id = catalog
            .resource_by_name(name)
            .ok_or_else(|| SaveError::UnknownName {
                kind: "resource",
                name: name.clone(),
            })?;
        let amount = parse_amount(text).ok_or_else(|| {
            SaveError::Corruption(format!("unparseable amount for {name:?}: {text:?}"))
        })?;
        state
            .ledger
            .restore(id, amount)
            .map_err(|e| SaveError::Corruption(e.to_string()))?;
    }

    for path in &mut state.paths {
        path.unlocked = false;
    }
    for name in &doc.unlocked_paths {
        let id = catalog
            .path_by_name(name)
            .ok_or_else(|| SaveError::UnknownName {
                kind: "path",
                name: name.clone(),
            })?;
        state.paths[id.0 as usize].unlocked = true;
    }

    for name in &doc.owned {
        let id = catalog
            .ownable_by_name(name)
            .ok_or_else(|| SaveError::UnknownName {
                kind: "ownable",
                name: name.clone(),
            })?;
        state.owned.insert(id);
    }

    for golem in &doc.golems {
        let blueprint =
            catalog
                .ownable_by_name(&golem.blueprint)
                .ok_or_else(|| SaveError::UnknownName {
                    kind: "ownable",
                    name: golem.blueprint.clone(),
                })?;
        state.golems.insert(Golem {
            blueprint,
            work: golem.work,
        });
    }

    for order in &doc.orders {
        let recipe = catalog
            .ownable_by_name(&order.recipe)
            .ok_or_else(|| SaveError::UnknownName {
                kind: "ownable",
                name: order.recipe.clone(),
            })?;
        let requester =
            catalog
                .path_by_name(&order.requester)
                .ok_or_else(|| SaveError::UnknownName {
                    kind: "path",
                    name: order.requester.clone(),
                })?;
        state.orders.push(CraftingOrder {
            id: OrderId(order.id),
            recipe,
            requester,
            expiry: order.expiry,
        });
    }
    state.orders.sort_by_key(|o| (o.expiry, o.id));

    for shipment in &doc.shipments {
        let route = catalog
            .ownable_by_name(&shipment.route)
            .ok_or_else(|| SaveError::UnknownName {
                kind: "ownable",
                name: shipment.route.clone(),
            })?;
        state.shipments.push(Shipment {
            id: ShipmentId(shipment.id),
            route,
            arrival: shipment.arrival,
        });
    }
    state.shipments.sort_by_key(|s| (s.arrival, s.id));

    for name in &doc.granted {
        let id = catalog
            .achievement_by_name(name)
            .ok_or_else(|| SaveError::UnknownName {
                kind: "achievement",
                name: name.clone(),
            })?;
        state.granted.insert(id);
    }

    state.tick = doc.tick;
    state.set_id_counters(doc.next_order, doc.next_shipment);

    let engine = Engine::restore(catalog, state, config, doc.remainder_ms);
    Ok((engine, doc.saved_at_ms))
}

// ===========================================================================
// Tests
// ===========================================================================
