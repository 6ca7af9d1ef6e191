//! The mutable world: ledger, unlocks, ownership, golems, orders, and
//! shipments, aggregated into a single [`GameState`] value.
//!
//! There are no module-level singletons; every component receives the state
//! explicitly. Collections that automation iterates (orders, shipments) are
//! kept sorted so tick order is deterministic.

use crate::amount::{Amount, Ticks};
use crate::catalog::Catalog;
use crate::id::{AchievementId, GolemId, OrderId, OwnableId, PathId, ResourceId, ShipmentId};
use crate::ledger::ResourceLedger;
use crate::modifier::WorldView;
use slotmap::SlotMap;
use std::collections::BTreeSet;

/// Per-path mutable state. Unlock is one-way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathState {
    pub unlocked: bool,
}

/// A built golem. `work` indexes into its blueprint's work list; `None` means
/// idle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Golem {
    pub blueprint: OwnableId,
    pub work: Option<usize>,
}

/// A pending crafting order awaiting fulfillment or expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CraftingOrder {
    pub id: OrderId,
    pub recipe: OwnableId,
    pub requester: PathId,
    pub expiry: Ticks,
}

/// An in-flight caravan shipment. Delivered at the first tick at or past
/// `arrival`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shipment {
    pub id: ShipmentId,
    pub route: OwnableId,
    pub arrival: Ticks,
}

/// The full mutable game world.
#[derive(Debug)]
pub struct GameState {
    pub ledger: ResourceLedger,
    /// Indexed by `PathId`.
    pub paths: Vec<PathState>,
    /// Everything purchased, across all paths. Ownership never reverts.
    pub owned: BTreeSet<OwnableId>,
    pub golems: SlotMap<GolemId, Golem>,
    /// Sorted by `(expiry, id)`; fulfillment walks in expiry order.
    pub orders: Vec<CraftingOrder>,
    /// Sorted by `(arrival, id)`; a FIFO of in-flight goods.
    pub shipments: Vec<Shipment>,
    /// Achievements granted so far. Grants never revert.
    pub granted: BTreeSet<AchievementId>,
    /// Current simulated tick.
    pub tick: Ticks,
    next_order: u64,
    next_shipment: u64,
}

impl GameState {
    /// A fresh game: catalog initial amounts, starting paths unlocked,
    /// nothing owned.
    pub fn new(catalog: &Catalog) -> Self {
        Self {
            ledger: catalog.new_ledger(),
            paths: catalog
                .paths()
                .map(|(_, def)| PathState {
                    unlocked: def.start_unlocked,
                })
                .collect(),
            owned: BTreeSet::new(),
            golems: SlotMap::with_key(),
            orders: Vec::new(),
            shipments: Vec::new(),
            granted: BTreeSet::new(),
            tick: 0,
            next_order: 0,
            next_shipment: 0,
        }
    }

    /// Insert an order keeping the expiry sort.
    pub fn push_order(&mut self, recipe: OwnableId, requester: PathId, expiry: Ticks) -> OrderId {
        let id = OrderId(self.next_order);
        self.next_order += 1;
        let order = CraftingOrder {
            id,
            recipe,
            requester,
            expiry,
        };
        let at = self
            .orders
            .partition_point(|o| (o.expiry, o.id) < (expiry, id));
        self.orders.insert(at, order);
        id
    }

    /// Insert a shipment keeping the arrival sort.
    pub fn push_shipment(&mut self, route: OwnableId, arrival: Ticks) -> ShipmentId {
        let id = ShipmentId(self.next_shipment);
        self.next_shipment += 1;
        let shipment = Shipment { id, route, arrival };
        let at = self
            .shipments
            .partition_point(|s| (s.arrival, s.id) < (arrival, id));
        self.shipments.insert(at, shipment);
        id
    }

    /// Earliest tick at which a pending order expires, if any. Orders are
    /// sorted, so this is the front.
    pub fn next_order_expiry(&self) -> Option<Ticks> {
        self.orders.first().map(|o| o.expiry)
    }

    /// Earliest tick at which a shipment arrives, if any.
    pub fn next_shipment_arrival(&self) -> Option<Ticks> {
        self.shipments.first().map(|s| s.arrival)
    }

    /// Restore the monotonic id counters from a save.
    pub(crate) fn set_id_counters(&mut self, next_order: u64, next_shipment: u64) {
        self.next_order = next_order;
        self.next_shipment = next_shipment;
    }

    pub(crate) fn id_counters(&self) -> (u64, u64) {
        (self.next_order, self.next_shipment)
    }
}

impl WorldView for GameState {
    fn resource_amount(&self, resource: ResourceId) -> Amount {
        self.ledger.get(resource)
    }
    fn resource_soft_cap(&self, resource: ResourceId) -> Option<Amount> {
        self.ledger.soft_cap(resource)
    }
    fn resource_hard_cap(&self, resource: ResourceId) -> Option<Amount> {
        self.ledger.hard_cap(resource)
    }
    fn path_unlocked(&self, path: PathId) -> bool {
        self.paths
            .get(path.0 as usize)
            .map(|p| p.unlocked)
            .unwrap_or(false)
    }
    fn owns(&self, ownable: OwnableId) -> bool {
        self.owned.contains(&ownable)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
