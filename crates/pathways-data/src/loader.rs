//! Resolution pipeline: parses a content file and resolves every name
//! reference into a dense catalog id.

use crate::schema::{
    ContentData, CostData, ModifierData, ModifierOpData, ModifierTargetData, OwnableKindData,
    PredicateData,
};
use pathways_core::amount::{parse_amount, Amount};
use pathways_core::catalog::{
    Catalog, CatalogBuilder, ConfigurationError, CostEntry, GolemWork, ModifierSpec, OwnableKind,
};
use pathways_core::id::{OwnableId, PathId, ResourceId, StatId};
use pathways_core::modifier::{ModifierOp, ModifierTarget, Predicate};
use std::collections::HashMap;
use tracing::info;

/// Errors raised while loading content. All of them block game start.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// The file is not valid JSON for the content schema.
    #[error("parse error: {0}")]
    Parse(String),

    /// A name reference could not be resolved.
    #[error("unresolved {kind} reference {name:?}")]
    UnresolvedRef { kind: &'static str, name: String },

    /// An amount string is not a valid decimal.
    #[error("unparseable amount {text:?} in {context}")]
    BadAmount { context: String, text: String },

    /// The resolved catalog failed validation.
    #[error(transparent)]
    Config(#[from] ConfigurationError),
}

/// Names resolved ahead of registration, so later entries can reference
/// earlier ones (and prerequisites can reference later ownables).
struct NameTable {
    paths: HashMap<String, PathId>,
    resources: HashMap<String, ResourceId>,
    stats: HashMap<String, StatId>,
    ownables: HashMap<String, OwnableId>,
}

impl NameTable {
    fn build(data: &ContentData) -> Self {
        let index = |names: Vec<&str>| -> HashMap<String, u32> {
            names
                .into_iter()
                .enumerate()
                .map(|(i, n)| (n.to_string(), i as u32))
                .collect()
        };
        Self {
            paths: index(data.paths.iter().map(|p| p.name.as_str()).collect())
                .into_iter()
                .map(|(n, i)| (n, PathId(i)))
                .collect(),
            resources: index(data.resources.iter().map(|r| r.name.as_str()).collect())
                .into_iter()
                .map(|(n, i)| (n, ResourceId(i)))
                .collect(),
            stats: index(data.stats.iter().map(|s| s.name.as_str()).collect())
                .into_iter()
                .map(|(n, i)| (n, StatId(i)))
                .collect(),
            ownables: index(data.ownables.iter().map(|o| o.name.as_str()).collect())
                .into_iter()
                .map(|(n, i)| (n, OwnableId(i)))
                .collect(),
        }
    }

    fn path(&self, name: &str) -> Result<PathId, DataLoadError> {
        self.paths
            .get(name)
            .copied()
            .ok_or_else(|| DataLoadError::UnresolvedRef {
                kind: "path",
                name: name.to_string(),
            })
    }

    fn resource(&self, name: &str) -> Result<ResourceId, DataLoadError> {
        self.resources
            .get(name)
            .copied()
            .ok_or_else(|| DataLoadError::UnresolvedRef {
                kind: "resource",
                name: name.to_string(),
            })
    }

    fn stat(&self, name: &str) -> Result<StatId, DataLoadError> {
        self.stats
            .get(name)
            .copied()
            .ok_or_else(|| DataLoadError::UnresolvedRef {
                kind: "stat",
                name: name.to_string(),
            })
    }

    fn ownable(&self, name: &str) -> Result<OwnableId, DataLoadError> {
        self.ownables
            .get(name)
            .copied()
            .ok_or_else(|| DataLoadError::UnresolvedRef {
                kind: "ownable",
                name: name.to_string(),
            })
    }
}

fn amount_in(context: &str, text: &str) -> Result<Amount, DataLoadError> {
    parse_amount(text).ok_or_else(|| DataLoadError::BadAmount {
        context: context.to_string(),
        text: text.to_string(),
    })
}

fn costs(context: &str, names: &NameTable, data: &[CostData]) -> Result<Vec<CostEntry>, DataLoadError> {
    data.iter()
        .map(|entry| {
            Ok(CostEntry {
                resource: names.resource(&entry.resource)?,
                amount: amount_in(context, &entry.amount)?,
            })
        })
        .collect()
}

fn cost(context: &str, names: &NameTable, data: &CostData) -> Result<CostEntry, DataLoadError> {
    Ok(CostEntry {
        resource: names.resource(&data.resource)?,
        amount: amount_in(context, &data.amount)?,
    })
}

fn predicate(
    context: &str,
    names: &NameTable,
    data: &PredicateData,
) -> Result<Predicate, DataLoadError> {
    Ok(match data {
        PredicateData::PathUnlocked { path } => Predicate::PathUnlocked(names.path(path)?),
        PredicateData::ResourceAtLeast { resource, amount } => {
            Predicate::ResourceAtLeast(names.resource(resource)?, amount_in(context, amount)?)
        }
        PredicateData::StatAtLeast { stat, amount } => {
            Predicate::StatAtLeast(names.stat(stat)?, amount_in(context, amount)?)
        }
        PredicateData::Owns { ownable } => Predicate::Owns(names.ownable(ownable)?),
        PredicateData::All { of } => Predicate::All(
            of.iter()
                .map(|child| predicate(context, names, child))
                .collect::<Result<_, _>>()?,
        ),
    })
}

fn modifier(
    context: &str,
    names: &NameTable,
    data: &ModifierData,
) -> Result<ModifierSpec, DataLoadError> {
    let target = match &data.target {
        ModifierTargetData::ResourceRate { resource } => {
            ModifierTarget::ResourceRate(names.resource(resource)?)
        }
        ModifierTargetData::Stat { stat } => ModifierTarget::Stat(names.stat(stat)?),
    };
    let op = match data.op {
        ModifierOpData::Additive => ModifierOp::Additive,
        ModifierOpData::Multiplicative => ModifierOp::Multiplicative,
        ModifierOpData::Override => ModifierOp::Override,
    };
    Ok(ModifierSpec {
        target,
        op,
        magnitude: amount_in(context, &data.magnitude)?,
        predicate: data
            .predicate
            .as_ref()
            .map(|p| predicate(context, names, p))
            .transpose()?,
    })
}

fn kind(
    context: &str,
    names: &NameTable,
    data: &OwnableKindData,
) -> Result<OwnableKind, DataLoadError> {
    Ok(match data {
        OwnableKindData::Upgrade => OwnableKind::Upgrade,
        OwnableKindData::Research => OwnableKind::Research,
        OwnableKindData::Equipment => OwnableKind::Equipment,
        OwnableKindData::GolemBlueprint { build_cost, works } => OwnableKind::GolemBlueprint {
            build_cost: costs(context, names, build_cost)?,
            works: works
                .iter()
                .map(|work| {
                    Ok(GolemWork {
                        name: work.name.clone(),
                        output: names.resource(&work.output)?,
                        inputs: costs(context, names, &work.inputs)?,
                        base_output: amount_in(context, &work.base_output)?,
                    })
                })
                .collect::<Result<_, DataLoadError>>()?,
        },
        OwnableKindData::CraftingRecipe { requires, reward } => OwnableKind::CraftingRecipe {
            requires: costs(context, names, requires)?,
            reward: cost(context, names, reward)?,
        },
        OwnableKindData::TradeRoute {
            give,
            receive,
            transit,
        } => OwnableKind::TradeRoute {
            give: costs(context, names, give)?,
            receive: costs(context, names, receive)?,
            transit: *transit,
        },
        OwnableKindData::GatheringTool {
            upkeep,
            output,
            base_yield,
        } => OwnableKind::GatheringTool {
            upkeep: costs(context, names, upkeep)?,
            output: names.resource(output)?,
            base_yield: amount_in(context, base_yield)?,
        },
    })
}

/// Parse a content file and build a validated catalog from it.
pub fn load_catalog(text: &str) -> Result<Catalog, DataLoadError> {
    let data: ContentData =
        serde_json::from_str(text).map_err(|e| DataLoadError::Parse(e.to_string()))?;
    let names = NameTable::build(&data);
    let mut builder = CatalogBuilder::new();

    for path in &data.paths {
        builder.add_path(
            &path.name,
            path.start_unlocked,
            costs(&path.name, &names, &path.unlock_cost)?,
        )?;
    }
    for resource in &data.resources {
        builder.add_resource(
            &resource.name,
            names.path(&resource.path)?,
            amount_in(&resource.name, &resource.initial)?,
            resource
                .soft_cap
                .as_deref()
                .map(|s| amount_in(&resource.name, s))
                .transpose()?,
            resource
                .hard_cap
                .as_deref()
                .map(|s| amount_in(&resource.name, s))
                .transpose()?,
        )?;
    }
    for stat in &data.stats {
        builder.add_stat(&stat.name, amount_in(&stat.name, &stat.base)?)?;
    }
    if let Some(name) = &data.golem_output_stat {
        builder.set_golem_output_stat(names.stat(name)?);
    }
    if let Some(name) = &data.gather_yield_stat {
        builder.set_gather_yield_stat(names.stat(name)?);
    }
    for ownable in &data.ownables {
        builder.add_ownable(
            &ownable.name,
            names.path(&ownable.path)?,
            kind(&ownable.name, &names, &ownable.kind)?,
            costs(&ownable.name, &names, &ownable.cost)?,
            ownable
                .grants
                .iter()
                .map(|m| modifier(&ownable.name, &names, m))
                .collect::<Result<_, _>>()?,
            ownable
                .prerequisites
                .iter()
                .map(|p| names.ownable(p))
                .collect::<Result<_, _>>()?,
        )?;
    }
    for achievement in &data.achievements {
        builder.add_achievement(
            &achievement.name,
            predicate(&achievement.name, &names, &achievement.predicate)?,
            achievement
                .rewards
                .iter()
                .map(|m| modifier(&achievement.name, &names, m))
                .collect::<Result<_, _>>()?,
        )?;
    }

    let catalog = builder.build()?;
    info!(
        paths = catalog.path_count(),
        resources = catalog.resource_count(),
        ownables = catalog.ownable_count(),
        achievements = catalog.achievement_count(),
        "content loaded"
    );
    Ok(catalog)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pathways_core::amount::amount;

    const CONTENT: &str = r#"{
        "paths": [
            { "name": "warrior", "start_unlocked": true },
            { "name": "merchant", "unlock_cost": [{ "resource": "gold", "amount": "100" }] }
        ],
        "resources": [
            { "name": "gold", "path": "warrior", "initial": "25" },
            { "name": "silk", "path": "merchant", "soft_cap": "500", "hard_cap": "1000" }
        ],
        "stats": [
            { "name": "golem_output", "base": "1" }
        ],
        "golem_output_stat": "golem_output",
        "ownables": [
            {
                "name": "sword",
                "path": "warrior",
                "kind": "upgrade",
                "cost": [{ "resource": "gold", "amount": "10" }],
                "grants": [{
                    "target": { "kind": "resource_rate", "resource": "gold" },
                    "op": "additive",
                    "magnitude": "1.5"
                }]
            },
            {
                "name": "sharper_sword",
                "path": "warrior",
                "kind": "upgrade",
                "prerequisites": ["sword"]
            }
        ],
        "achievements": [
            {
                "name": "first_blood",
                "predicate": { "kind": "resource_at_least", "resource": "gold", "amount": "50" }
            }
        ]
    }"#;

    #[test]
    fn full_content_file_resolves() {
        let catalog = load_catalog(CONTENT).unwrap();
        assert_eq!(catalog.path_count(), 2);
        assert_eq!(catalog.resource_count(), 2);
        assert_eq!(catalog.ownable_count(), 2);
        assert_eq!(catalog.achievement_count(), 1);

        let gold = catalog.resource_by_name("gold").unwrap();
        assert_eq!(catalog.resource(gold).unwrap().initial, amount(25));
        let silk = catalog.resource_by_name("silk").unwrap();
        assert_eq!(catalog.resource(silk).unwrap().hard_cap, Some(amount(1000)));

        let sword = catalog.ownable_by_name("sword").unwrap();
        let sharper = catalog.ownable_by_name("sharper_sword").unwrap();
        assert_eq!(catalog.ownable(sharper).unwrap().prerequisites, vec![sword]);
        assert_eq!(catalog.golem_output_stat(), catalog.stat_by_name("golem_output"));
    }

    #[test]
    fn unresolved_resource_is_reported_by_name() {
        let text = r#"{
            "paths": [{ "name": "warrior", "start_unlocked": true }],
            "resources": [{ "name": "gold", "path": "no_such_path" }]
        }"#;
        let err = load_catalog(text).unwrap_err();
        let DataLoadError::UnresolvedRef { kind, name } = err else {
            panic!("expected UnresolvedRef, got {err:?}");
        };
        assert_eq!(kind, "path");
        assert_eq!(name, "no_such_path");
    }

    #[test]
    fn bad_amount_is_reported_with_context() {
        let text = r#"{
            "paths": [{ "name": "warrior", "start_unlocked": true }],
            "resources": [{ "name": "gold", "path": "warrior", "initial": "lots" }]
        }"#;
        let err = load_catalog(text).unwrap_err();
        assert!(matches!(err, DataLoadError::BadAmount { .. }));
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        assert!(matches!(
            load_catalog("not json").unwrap_err(),
            DataLoadError::Parse(_)
        ));
    }
}
