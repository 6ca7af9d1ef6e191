//! Serde structs for the on-disk content format.
//!
//! Content files reference everything by name; amounts are decimal strings
//! so authored values survive exactly. The loader resolves these into
//! engine types.

use serde::Deserialize;

/// A whole content file.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentData {
    pub paths: Vec<PathData>,
    pub resources: Vec<ResourceData>,
    #[serde(default)]
    pub stats: Vec<StatData>,
    /// Name of the stat multiplying golem work output, if any.
    #[serde(default)]
    pub golem_output_stat: Option<String>,
    /// Name of the stat multiplying gathering yield, if any.
    #[serde(default)]
    pub gather_yield_stat: Option<String>,
    #[serde(default)]
    pub ownables: Vec<OwnableData>,
    #[serde(default)]
    pub achievements: Vec<AchievementData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathData {
    pub name: String,
    #[serde(default)]
    pub start_unlocked: bool,
    #[serde(default)]
    pub unlock_cost: Vec<CostData>,
}

/// One cost or reward entry: a resource name and a decimal-string amount.
#[derive(Debug, Clone, Deserialize)]
pub struct CostData {
    pub resource: String,
    pub amount: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceData {
    pub name: String,
    pub path: String,
    #[serde(default = "zero")]
    pub initial: String,
    #[serde(default)]
    pub soft_cap: Option<String>,
    #[serde(default)]
    pub hard_cap: Option<String>,
}

fn zero() -> String {
    "0".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatData {
    pub name: String,
    pub base: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwnableData {
    pub name: String,
    pub path: String,
    #[serde(flatten)]
    pub kind: OwnableKindData,
    #[serde(default)]
    pub cost: Vec<CostData>,
    #[serde(default)]
    pub grants: Vec<ModifierData>,
    #[serde(default)]
    pub prerequisites: Vec<String>,
}

/// Kind payload, tagged by a `kind` field in the file.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OwnableKindData {
    Upgrade,
    Research,
    Equipment,
    GolemBlueprint {
        #[serde(default)]
        build_cost: Vec<CostData>,
        works: Vec<GolemWorkData>,
    },
    CraftingRecipe {
        #[serde(default)]
        requires: Vec<CostData>,
        reward: CostData,
    },
    TradeRoute {
        #[serde(default)]
        give: Vec<CostData>,
        #[serde(default)]
        receive: Vec<CostData>,
        transit: u64,
    },
    GatheringTool {
        #[serde(default)]
        upkeep: Vec<CostData>,
        output: String,
        base_yield: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct GolemWorkData {
    pub name: String,
    pub output: String,
    #[serde(default)]
    pub inputs: Vec<CostData>,
    pub base_output: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModifierData {
    pub target: ModifierTargetData,
    pub op: ModifierOpData,
    pub magnitude: String,
    #[serde(default)]
    pub predicate: Option<PredicateData>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModifierTargetData {
    ResourceRate { resource: String },
    Stat { stat: String },
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierOpData {
    Additive,
    Multiplicative,
    Override,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PredicateData {
    PathUnlocked { path: String },
    ResourceAtLeast { resource: String, amount: String },
    StatAtLeast { stat: String, amount: String },
    Owns { ownable: String },
    All { of: Vec<PredicateData> },
}

#[derive(Debug, Clone, Deserialize)]
pub struct AchievementData {
    pub name: String,
    pub predicate: PredicateData,
    #[serde(default)]
    pub rewards: Vec<ModifierData>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_file_parses_with_defaults() {
        let data: ContentData = serde_json::from_str(
            r#"{
                "paths": [{ "name": "warrior", "start_unlocked": true }],
                "resources": [{ "name": "gold", "path": "warrior" }]
            }"#,
        )
        .unwrap();
        assert_eq!(data.resources[0].initial, "0");
        assert!(data.ownables.is_empty());
        assert!(data.stats.is_empty());
    }

    #[test]
    fn ownable_kind_is_tagged_inline() {
        let data: OwnableData = serde_json::from_str(
            r#"{
                "name": "silk_road",
                "path": "merchant",
                "kind": "trade_route",
                "give": [{ "resource": "loot", "amount": "4" }],
                "receive": [{ "resource": "silk", "amount": "6" }],
                "transit": 30
            }"#,
        )
        .unwrap();
        assert!(matches!(
            data.kind,
            OwnableKindData::TradeRoute { transit: 30, .. }
        ));
    }

    #[test]
    fn predicates_nest() {
        let p: PredicateData = serde_json::from_str(
            r#"{
                "kind": "all",
                "of": [
                    { "kind": "path_unlocked", "path": "mystic" },
                    { "kind": "resource_at_least", "resource": "mana", "amount": "50.5" }
                ]
            }"#,
        )
        .unwrap();
        let PredicateData::All { of } = p else {
            panic!("expected all");
        };
        assert_eq!(of.len(), 2);
    }
}
