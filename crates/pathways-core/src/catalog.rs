//! Immutable content catalog: paths, resources, stats, ownables, and
//! achievements, frozen at load time.
//!
//! The catalog is built in two phases, mirroring a registry lifecycle:
//! register everything through [`CatalogBuilder`], then [`CatalogBuilder::build`]
//! validates every cross-reference and freezes the tables. Dangling ids are
//! a [`ConfigurationError`], never silently ignored — the game must not
//! start on an inconsistent content set.
//!
//! Each ownable and achievement is assigned a unique ascending [`SourceId`]
//! at build time; this ordering is the canonical tie-break for modifier
//! stacking everywhere in the engine.

use crate::amount::{Amount, Ticks};
use crate::id::{AchievementId, OwnableId, PathId, ResourceId, SourceId, StatId};
use crate::ledger::ResourceLedger;
use crate::modifier::{Modifier, ModifierTarget, Predicate, PredicateInputs};
use std::collections::HashMap;

/// Errors raised when a catalog fails validation. All of these block game
/// start.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("duplicate catalog name: {0}")]
    DuplicateName(String),

    #[error("{context} references unknown resource {resource:?}")]
    UnknownResource { context: String, resource: ResourceId },

    #[error("{context} references unknown path {path:?}")]
    UnknownPath { context: String, path: PathId },

    #[error("{context} references unknown stat {stat:?}")]
    UnknownStat { context: String, stat: StatId },

    #[error("{context} references unknown ownable {ownable:?}")]
    UnknownOwnable { context: String, ownable: OwnableId },

    #[error("prerequisite {prereq:?} of {name} does not exist")]
    InvalidPrerequisite { name: String, prereq: OwnableId },

    #[error("golem blueprint {0} declares no work types")]
    EmptyBlueprint(String),

    #[error("predicate cycle through stat {0:?}")]
    PredicateCycle(StatId),
}

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// A themed sub-system of the game (Warrior, Mystic, ...).
#[derive(Debug, Clone)]
pub struct PathDef {
    pub name: String,
    pub start_unlocked: bool,
    /// Cost to unlock, paid once. Empty for starting paths.
    pub unlock_cost: Vec<CostEntry>,
}

/// A resource tracked by the ledger.
#[derive(Debug, Clone)]
pub struct ResourceDef {
    pub name: String,
    pub path: PathId,
    pub initial: Amount,
    /// Above this amount, production decays linearly toward the hard cap.
    pub soft_cap: Option<Amount>,
    pub hard_cap: Option<Amount>,
}

/// A derived stat with a catalog base value.
#[derive(Debug, Clone)]
pub struct StatDef {
    pub name: String,
    pub base: Amount,
}

/// One entry of a cost or requirement vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostEntry {
    pub resource: ResourceId,
    pub amount: Amount,
}

/// One work type a golem blueprint supports.
#[derive(Debug, Clone)]
pub struct GolemWork {
    pub name: String,
    pub output: ResourceId,
    /// Inputs consumed per step of work. Checked atomically with the output.
    pub inputs: Vec<CostEntry>,
    /// Output per step before the golem-output stat multiplier.
    pub base_output: Amount,
}

/// Kind-specific payload of an ownable definition.
#[derive(Debug, Clone)]
pub enum OwnableKind {
    Upgrade,
    Research,
    Equipment,
    GolemBlueprint {
        /// Cost to build one golem from this blueprint (the blueprint's own
        /// `cost` buys the blueprint itself).
        build_cost: Vec<CostEntry>,
        works: Vec<GolemWork>,
    },
    CraftingRecipe {
        /// Items consumed to fulfill one order of this recipe.
        requires: Vec<CostEntry>,
        /// Reputation (or other resource) granted on fulfillment.
        reward: CostEntry,
    },
    TradeRoute {
        /// Goods consumed at dispatch.
        give: Vec<CostEntry>,
        /// Goods delivered on arrival.
        receive: Vec<CostEntry>,
        /// Transit delay in ticks.
        transit: Ticks,
    },
    GatheringTool {
        /// Upkeep consumed per use.
        upkeep: Vec<CostEntry>,
        output: ResourceId,
        /// Yield per use before the gather-yield stat multiplier.
        base_yield: Amount,
    },
}

/// An ownable definition: upgrade, research, equipment, golem blueprint,
/// crafting recipe, trade route, or gathering tool.
#[derive(Debug, Clone)]
pub struct OwnableDef {
    pub name: String,
    pub path: PathId,
    pub kind: OwnableKind,
    pub cost: Vec<CostEntry>,
    pub grants: Vec<Modifier>,
    pub prerequisites: Vec<OwnableId>,
    pub source: SourceId,
}

/// An achievement: a predicate over world state and a one-time reward.
#[derive(Debug, Clone)]
pub struct AchievementDef {
    pub name: String,
    pub predicate: Predicate,
    pub rewards: Vec<Modifier>,
    pub source: SourceId,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Modifier specification before source assignment. The builder stamps the
/// owning entity's `SourceId` onto each spec at build time.
#[derive(Debug, Clone)]
pub struct ModifierSpec {
    pub target: ModifierTarget,
    pub op: crate::modifier::ModifierOp,
    pub magnitude: Amount,
    pub predicate: Option<Predicate>,
}

#[derive(Debug)]
struct PendingOwnable {
    name: String,
    path: PathId,
    kind: OwnableKind,
    cost: Vec<CostEntry>,
    grants: Vec<ModifierSpec>,
    prerequisites: Vec<OwnableId>,
}

/// Registers content, then validates and freezes it into a [`Catalog`].
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    paths: Vec<PathDef>,
    resources: Vec<ResourceDef>,
    stats: Vec<StatDef>,
    ownables: Vec<PendingOwnable>,
    achievements: Vec<(String, Predicate, Vec<ModifierSpec>)>,
    names: HashMap<String, ()>,
    golem_output_stat: Option<StatId>,
    gather_yield_stat: Option<StatId>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn claim_name(&mut self, name: &str) -> Result<(), ConfigurationError> {
        if self.names.insert(name.to_string(), ()).is_some() {
            return Err(ConfigurationError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    pub fn add_path(
        &mut self,
        name: &str,
        start_unlocked: bool,
        unlock_cost: Vec<CostEntry>,
    ) -> Result<PathId, ConfigurationError> {
        self.claim_name(name)?;
        let id = PathId(self.paths.len() as u32);
        self.paths.push(PathDef {
            name: name.to_string(),
            start_unlocked,
            unlock_cost,
        });
        Ok(id)
    }

    pub fn add_resource(
        &mut self,
        name: &str,
        path: PathId,
        initial: Amount,
        soft_cap: Option<Amount>,
        hard_cap: Option<Amount>,
    ) -> Result<ResourceId, ConfigurationError> {
        self.claim_name(name)?;
        let id = ResourceId(self.resources.len() as u32);
        self.resources.push(ResourceDef {
            name: name.to_string(),
            path,
            initial,
            soft_cap,
            hard_cap,
        });
        Ok(id)
    }

    pub fn add_stat(&mut self, name: &str, base: Amount) -> Result<StatId, ConfigurationError> {
        self.claim_name(name)?;
        let id = StatId(self.stats.len() as u32);
        self.stats.push(StatDef {
            name: name.to_string(),
            base,
        });
        Ok(id)
    }

    /// Declare the stat that multiplies every golem's work output.
    pub fn set_golem_output_stat(&mut self, stat: StatId) {
        self.golem_output_stat = Some(stat);
    }

    /// Declare the stat that multiplies every gathering tool's yield.
    pub fn set_gather_yield_stat(&mut self, stat: StatId) {
        self.gather_yield_stat = Some(stat);
    }

    pub fn add_ownable(
        &mut self,
        name: &str,
        path: PathId,
        kind: OwnableKind,
        cost: Vec<CostEntry>,
        grants: Vec<ModifierSpec>,
        prerequisites: Vec<OwnableId>,
    ) -> Result<OwnableId, ConfigurationError> {
        self.claim_name(name)?;
        let id = OwnableId(self.ownables.len() as u32);
        self.ownables.push(PendingOwnable {
            name: name.to_string(),
            path,
            kind,
            cost,
            grants,
            prerequisites,
        });
        Ok(id)
    }

    pub fn add_achievement(
        &mut self,
        name: &str,
        predicate: Predicate,
        rewards: Vec<ModifierSpec>,
    ) -> Result<AchievementId, ConfigurationError> {
        self.claim_name(name)?;
        let id = AchievementId(self.achievements.len() as u32);
        self.achievements
            .push((name.to_string(), predicate, rewards));
        Ok(id)
    }

    /// Validate every cross-reference and freeze the catalog. Source ids are
    /// assigned here: ownables in registration order, then achievements.
    pub fn build(self) -> Result<Catalog, ConfigurationError> {
        let path_count = self.paths.len() as u32;
        let resource_count = self.resources.len() as u32;
        let stat_count = self.stats.len() as u32;
        let ownable_count = self.ownables.len() as u32;

        let check_resource = |context: &str, r: ResourceId| -> Result<(), ConfigurationError> {
            if r.0 >= resource_count {
                Err(ConfigurationError::UnknownResource {
                    context: context.to_string(),
                    resource: r,
                })
            } else {
                Ok(())
            }
        };
        let check_costs = |context: &str, costs: &[CostEntry]| -> Result<(), ConfigurationError> {
            for entry in costs {
                check_resource(context, entry.resource)?;
            }
            Ok(())
        };
        let check_predicate =
            |context: &str, predicate: &Predicate| -> Result<(), ConfigurationError> {
            let mut inputs = PredicateInputs::default();
            predicate.collect_inputs(&mut inputs);
            for r in inputs.resources {
                check_resource(context, r)?;
            }
            for p in inputs.paths {
                if p.0 >= path_count {
                    return Err(ConfigurationError::UnknownPath {
                        context: context.to_string(),
                        path: p,
                    });
                }
            }
            for s in inputs.stats {
                if s.0 >= stat_count {
                    return Err(ConfigurationError::UnknownStat {
                        context: context.to_string(),
                        stat: s,
                    });
                }
            }
            for o in inputs.ownables {
                if o.0 >= ownable_count {
                    return Err(ConfigurationError::UnknownOwnable {
                        context: context.to_string(),
                        ownable: o,
                    });
                }
            }
            Ok(())
        };
        let check_spec = |context: &str, spec: &ModifierSpec| -> Result<(), ConfigurationError> {
            match spec.target {
                ModifierTarget::ResourceRate(r) => check_resource(context, r)?,
                ModifierTarget::Stat(s) => {
                    if s.0 >= stat_count {
                        return Err(ConfigurationError::UnknownStat {
                            context: context.to_string(),
                            stat: s,
                        });
                    }
                }
            }
            if let Some(predicate) = &spec.predicate {
                check_predicate(context, predicate)?;
            }
            Ok(())
        };

        for path in &self.paths {
            check_costs(&path.name, &path.unlock_cost)?;
        }
        for resource in &self.resources {
            if resource.path.0 >= path_count {
                return Err(ConfigurationError::UnknownPath {
                    context: resource.name.clone(),
                    path: resource.path,
                });
            }
        }

        let mut ownables = Vec::with_capacity(self.ownables.len());
        for (index, pending) in self.ownables.into_iter().enumerate() {
            let name = pending.name;
            if pending.path.0 >= path_count {
                return Err(ConfigurationError::UnknownPath {
                    context: name,
                    path: pending.path,
                });
            }
            check_costs(&name, &pending.cost)?;
            for prereq in &pending.prerequisites {
                if prereq.0 >= ownable_count {
                    return Err(ConfigurationError::InvalidPrerequisite {
                        name: name.clone(),
                        prereq: *prereq,
                    });
                }
            }
            for spec in &pending.grants {
                check_spec(&name, spec)?;
            }
            let kind = pending.kind;
            match &kind {
                OwnableKind::GolemBlueprint { build_cost, works } => {
                    if works.is_empty() {
                        return Err(ConfigurationError::EmptyBlueprint(name));
                    }
                    check_costs(&name, build_cost)?;
                    for work in works {
                        check_resource(&name, work.output)?;
                        check_costs(&name, &work.inputs)?;
                    }
                }
                OwnableKind::CraftingRecipe { requires, reward } => {
                    check_costs(&name, requires)?;
                    check_resource(&name, reward.resource)?;
                }
                OwnableKind::TradeRoute { give, receive, .. } => {
                    check_costs(&name, give)?;
                    check_costs(&name, receive)?;
                }
                OwnableKind::GatheringTool { upkeep, output, .. } => {
                    check_costs(&name, upkeep)?;
                    check_resource(&name, *output)?;
                }
                OwnableKind::Upgrade | OwnableKind::Research | OwnableKind::Equipment => {}
            }

            let source = SourceId(index as u32);
            let grants = pending
                .grants
                .into_iter()
                .map(|spec| Modifier {
                    source,
                    target: spec.target,
                    op: spec.op,
                    magnitude: spec.magnitude,
                    predicate: spec.predicate,
                })
                .collect();
            ownables.push(OwnableDef {
                name,
                path: pending.path,
                kind,
                cost: pending.cost,
                grants,
                prerequisites: pending.prerequisites,
                source,
            });
        }

        let mut achievements = Vec::with_capacity(self.achievements.len());
        for (index, (name, predicate, rewards)) in self.achievements.into_iter().enumerate() {
            check_predicate(&name, &predicate)?;
            for spec in &rewards {
                check_spec(&name, spec)?;
            }
            let source = SourceId(ownable_count + index as u32);
            let rewards = rewards
                .into_iter()
                .map(|spec| Modifier {
                    source,
                    target: spec.target,
                    op: spec.op,
                    magnitude: spec.magnitude,
                    predicate: spec.predicate,
                })
                .collect();
            achievements.push(AchievementDef {
                name,
                predicate,
                rewards,
                source,
            });
        }

        for stat in [self.golem_output_stat, self.gather_yield_stat]
            .into_iter()
            .flatten()
        {
            if stat.0 >= stat_count {
                return Err(ConfigurationError::UnknownStat {
                    context: "well-known stat".to_string(),
                    stat,
                });
            }
        }

        let catalog = Catalog {
            paths: self.paths,
            resources: self.resources,
            stats: self.stats,
            ownables,
            achievements,
            golem_output_stat: self.golem_output_stat,
            gather_yield_stat: self.gather_yield_stat,
        };
        catalog.check_stat_cycles()?;
        Ok(catalog)
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Immutable content tables. Frozen after build; safe to share.
#[derive(Debug)]
pub struct Catalog {
    paths: Vec<PathDef>,
    resources: Vec<ResourceDef>,
    stats: Vec<StatDef>,
    ownables: Vec<OwnableDef>,
    achievements: Vec<AchievementDef>,
    golem_output_stat: Option<StatId>,
    gather_yield_stat: Option<StatId>,
}

impl Catalog {
    /// The stat multiplying golem work output, if the content declares one.
    pub fn golem_output_stat(&self) -> Option<StatId> {
        self.golem_output_stat
    }

    /// The stat multiplying gathering yield, if the content declares one.
    pub fn gather_yield_stat(&self) -> Option<StatId> {
        self.gather_yield_stat
    }

    pub fn path_count(&self) -> usize {
        self.paths.len()
    }
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }
    pub fn stat_count(&self) -> usize {
        self.stats.len()
    }
    pub fn ownable_count(&self) -> usize {
        self.ownables.len()
    }
    pub fn achievement_count(&self) -> usize {
        self.achievements.len()
    }

    pub fn path(&self, id: PathId) -> Option<&PathDef> {
        self.paths.get(id.0 as usize)
    }
    pub fn resource(&self, id: ResourceId) -> Option<&ResourceDef> {
        self.resources.get(id.0 as usize)
    }
    pub fn stat(&self, id: StatId) -> Option<&StatDef> {
        self.stats.get(id.0 as usize)
    }
    pub fn ownable(&self, id: OwnableId) -> Option<&OwnableDef> {
        self.ownables.get(id.0 as usize)
    }
    pub fn achievement(&self, id: AchievementId) -> Option<&AchievementDef> {
        self.achievements.get(id.0 as usize)
    }

    pub fn paths(&self) -> impl Iterator<Item = (PathId, &PathDef)> {
        self.paths
            .iter()
            .enumerate()
            .map(|(i, d)| (PathId(i as u32), d))
    }
    pub fn resources(&self) -> impl Iterator<Item = (ResourceId, &ResourceDef)> {
        self.resources
            .iter()
            .enumerate()
            .map(|(i, d)| (ResourceId(i as u32), d))
    }
    pub fn ownables(&self) -> impl Iterator<Item = (OwnableId, &OwnableDef)> {
        self.ownables
            .iter()
            .enumerate()
            .map(|(i, d)| (OwnableId(i as u32), d))
    }
    pub fn achievements(&self) -> impl Iterator<Item = (AchievementId, &AchievementDef)> {
        self.achievements
            .iter()
            .enumerate()
            .map(|(i, d)| (AchievementId(i as u32), d))
    }

    pub fn path_by_name(&self, name: &str) -> Option<PathId> {
        self.paths
            .iter()
            .position(|p| p.name == name)
            .map(|i| PathId(i as u32))
    }
    pub fn resource_by_name(&self, name: &str) -> Option<ResourceId> {
        self.resources
            .iter()
            .position(|r| r.name == name)
            .map(|i| ResourceId(i as u32))
    }
    pub fn stat_by_name(&self, name: &str) -> Option<StatId> {
        self.stats
            .iter()
            .position(|s| s.name == name)
            .map(|i| StatId(i as u32))
    }
    pub fn ownable_by_name(&self, name: &str) -> Option<OwnableId> {
        self.ownables
            .iter()
            .position(|o| o.name == name)
            .map(|i| OwnableId(i as u32))
    }
    pub fn achievement_by_name(&self, name: &str) -> Option<AchievementId> {
        self.achievements
            .iter()
            .position(|a| a.name == name)
            .map(|i| AchievementId(i as u32))
    }

    /// Build a fresh ledger seeded with every resource's initial amount.
    pub fn new_ledger(&self) -> ResourceLedger {
        ResourceLedger::from_rows(
            self.resources
                .iter()
                .map(|r| (r.initial, r.soft_cap, r.hard_cap)),
        )
    }

    /// Base values for every stat, in stat-id order.
    pub fn stat_bases(&self) -> Vec<Amount> {
        self.stats.iter().map(|s| s.base).collect()
    }

    /// Reject stat-target modifiers whose predicates form a cycle through
    /// stats: a cycle would make `effective_stat` recurse forever.
    fn check_stat_cycles(&self) -> Result<(), ConfigurationError> {
        // deps[s] = stats read by predicates of modifiers targeting stat s.
        let mut deps: Vec<Vec<StatId>> = vec![Vec::new(); self.stats.len()];
        let all_modifiers = self
            .ownables
            .iter()
            .flat_map(|o| o.grants.iter())
            .chain(self.achievements.iter().flat_map(|a| a.rewards.iter()));
        for modifier in all_modifiers {
            if let ModifierTarget::Stat(target) = modifier.target {
                if let Some(predicate) = &modifier.predicate {
                    let mut inputs = PredicateInputs::default();
                    predicate.collect_inputs(&mut inputs);
                    deps[target.0 as usize].extend(inputs.stats);
                }
            }
        }

        // Iterative DFS with three colors.
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            White,
            Grey,
            Black,
        }
        let mut marks = vec![Mark::White; self.stats.len()];
        for start in 0..self.stats.len() {
            if marks[start] != Mark::White {
                continue;
            }
            let mut stack = vec![(start, 0usize)];
            marks[start] = Mark::Grey;
            while let Some(&mut (node, ref mut next)) = stack.last_mut() {
                if *next < deps[node].len() {
                    let child = deps[node][*next].0 as usize;
                    *next += 1;
                    match marks[child] {
                        Mark::Grey => {
                            return Err(ConfigurationError::PredicateCycle(StatId(child as u32)))
                        }
                        Mark::White => {
                            marks[child] = Mark::Grey;
                            stack.push((child, 0));
                        }
                        Mark::Black => {}
                    }
                } else {
                    marks[node] = Mark::Black;
                    stack.pop();
                }
            }
        }
        Ok(())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
