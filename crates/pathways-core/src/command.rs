//! Player commands, validated against prerequisites and the ledger before
//! they touch anything.

use crate::amount::Ticks;
use crate::catalog::OwnableKind;
use crate::engine::Engine;
use crate::event::Event;
use crate::id::{GolemId, OwnableId, PathId};
use crate::ledger::{LedgerError, ResourceDelta};
use crate::state::Golem;

/// A request from the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    PurchaseOwnable { ownable: OwnableId },
    UnlockPath { path: PathId },
    BuildGolem { blueprint: OwnableId },
    /// Bind a golem to a work index of its blueprint, or `None` to idle it.
    AssignGolem { golem: GolemId, work: Option<usize> },
    /// Queue a crafting order expiring `expires_in` ticks from now.
    SubmitOrder {
        recipe: OwnableId,
        requester: PathId,
        expires_in: Ticks,
    },
}

/// Why a command was rejected. Rejected commands change nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown ownable {0:?}")]
    UnknownOwnable(OwnableId),

    #[error("ownable {0:?} is already owned")]
    AlreadyOwned(OwnableId),

    #[error("path {0:?} is not unlocked")]
    PathLocked(PathId),

    #[error("ownable {0:?} requires {1:?} first")]
    MissingPrerequisite(OwnableId, OwnableId),

    #[error("unknown path {0:?}")]
    UnknownPath(PathId),

    #[error("path {0:?} is already unlocked")]
    AlreadyUnlocked(PathId),

    #[error("ownable {0:?} is not a golem blueprint")]
    NotABlueprint(OwnableId),

    #[error("unknown golem {0:?}")]
    UnknownGolem(GolemId),

    #[error("work index {1} out of range for blueprint {0:?}")]
    InvalidWork(OwnableId, usize),

    #[error("ownable {0:?} is not a crafting recipe")]
    NotARecipe(OwnableId),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl Engine {
    /// Execute a command at the current tick. Validation happens before any
    /// mutation; a rejected command leaves the world untouched.
    pub fn execute(&mut self, command: Command) -> Result<Vec<Event>, CommandError> {
        let tick = self.state().tick;
        let mut events = Vec::new();
        match command {
            Command::PurchaseOwnable { ownable } => {
                let (catalog, state, graph) = self.parts_mut();
                let def = catalog
                    .ownable(ownable)
                    .ok_or(CommandError::UnknownOwnable(ownable))?;
                if state.owned.contains(&ownable) {
                    return Err(CommandError::AlreadyOwned(ownable));
                }
                if !state.paths[def.path.0 as usize].unlocked {
                    return Err(CommandError::PathLocked(def.path));
                }
                for &prereq in &def.prerequisites {
                    if !state.owned.contains(&prereq) {
                        return Err(CommandError::MissingPrerequisite(ownable, prereq));
                    }
                }
                let cost: ResourceDelta = def
                    .cost
                    .iter()
                    .map(|entry| (entry.resource, -entry.amount))
                    .collect();
                state.ledger.apply(&cost)?;
                for (&resource, _) in cost.iter() {
                    graph.note_resource_changed(resource);
                }
                state.owned.insert(ownable);
                graph.add_source(def.source, &def.grants);
                graph.note_ownable_acquired(ownable);
                events.push(Event::OwnablePurchased { tick, ownable });
            }

            Command::UnlockPath { path } => {
                let (catalog, state, graph) = self.parts_mut();
                let def = catalog.path(path).ok_or(CommandError::UnknownPath(path))?;
                if state.paths[path.0 as usize].unlocked {
                    return Err(CommandError::AlreadyUnlocked(path));
                }
                let cost: ResourceDelta = def
                    .unlock_cost
                    .iter()
                    .map(|entry| (entry.resource, -entry.amount))
                    .collect();
                state.ledger.apply(&cost)?;
                for (&resource, _) in cost.iter() {
                    graph.note_resource_changed(resource);
                }
                state.paths[path.0 as usize].unlocked = true;
                graph.note_path_unlocked(path);
                events.push(Event::PathUnlocked { tick, path });
            }

            Command::BuildGolem { blueprint } => {
                let (catalog, state, graph) = self.parts_mut();
                let def = catalog
                    .ownable(blueprint)
                    .ok_or(CommandError::UnknownOwnable(blueprint))?;
                if !state.owned.contains(&blueprint) {
                    return Err(CommandError::UnknownOwnable(blueprint));
                }
                let OwnableKind::GolemBlueprint { build_cost, .. } = &def.kind else {
                    return Err(CommandError::NotABlueprint(blueprint));
                };
                let cost: ResourceDelta = build_cost
                    .iter()
                    .map(|entry| (entry.resource, -entry.amount))
                    .collect();
                state.ledger.apply(&cost)?;
                for (&resource, _) in cost.iter() {
                    graph.note_resource_changed(resource);
                }
                let golem = state.golems.insert(Golem {
                    blueprint,
                    work: None,
                });
                events.push(Event::GolemBuilt {
                    tick,
                    golem,
                    blueprint,
                });
            }

            Command::AssignGolem { golem, work } => {
                let (catalog, state, _) = self.parts_mut();
                let entry = state
                    .golems
                    .get_mut(golem)
                    .ok_or(CommandError::UnknownGolem(golem))?;
                if let Some(index) = work {
                    let def = catalog
                        .ownable(entry.blueprint)
                        .ok_or(CommandError::UnknownOwnable(entry.blueprint))?;
                    let OwnableKind::GolemBlueprint { works, .. } = &def.kind else {
                        return Err(CommandError::NotABlueprint(entry.blueprint));
                    };
                    if index >= works.len() {
                        return Err(CommandError::InvalidWork(entry.blueprint, index));
                    }
                }
                entry.work = work;
            }

            Command::SubmitOrder {
                recipe,
                requester,
                expires_in,
            } => {
                let (catalog, state, _) = self.parts_mut();
                let def = catalog
                    .ownable(recipe)
                    .ok_or(CommandError::UnknownOwnable(recipe))?;
                if !matches!(def.kind, OwnableKind::CraftingRecipe { .. }) {
                    return Err(CommandError::NotARecipe(recipe));
                }
                if catalog.path(requester).is_none() {
                    return Err(CommandError::UnknownPath(requester));
                }
                if !state.owned.contains(&recipe) {
                    return Err(CommandError::UnknownOwnable(recipe));
                }
                let order = state.push_order(recipe, requester, tick + expires_in);
                events.push(Event::OrderSubmitted {
                    tick,
                    order,
                    recipe,
                });
            }
        }
        Ok(events)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
