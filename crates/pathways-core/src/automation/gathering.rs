//! Gathering tools: each owned tool attempts one use per step, burning its
//! upkeep for a yield.

use crate::amount::{Amount, Ticks};
use crate::catalog::{Catalog, OwnableKind};
use crate::event::Event;
use crate::ledger::ResourceDelta;
use crate::modifier::ModifierGraph;
use crate::state::GameState;
use rust_decimal::Decimal;

use super::{apply_tracked, clamp_gain};

/// Run one step of gathering. A tool whose upkeep is short, or whose output
/// is at its hard cap, skips this step.
pub fn run(
    catalog: &Catalog,
    state: &mut GameState,
    graph: &mut ModifierGraph,
    _events: &mut Vec<Event>,
    net: &mut ResourceDelta,
    _tick: Ticks,
) {
    let yield_factor: Amount = match catalog.gather_yield_stat() {
        Some(stat) => graph.effective_stat(stat, state),
        None => Decimal::ONE,
    };

    for (id, def) in catalog.ownables() {
        if !state.owned.contains(&id) {
            continue;
        }
        let OwnableKind::GatheringTool {
            upkeep,
            output,
            base_yield,
        } = &def.kind
        else {
            continue;
        };
        let gain = clamp_gain(&state.ledger, *output, *base_yield * yield_factor);
        if gain.is_zero() {
            continue;
        }
        let mut delta = ResourceDelta::new();
        for entry in upkeep {
            delta.add(entry.resource, -entry.amount);
        }
        delta.add(*output, gain);
        let _ = apply_tracked(&mut state.ledger, graph, net, &delta);
    }
}
