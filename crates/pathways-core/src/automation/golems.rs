//! Golem work assignment: each assigned golem runs its work type once per
//! step, consuming the work's inputs and producing its output.

use crate::amount::{Amount, Ticks};
use crate::catalog::{Catalog, OwnableKind};
use crate::event::Event;
use crate::id::GolemId;
use crate::ledger::ResourceDelta;
use crate::modifier::ModifierGraph;
use crate::state::GameState;
use rust_decimal::Decimal;

use super::{apply_tracked, clamp_gain};

/// Run one step of golem work. A golem whose inputs are short contributes
/// nothing this step and emits `GolemStarved`; other golems continue.
pub fn run(
    catalog: &Catalog,
    state: &mut GameState,
    graph: &mut ModifierGraph,
    events: &mut Vec<Event>,
    net: &mut ResourceDelta,
    tick: Ticks,
) {
    let output_factor: Amount = match catalog.golem_output_stat() {
        Some(stat) => graph.effective_stat(stat, state),
        None => Decimal::ONE,
    };

    // Slot order is deterministic for a given build/assign history.
    let ids: Vec<GolemId> = state.golems.keys().collect();
    for id in ids {
        let Some(golem) = state.golems.get(id) else {
            continue;
        };
        let Some(work_index) = golem.work else {
            continue;
        };
        let Some(def) = catalog.ownable(golem.blueprint) else {
            continue;
        };
        let OwnableKind::GolemBlueprint { works, .. } = &def.kind else {
            continue;
        };
        let Some(work) = works.get(work_index) else {
            continue;
        };

        let output = clamp_gain(&state.ledger, work.output, work.base_output * output_factor);
        let mut delta = ResourceDelta::new();
        for input in &work.inputs {
            delta.add(input.resource, -input.amount);
        }
        // Nothing to produce and nothing to burn for it.
        if output.is_zero() && !delta.is_empty() {
            continue;
        }
        delta.add(work.output, output);
        if delta.is_empty() {
            continue;
        }
        if apply_tracked(&mut state.ledger, graph, net, &delta).is_err() {
            events.push(Event::GolemStarved { tick, golem: id });
        }
    }
}
