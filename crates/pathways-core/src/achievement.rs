//! Achievement evaluation: one-time grants whose reward modifiers feed back
//! into the modifier graph.

use crate::amount::Ticks;
use crate::catalog::Catalog;
use crate::event::Event;
use crate::modifier::ModifierGraph;
use crate::state::GameState;

/// Evaluate every not-yet-granted achievement against the current world, in
/// ascending achievement id order.
///
/// A newly true predicate grants exactly once per save: the id enters the
/// granted set, the reward modifiers are installed as a graph source (a
/// no-op if somehow already installed), and an event is emitted. Granted
/// achievements are never re-evaluated.
pub fn evaluate(
    catalog: &Catalog,
    state: &mut GameState,
    graph: &mut ModifierGraph,
    events: &mut Vec<Event>,
    tick: Ticks,
) {
    for (id, def) in catalog.achievements() {
        if state.granted.contains(&id) {
            continue;
        }
        if !graph.predicate_holds(&def.predicate, &*state) {
            continue;
        }
        state.granted.insert(id);
        graph.add_source(def.source, &def.rewards);
        events.push(Event::AchievementGranted {
            tick,
            achievement: id,
        });
    }
}
