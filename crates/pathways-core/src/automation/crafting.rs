//! Crafting-order fulfillment: pending orders are tried in expiry order and
//! either fulfilled atomically or expired with an event.

use crate::amount::Ticks;
use crate::catalog::{Catalog, OwnableKind};
use crate::event::Event;
use crate::ledger::ResourceDelta;
use crate::modifier::ModifierGraph;
use crate::state::GameState;

use super::apply_tracked;

/// Run one step of order fulfillment.
///
/// Orders are walked in `(expiry, id)` order. Fulfillment consumes the
/// recipe's requirements and grants its reward in a single atomic apply; a
/// short order is left pending until it expires, then removed with an
/// `OrderExpired` event and no ledger change.
pub fn run(
    catalog: &Catalog,
    state: &mut GameState,
    graph: &mut ModifierGraph,
    events: &mut Vec<Event>,
    net: &mut ResourceDelta,
    tick: Ticks,
) {
    let pending = std::mem::take(&mut state.orders);
    let mut remaining = Vec::with_capacity(pending.len());
    for order in pending {
        let Some(def) = catalog.ownable(order.recipe) else {
            continue;
        };
        let OwnableKind::CraftingRecipe { requires, reward } = &def.kind else {
            continue;
        };
        let mut delta = ResourceDelta::new();
        for entry in requires {
            delta.add(entry.resource, -entry.amount);
        }
        delta.add(reward.resource, reward.amount);

        if apply_tracked(&mut state.ledger, graph, net, &delta).is_ok() {
            events.push(Event::OrderFulfilled {
                tick,
                order: order.id,
                recipe: order.recipe,
            });
        } else if tick >= order.expiry {
            events.push(Event::OrderExpired {
                tick,
                order: order.id,
                recipe: order.recipe,
            });
        } else {
            remaining.push(order);
        }
    }
    state.orders = remaining;
}
