//! Caravan trade: owned routes dispatch shipments when their outbound goods
//! are available; shipments deliver after a transit delay.

use crate::amount::Ticks;
use crate::catalog::{Catalog, OwnableKind};
use crate::event::Event;
use crate::ledger::ResourceDelta;
use crate::modifier::ModifierGraph;
use crate::state::GameState;

use super::{apply_tracked, clamp_gains};

/// Run one step of caravan trade: deliveries first, then dispatch.
///
/// Deliveries happen exactly once, at the first tick at or past arrival, in
/// `(arrival, id)` order; inbound gains are clamped into hard-cap headroom so
/// a full warehouse never strands a shipment. Each route keeps at most one
/// shipment in flight.
pub fn run(
    catalog: &Catalog,
    state: &mut GameState,
    graph: &mut ModifierGraph,
    events: &mut Vec<Event>,
    net: &mut ResourceDelta,
    tick: Ticks,
) {
    while let Some(front) = state.shipments.first() {
        if front.arrival > tick {
            break;
        }
        let shipment = state.shipments.remove(0);
        let Some(def) = catalog.ownable(shipment.route) else {
            continue;
        };
        let OwnableKind::TradeRoute { receive, .. } = &def.kind else {
            continue;
        };
        let mut delta = ResourceDelta::new();
        for entry in receive {
            delta.add(entry.resource, entry.amount);
        }
        let delta = clamp_gains(&state.ledger, &delta);
        if !delta.is_empty() {
            // Pure gains within headroom cannot fail.
            let _ = apply_tracked(&mut state.ledger, graph, net, &delta);
        }
        events.push(Event::ShipmentDelivered {
            tick,
            shipment: shipment.id,
            route: shipment.route,
        });
    }

    for (id, def) in catalog.ownables() {
        if !state.owned.contains(&id) {
            continue;
        }
        let OwnableKind::TradeRoute { give, transit, .. } = &def.kind else {
            continue;
        };
        if state.shipments.iter().any(|s| s.route == id) {
            continue;
        }
        let mut outbound = ResourceDelta::new();
        for entry in give {
            outbound.add(entry.resource, -entry.amount);
        }
        if apply_tracked(&mut state.ledger, graph, net, &outbound).is_ok() {
            let shipment = state.push_shipment(id, tick + transit);
            events.push(Event::ShipmentDispatched {
                tick,
                shipment,
                route: id,
            });
        }
    }
}
