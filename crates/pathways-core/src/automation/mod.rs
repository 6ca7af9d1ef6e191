//! Path automation: golem work, crafting fulfillment, caravan trade, and
//! gathering tools.
//!
//! Each system is one function over the shared world, run once per step in
//! declaration order. A system that cannot act this step (short inputs, full
//! caps) skips the single contribution and continues; one automation's
//! failure never blocks the rest of the tick.

pub mod caravans;
pub mod crafting;
pub mod gathering;
pub mod golems;

use crate::amount::Amount;
use crate::id::ResourceId;
use crate::ledger::{LedgerError, ResourceDelta, ResourceLedger};
use crate::modifier::ModifierGraph;
use rust_decimal::Decimal;

/// Apply a delta atomically, note the changed resources to the graph, and
/// fold the delta into the step's running net.
pub(crate) fn apply_tracked(
    ledger: &mut ResourceLedger,
    graph: &mut ModifierGraph,
    net: &mut ResourceDelta,
    delta: &ResourceDelta,
) -> Result<(), LedgerError> {
    ledger.apply(delta)?;
    for (&resource, _) in delta.iter() {
        graph.note_resource_changed(resource);
    }
    net.merge(delta);
    Ok(())
}

/// Clamp a single positive gain into the resource's hard-cap headroom.
pub(crate) fn clamp_gain(ledger: &ResourceLedger, resource: ResourceId, gain: Amount) -> Amount {
    match ledger.hard_cap(resource) {
        Some(hard) => {
            let headroom = (hard - ledger.get(resource)).max(Decimal::ZERO);
            gain.min(headroom)
        }
        None => gain,
    }
}

/// Clamp every positive entry of a delta into hard-cap headroom, leaving
/// negative entries untouched. Used for deliveries, which must land exactly
/// once even when a cap is nearly full.
pub(crate) fn clamp_gains(ledger: &ResourceLedger, delta: &ResourceDelta) -> ResourceDelta {
    delta
        .iter()
        .map(|(&resource, &change)| {
            if change > Decimal::ZERO {
                (resource, clamp_gain(ledger, resource, change))
            } else {
                (resource, change)
            }
        })
        .collect()
}
