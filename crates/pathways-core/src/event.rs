//! Events emitted by the tick pipeline.
//!
//! The engine does not push notifications; each `advance` returns an
//! [`AdvanceReport`] whose event list is the structured diff of everything
//! that happened. Observers consume the report between steps.

use crate::id::{AchievementId, GolemId, OrderId, OwnableId, PathId, ShipmentId};
use crate::amount::Ticks;
use crate::ledger::ResourceDelta;

/// Something that happened during a step. Every variant carries the tick it
/// happened on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    AchievementGranted {
        tick: Ticks,
        achievement: AchievementId,
    },
    OrderSubmitted {
        tick: Ticks,
        order: OrderId,
        recipe: OwnableId,
    },
    OrderFulfilled {
        tick: Ticks,
        order: OrderId,
        recipe: OwnableId,
    },
    /// An order passed its expiry tick without being fulfillable. Non-fatal,
    /// reported rather than thrown.
    OrderExpired {
        tick: Ticks,
        order: OrderId,
        recipe: OwnableId,
    },
    ShipmentDispatched {
        tick: Ticks,
        shipment: ShipmentId,
        route: OwnableId,
    },
    ShipmentDelivered {
        tick: Ticks,
        shipment: ShipmentId,
        route: OwnableId,
    },
    PathUnlocked {
        tick: Ticks,
        path: PathId,
    },
    OwnablePurchased {
        tick: Ticks,
        ownable: OwnableId,
    },
    GolemBuilt {
        tick: Ticks,
        golem: GolemId,
        blueprint: OwnableId,
    },
    /// A golem's work inputs were short this step; its contribution was
    /// skipped, other golems continued.
    GolemStarved {
        tick: Ticks,
        golem: GolemId,
    },
}

/// Discriminant-only view of an event, for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    AchievementGranted,
    OrderSubmitted,
    OrderFulfilled,
    OrderExpired,
    ShipmentDispatched,
    ShipmentDelivered,
    PathUnlocked,
    OwnablePurchased,
    GolemBuilt,
    GolemStarved,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::AchievementGranted { .. } => EventKind::AchievementGranted,
            Event::OrderSubmitted { .. } => EventKind::OrderSubmitted,
            Event::OrderFulfilled { .. } => EventKind::OrderFulfilled,
            Event::OrderExpired { .. } => EventKind::OrderExpired,
            Event::ShipmentDispatched { .. } => EventKind::ShipmentDispatched,
            Event::ShipmentDelivered { .. } => EventKind::ShipmentDelivered,
            Event::PathUnlocked { .. } => EventKind::PathUnlocked,
            Event::OwnablePurchased { .. } => EventKind::OwnablePurchased,
            Event::GolemBuilt { .. } => EventKind::GolemBuilt,
            Event::GolemStarved { .. } => EventKind::GolemStarved,
        }
    }

    pub fn tick(&self) -> Ticks {
        match self {
            Event::AchievementGranted { tick, .. }
            | Event::OrderSubmitted { tick, .. }
            | Event::OrderFulfilled { tick, .. }
            | Event::OrderExpired { tick, .. }
            | Event::ShipmentDispatched { tick, .. }
            | Event::ShipmentDelivered { tick, .. }
            | Event::PathUnlocked { tick, .. }
            | Event::OwnablePurchased { tick, .. }
            | Event::GolemBuilt { tick, .. }
            | Event::GolemStarved { tick, .. } => *tick,
        }
    }
}

/// The structured result of an `advance` call: how far the clock moved, what
/// happened, and the net ledger movement over the whole call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvanceReport {
    pub steps_run: u64,
    pub events: Vec<Event>,
    pub net: ResourceDelta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        let e = Event::OrderExpired {
            tick: 7,
            order: OrderId(1),
            recipe: OwnableId(0),
        };
        assert_eq!(e.kind(), EventKind::OrderExpired);
        assert_eq!(e.tick(), 7);
    }
}
