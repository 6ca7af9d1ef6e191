//! Offline progress: converts a long wall-clock absence into a capped,
//! consolidated progression result.
//!
//! Short absences replay the engine step by step. Long ones are compressed:
//! between discrete boundaries (the next order expiry or shipment arrival)
//! the world is in a steady state, so one probe step measures the per-step
//! net delta and the rest of the window is applied as a single scaled delta.
//! A chunk is further bounded by the first tick any resource would hit a
//! bound (a drain running dry, a capped gain saturating), so a fresh probe
//! runs there; achievements are re-evaluated at every boundary.

use crate::achievement;
use crate::amount::{scale_by_ticks, Amount, Millis};
use crate::automation;
use crate::engine::Engine;
use crate::event::{AdvanceReport, Event, EventKind};
use crate::id::AchievementId;
use crate::ledger::ResourceDelta;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{info, warn};

/// Consolidated result of an offline catch-up, for presentation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfflineReport {
    /// Simulated milliseconds, after capping.
    pub simulated_ms: Millis,
    pub steps_run: u64,
    /// True if the elapsed time exceeded the configured offline cap.
    pub capped: bool,
    /// True if the interrupt callback stopped the replay early. Progress up
    /// to the last completed step is committed.
    pub interrupted: bool,
    pub net: ResourceDelta,
    pub achievements: Vec<AchievementId>,
    pub orders_expired: u64,
    pub shipments_delivered: u64,
}

impl OfflineReport {
    fn fold(&mut self, report: AdvanceReport) {
        self.steps_run += report.steps_run;
        self.net.merge(&report.net);
        for event in &report.events {
            match event.kind() {
                EventKind::AchievementGranted => {
                    if let Event::AchievementGranted { achievement, .. } = event {
                        self.achievements.push(*achievement);
                    }
                }
                EventKind::OrderExpired => self.orders_expired += 1,
                EventKind::ShipmentDelivered => self.shipments_delivered += 1,
                _ => {}
            }
        }
    }
}

/// How many steps to replay per interrupt check during direct replay.
const REPLAY_SLICE_STEPS: u64 = 256;

/// Run offline catch-up for `elapsed_ms` of absence.
///
/// The `interrupt` callback is polled between sub-advances; returning true
/// stops the replay cooperatively, leaving a consistent partially-advanced
/// state to persist.
pub fn run(engine: &mut Engine, elapsed_ms: Millis, mut interrupt: impl FnMut() -> bool) -> OfflineReport {
    let cap = engine.config().offline_cap_ms;
    let capped = elapsed_ms > cap;
    if capped {
        warn!(elapsed_ms, cap, "offline window clamped");
    }
    let simulated_ms = elapsed_ms.min(cap);
    let step_ms = engine.config().step_ms;
    let total_steps = simulated_ms / step_ms;

    let mut report = OfflineReport {
        simulated_ms,
        capped,
        ..OfflineReport::default()
    };

    let direct = total_steps <= engine.config().replay_threshold_steps;
    info!(total_steps, direct, "offline catch-up");

    let mut remaining = total_steps;
    while remaining > 0 {
        if interrupt() {
            report.interrupted = true;
            break;
        }
        let ran = if direct {
            let slice = remaining.min(REPLAY_SLICE_STEPS);
            report.fold(engine.advance_steps(slice));
            slice
        } else {
            advance_compressed(engine, remaining, &mut report)
        };
        remaining -= ran;
    }
    report
}

/// Offline catch-up with no interruption source.
pub fn run_uninterrupted(engine: &mut Engine, elapsed_ms: Millis) -> OfflineReport {
    run(engine, elapsed_ms, || false)
}

/// Advance up to `budget` steps in one compressed chunk. Returns the number
/// of steps consumed (always at least one).
fn advance_compressed(engine: &mut Engine, budget: u64, report: &mut OfflineReport) -> u64 {
    // The chunk must not cross a discrete boundary: the step at an order
    // expiry or shipment arrival behaves differently from the steady state.
    let tick = engine.state().tick;
    let boundary = [
        engine.state().next_order_expiry(),
        engine.state().next_shipment_arrival(),
    ]
    .into_iter()
    .flatten()
    .min();
    let chunk = match boundary {
        // Steps strictly before the boundary tick are steady; the boundary
        // step itself runs inside the next chunk's probe.
        Some(b) if b > tick => budget.min(b - tick),
        Some(_) => 1,
        None => budget,
    };

    // Probe: one real step measures the steady per-step delta.
    let probe = engine.advance_steps(1);
    let per_step = probe.net.clone();
    let probe_had_events = !probe.events.is_empty();
    report.fold(probe);
    if chunk == 1 {
        return 1;
    }

    // If the probe itself hit something discrete (a grant, a starvation),
    // the window is not steady; fall back to replaying it.
    if probe_had_events {
        let rest = chunk - 1;
        report.fold(engine.advance_steps(rest));
        return chunk;
    }

    // The probe delta only stays steady while no resource hits a bound: a
    // negative entry runs dry at its exhaustion tick, a positive one against
    // a hard cap saturates. Bound the scaled stretch at the earliest of
    // those ticks; the step past it changes behavior (a starved consumer, a
    // clamped producer) and must be probed fresh.
    let (catalog, state, graph) = engine.parts_mut();
    let mut rest = chunk - 1;
    for (&resource, &per) in per_step.iter() {
        let room: Amount = if per > Decimal::ZERO {
            match state.ledger.hard_cap(resource) {
                Some(hard) => (hard - state.ledger.get(resource)).max(Decimal::ZERO),
                None => continue,
            }
        } else {
            state.ledger.get(resource)
        };
        let sustainable = (room / per.abs()).floor();
        rest = rest.min(sustainable.to_u64().unwrap_or(u64::MAX));
    }
    if rest == 0 {
        return 1;
    }

    let mut scaled = ResourceDelta::new();
    for (&resource, &per) in per_step.iter() {
        scaled.add(resource, scale_by_ticks(per, rest));
    }
    if !scaled.is_empty() {
        // Bounded into range above, so this cannot fail.
        let _ = automation::apply_tracked(&mut state.ledger, graph, &mut report.net, &scaled);
    }
    state.tick += rest;
    let boundary_tick = state.tick;

    // Achievements that became true somewhere inside the chunk surface at
    // its end.
    let mut events = Vec::new();
    achievement::evaluate(catalog, state, graph, &mut events, boundary_tick);
    report.fold(AdvanceReport {
        steps_run: rest,
        events,
        net: ResourceDelta::new(),
    });
    rest + 1
}

// ===========================================================================
// Tests
// ===========================================================================
