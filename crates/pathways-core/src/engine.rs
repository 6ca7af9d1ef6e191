//! The tick engine: the single authoritative clock.
//!
//! `advance` converts elapsed wall-clock time into whole fixed-size steps,
//! carrying the remainder forward so no simulated time is ever dropped. Each
//! step runs the same pipeline:
//!
//! 1. production from effective rates, applied per resource
//! 2. automation systems in declaration order (golems, crafting, caravans,
//!    gathering)
//! 3. achievement evaluation
//! 4. tick counter bookkeeping
//!
//! Everything is single-threaded and synchronous; consumers read state
//! between `advance` calls, never mid-step.

use crate::achievement;
use crate::amount::Millis;
use crate::automation;
use crate::catalog::Catalog;
use crate::event::AdvanceReport;
use crate::ledger::ResourceDelta;
use crate::modifier::ModifierGraph;
use crate::state::GameState;
use rust_decimal::Decimal;
use tracing::debug;

/// Tunables for the clock and the offline calculator.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Simulated milliseconds per step.
    pub step_ms: Millis,
    /// Hard limit on how much absence the offline calculator will simulate.
    pub offline_cap_ms: Millis,
    /// Below this many steps, offline progress replays the engine directly;
    /// above it, steady windows are compressed.
    pub replay_threshold_steps: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            step_ms: 1000,
            offline_cap_ms: 12 * 60 * 60 * 1000,
            replay_threshold_steps: 10_000,
        }
    }
}

/// The assembled simulation: immutable catalog, mutable world, and the
/// modifier graph derived from ownership.
#[derive(Debug)]
pub struct Engine {
    catalog: Catalog,
    state: GameState,
    graph: ModifierGraph,
    config: EngineConfig,
    remainder_ms: Millis,
}

impl Engine {
    /// A fresh game over the given catalog.
    pub fn new(catalog: Catalog, config: EngineConfig) -> Self {
        let state = GameState::new(&catalog);
        let graph = ModifierGraph::new(catalog.resource_count(), catalog.stat_bases());
        Self {
            catalog,
            state,
            graph,
            config,
            remainder_ms: 0,
        }
    }

    /// Reassemble an engine from restored state, re-deriving the modifier
    /// graph from the owned and granted sets.
    pub(crate) fn restore(
        catalog: Catalog,
        state: GameState,
        config: EngineConfig,
        remainder_ms: Millis,
    ) -> Self {
        let mut graph = ModifierGraph::new(catalog.resource_count(), catalog.stat_bases());
        for (id, def) in catalog.ownables() {
            if state.owned.contains(&id) {
                graph.add_source(def.source, &def.grants);
            }
        }
        for (id, def) in catalog.achievements() {
            if state.granted.contains(&id) {
                graph.add_source(def.source, &def.rewards);
            }
        }
        Self {
            catalog,
            state,
            graph,
            config,
            remainder_ms,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Simulated milliseconds not yet large enough to form a whole step.
    pub fn remainder_ms(&self) -> Millis {
        self.remainder_ms
    }

    pub(crate) fn parts_mut(&mut self) -> (&Catalog, &mut GameState, &mut ModifierGraph) {
        (&self.catalog, &mut self.state, &mut self.graph)
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    /// Advance by a non-negative elapsed duration.
    ///
    /// The duration is converted into whole steps; the sub-step remainder is
    /// carried forward into the next call. Calling twice for the same
    /// wall-clock interval double-applies progress; tracking the
    /// last-advanced timestamp is the caller's job.
    pub fn advance(&mut self, elapsed_ms: Millis) -> AdvanceReport {
        let total = self.remainder_ms + elapsed_ms;
        let steps = total / self.config.step_ms;
        self.remainder_ms = total % self.config.step_ms;
        self.advance_steps(steps)
    }

    /// Advance by an exact number of whole steps.
    pub fn advance_steps(&mut self, steps: u64) -> AdvanceReport {
        let mut report = AdvanceReport::default();
        for _ in 0..steps {
            self.step(&mut report);
        }
        report.steps_run = steps;
        if steps > 0 {
            debug!(steps, tick = self.state.tick, "advanced");
        }
        report
    }

    /// One discrete step of the pipeline.
    fn step(&mut self, report: &mut AdvanceReport) {
        let tick = self.state.tick;

        // Phase 1: production. Applied per resource, clamped into [0, hard
        // cap], so one full or empty resource never blocks the others.
        for (id, _) in self.catalog.resources() {
            let rate = self.graph.production_rate(id, &self.state);
            if rate.is_zero() {
                continue;
            }
            let current = self.state.ledger.get(id);
            let mut next = current + rate;
            if next < Decimal::ZERO {
                next = Decimal::ZERO;
            }
            if let Some(hard) = self.state.ledger.hard_cap(id) {
                next = next.min(hard);
            }
            let change = next - current;
            if change.is_zero() {
                continue;
            }
            let delta = ResourceDelta::single(id, change);
            let _ = automation::apply_tracked(
                &mut self.state.ledger,
                &mut self.graph,
                &mut report.net,
                &delta,
            );
        }

        // Phase 2: automation, in declaration order.
        automation::golems::run(
            &self.catalog,
            &mut self.state,
            &mut self.graph,
            &mut report.events,
            &mut report.net,
            tick,
        );
        automation::crafting::run(
            &self.catalog,
            &mut self.state,
            &mut self.graph,
            &mut report.events,
            &mut report.net,
            tick,
        );
        automation::caravans::run(
            &self.catalog,
            &mut self.state,
            &mut self.graph,
            &mut report.events,
            &mut report.net,
            tick,
        );
        automation::gathering::run(
            &self.catalog,
            &mut self.state,
            &mut self.graph,
            &mut report.events,
            &mut report.net,
            tick,
        );

        // Phase 3: achievements.
        achievement::evaluate(
            &self.catalog,
            &mut self.state,
            &mut self.graph,
            &mut report.events,
            tick,
        );

        // Phase 4: bookkeeping.
        self.state.tick = tick + 1;
    }
}

// ===========================================================================
// Tests
// ===========================================================================
