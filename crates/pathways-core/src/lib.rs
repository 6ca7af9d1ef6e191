//! Pathways Core -- the progression engine for a many-path incremental game.
//!
//! This crate provides the shared resource ledger, the modifier graph that
//! folds hundreds of independently authored bonuses into effective rates,
//! the per-path automation systems, deterministic tick advancement, offline
//! catch-up, and versioned persistence that the game client depends on.
//!
//! # Tick Pipeline
//!
//! Each step of [`engine::Engine::advance`] runs four phases:
//!
//! 1. **Production** -- effective per-resource rates are applied to the
//!    ledger, one resource at a time so a capped resource never blocks
//!    income on the others.
//! 2. **Automation** -- golem work, crafting-order fulfillment, caravan
//!    dispatch/delivery, and gathering-tool usage, in declaration order.
//! 3. **Achievements** -- not-yet-granted achievements are re-evaluated in
//!    ascending id order; new grants feed reward modifiers back into the
//!    modifier graph.
//! 4. **Bookkeeping** -- tick counter and cache invalidation notes.
//!
//! # Key Types
//!
//! - [`engine::Engine`] -- owns the catalog, game state, and modifier graph.
//! - [`ledger::ResourceLedger`] -- decimal resource amounts with atomic,
//!   all-or-nothing multi-resource deltas.
//! - [`modifier::ModifierGraph`] -- memoized additive/multiplicative/override
//!   stacking with precise invalidation.
//! - [`catalog::Catalog`] -- immutable content tables, frozen at load.
//! - [`offline::run`] -- capped, interruptible offline catch-up.
//! - [`save`] -- versioned JSON persistence with forward-only migrations.

pub mod achievement;
pub mod amount;
pub mod automation;
pub mod catalog;
pub mod command;
pub mod engine;
pub mod event;
pub mod id;
pub mod ledger;
pub mod modifier;
pub mod offline;
pub mod save;
pub mod state;
