//! The modifier graph: folds every owned bonus into effective rates.
//!
//! Modifiers come from purchased ownables and granted achievements. For each
//! target (a resource's production rate or a derived stat), stacking is
//! deterministic: all active additive magnitudes sum into a base, the base
//! is multiplied by the product of `(1 + m)` over active multiplicative
//! magnitudes, and if any override is active, the one applied last in
//! ascending source-id order replaces the value entirely.
//!
//! Effective values are memoized per target. Invalidation is precise:
//! reverse dependency indices record which targets' predicates read a given
//! resource, path, stat, or ownership flag, and only those cache slots are
//! cleared when the input changes. Tick cost stays proportional to what
//! changed, not to the total modifier count.

use crate::amount::Amount;
use crate::id::{OwnableId, PathId, ResourceId, SourceId, StatId};
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};

// ---------------------------------------------------------------------------
// World view
// ---------------------------------------------------------------------------

/// Read-only view of the game world that predicates and the soft-cap taper
/// evaluate against. Implemented by `GameState`.
pub trait WorldView {
    fn resource_amount(&self, resource: ResourceId) -> Amount;
    fn resource_soft_cap(&self, resource: ResourceId) -> Option<Amount>;
    fn resource_hard_cap(&self, resource: ResourceId) -> Option<Amount>;
    fn path_unlocked(&self, path: PathId) -> bool;
    fn owns(&self, ownable: OwnableId) -> bool;
}

// ---------------------------------------------------------------------------
// Modifier model
// ---------------------------------------------------------------------------

/// What a modifier applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModifierTarget {
    /// The per-step production rate of a resource.
    ResourceRate(ResourceId),
    /// A derived stat (craft speed, golem output, ...).
    Stat(StatId),
}

/// How a modifier combines with others on the same target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifierOp {
    /// Summed into the base.
    Additive,
    /// Contributes a `(1 + magnitude)` factor.
    Multiplicative,
    /// Replaces the computed value entirely.
    Override,
}

/// A condition gating whether a modifier is currently active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    PathUnlocked(PathId),
    ResourceAtLeast(ResourceId, Amount),
    StatAtLeast(StatId, Amount),
    Owns(OwnableId),
    All(Vec<Predicate>),
}

/// The ids a predicate reads, collected for validation and for building the
/// reverse invalidation indices.
#[derive(Debug, Default)]
pub struct PredicateInputs {
    pub resources: Vec<ResourceId>,
    pub paths: Vec<PathId>,
    pub stats: Vec<StatId>,
    pub ownables: Vec<OwnableId>,
}

impl Predicate {
    pub fn collect_inputs(&self, out: &mut PredicateInputs) {
        match self {
            Predicate::PathUnlocked(p) => out.paths.push(*p),
            Predicate::ResourceAtLeast(r, _) => out.resources.push(*r),
            Predicate::StatAtLeast(s, _) => out.stats.push(*s),
            Predicate::Owns(o) => out.ownables.push(*o),
            Predicate::All(children) => {
                for child in children {
                    child.collect_inputs(out);
                }
            }
        }
    }
}

/// A quantified effect contributed by an owned entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modifier {
    pub source: SourceId,
    pub target: ModifierTarget,
    pub op: ModifierOp,
    pub magnitude: Amount,
    pub predicate: Option<Predicate>,
}

// ---------------------------------------------------------------------------
// ModifierGraph
// ---------------------------------------------------------------------------

/// Internal cache key: one slot per target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Target {
    Rate(ResourceId),
    Stat(StatId),
}

impl From<ModifierTarget> for Target {
    fn from(t: ModifierTarget) -> Self {
        match t {
            ModifierTarget::ResourceRate(r) => Target::Rate(r),
            ModifierTarget::Stat(s) => Target::Stat(s),
        }
    }
}

/// Resolves effective per-resource rates and per-stat values from the set of
/// installed modifier sources.
#[derive(Debug)]
pub struct ModifierGraph {
    /// Modifiers per resource rate, each bucket sorted by ascending source id.
    resource_mods: Vec<Vec<Modifier>>,
    /// Modifiers per stat, each bucket sorted by ascending source id.
    stat_mods: Vec<Vec<Modifier>>,
    /// Base stat values from the catalog.
    stat_bases: Vec<Amount>,

    /// Memoized raw rates (before soft-cap taper).
    rate_cache: Vec<Option<Amount>>,
    /// Memoized stat values.
    stat_cache: Vec<Option<Amount>>,

    // Reverse dependency indices: input -> targets whose predicates read it.
    dep_resource: Vec<Vec<Target>>,
    dep_path: Vec<Vec<Target>>,
    dep_stat: Vec<Vec<Target>>,
    dep_ownable: HashMap<OwnableId, Vec<Target>>,

    /// Sources already installed. Re-installing is a no-op, which makes
    /// achievement re-grant checks idempotent.
    installed: BTreeSet<SourceId>,
}

impl ModifierGraph {
    /// Create an empty graph sized for the catalog's resources and stats.
    pub fn new(resource_count: usize, stat_bases: Vec<Amount>) -> Self {
        let stat_count = stat_bases.len();
        Self {
            resource_mods: vec![Vec::new(); resource_count],
            stat_mods: vec![Vec::new(); stat_count],
            stat_bases,
            rate_cache: vec![None; resource_count],
            stat_cache: vec![None; stat_count],
            dep_resource: vec![Vec::new(); resource_count],
            dep_path: Vec::new(),
            dep_stat: vec![Vec::new(); stat_count],
            dep_ownable: HashMap::new(),
            installed: BTreeSet::new(),
        }
    }

    /// True if the source's modifiers are already installed.
    pub fn is_installed(&self, source: SourceId) -> bool {
        self.installed.contains(&source)
    }

    /// Install a source's modifiers. Installing the same source twice is a
    /// no-op. Targets are assumed valid; the catalog rejects dangling ids at
    /// build time.
    pub fn add_source(&mut self, source: SourceId, modifiers: &[Modifier]) {
        if !self.installed.insert(source) {
            return;
        }
        for modifier in modifiers {
            let target = Target::from(modifier.target);
            if let Some(predicate) = &modifier.predicate {
                let mut inputs = PredicateInputs::default();
                predicate.collect_inputs(&mut inputs);
                for r in inputs.resources {
                    self.dep_resource[r.0 as usize].push(target);
                }
                for p in inputs.paths {
                    let idx = p.0 as usize;
                    if self.dep_path.len() <= idx {
                        self.dep_path.resize(idx + 1, Vec::new());
                    }
                    self.dep_path[idx].push(target);
                }
                for s in inputs.stats {
                    self.dep_stat[s.0 as usize].push(target);
                }
                for o in inputs.ownables {
                    self.dep_ownable.entry(o).or_default().push(target);
                }
            }
            match target {
                Target::Rate(r) => {
                    let bucket = &mut self.resource_mods[r.0 as usize];
                    bucket.push(modifier.clone());
                    bucket.sort_by_key(|m| m.source);
                }
                Target::Stat(s) => {
                    let bucket = &mut self.stat_mods[s.0 as usize];
                    bucket.push(modifier.clone());
                    bucket.sort_by_key(|m| m.source);
                }
            }
            self.invalidate(target);
        }
    }

    // -----------------------------------------------------------------------
    // Invalidation
    // -----------------------------------------------------------------------

    /// A resource amount changed; drop cached values whose predicates or
    /// taper read it.
    pub fn note_resource_changed(&mut self, resource: ResourceId) {
        let dependents = self
            .dep_resource
            .get(resource.0 as usize)
            .cloned()
            .unwrap_or_default();
        for target in dependents {
            self.invalidate(target);
        }
    }

    /// A path was unlocked.
    pub fn note_path_unlocked(&mut self, path: PathId) {
        let dependents = self
            .dep_path
            .get(path.0 as usize)
            .cloned()
            .unwrap_or_default();
        for target in dependents {
            self.invalidate(target);
        }
    }

    /// An ownable entered the owned set.
    pub fn note_ownable_acquired(&mut self, ownable: OwnableId) {
        let dependents = self.dep_ownable.get(&ownable).cloned().unwrap_or_default();
        for target in dependents {
            self.invalidate(target);
        }
    }

    /// Clear a target's cache slot, cascading through stats that other
    /// targets' predicates read.
    fn invalidate(&mut self, target: Target) {
        let mut work = vec![target];
        while let Some(t) = work.pop() {
            match t {
                Target::Rate(r) => {
                    self.rate_cache[r.0 as usize] = None;
                }
                Target::Stat(s) => {
                    let idx = s.0 as usize;
                    if self.stat_cache[idx].take().is_some() {
                        work.extend(self.dep_stat[idx].iter().copied());
                    }
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Effective values
    // -----------------------------------------------------------------------

    /// Raw effective production rate for a resource, before soft-cap taper.
    pub fn effective_rate(&mut self, resource: ResourceId, view: &impl WorldView) -> Amount {
        let idx = resource.0 as usize;
        if let Some(cached) = self.rate_cache.get(idx).copied().flatten() {
            return cached;
        }
        let mods = self
            .resource_mods
            .get(idx)
            .cloned()
            .unwrap_or_default();
        let value = self.stack(&mods, Decimal::ZERO, view);
        if idx < self.rate_cache.len() {
            self.rate_cache[idx] = Some(value);
        }
        value
    }

    /// Effective value of a derived stat.
    pub fn effective_stat(&mut self, stat: StatId, view: &impl WorldView) -> Amount {
        let idx = stat.0 as usize;
        if let Some(cached) = self.stat_cache.get(idx).copied().flatten() {
            return cached;
        }
        let base = self
            .stat_bases
            .get(idx)
            .copied()
            .unwrap_or(Decimal::ZERO);
        let mods = self.stat_mods.get(idx).cloned().unwrap_or_default();
        let value = self.stack(&mods, base, view);
        if idx < self.stat_cache.len() {
            self.stat_cache[idx] = Some(value);
        }
        value
    }

    /// Production rate for a resource with the soft-cap taper applied: a
    /// positive rate decays linearly from full at the soft cap to zero at
    /// the hard cap.
    pub fn production_rate(&mut self, resource: ResourceId, view: &impl WorldView) -> Amount {
        let raw = self.effective_rate(resource, view);
        if raw <= Decimal::ZERO {
            return raw;
        }
        let (soft, hard) = (
            view.resource_soft_cap(resource),
            view.resource_hard_cap(resource),
        );
        if let (Some(soft), Some(hard)) = (soft, hard) {
            let current = view.resource_amount(resource);
            if current >= hard {
                return Decimal::ZERO;
            }
            if current > soft && hard > soft {
                let factor = (hard - current) / (hard - soft);
                return raw * factor;
            }
        }
        raw
    }

    /// Evaluate a predicate against the current world.
    pub fn predicate_holds(&mut self, predicate: &Predicate, view: &impl WorldView) -> bool {
        match predicate {
            Predicate::PathUnlocked(p) => view.path_unlocked(*p),
            Predicate::ResourceAtLeast(r, threshold) => view.resource_amount(*r) >= *threshold,
            Predicate::StatAtLeast(s, threshold) => self.effective_stat(*s, view) >= *threshold,
            Predicate::Owns(o) => view.owns(*o),
            Predicate::All(children) => children.iter().all(|c| self.predicate_holds(c, view)),
        }
    }

    /// Deterministic stacking: additive, then multiplicative, then override.
    /// `mods` is sorted by ascending source id, so the last active override
    /// (highest source id) wins.
    fn stack(&mut self, mods: &[Modifier], base: Amount, view: &impl WorldView) -> Amount {
        let mut additive = base;
        let mut factor = Decimal::ONE;
        let mut override_value = None;
        for modifier in mods {
            let active = match &modifier.predicate {
                Some(predicate) => self.predicate_holds(predicate, view),
                None => true,
            };
            if !active {
                continue;
            }
            match modifier.op {
                ModifierOp::Additive => additive += modifier.magnitude,
                ModifierOp::Multiplicative => factor *= Decimal::ONE + modifier.magnitude,
                ModifierOp::Override => override_value = Some(modifier.magnitude),
            }
        }
        match override_value {
            Some(v) => v,
            None => additive * factor,
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
