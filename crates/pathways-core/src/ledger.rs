//! The resource ledger: authoritative decimal amounts for every resource.
//!
//! Mutation goes through [`ResourceLedger::apply`], which is all-or-nothing:
//! the full set of resulting amounts is computed first, and nothing commits
//! unless every result is non-negative and within its hard cap. Soft-cap
//! decay is not the ledger's concern; the modifier graph tapers rates, the
//! ledger only stores and bounds.

use crate::amount::Amount;
use crate::id::ResourceId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Errors produced by ledger mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The delta would drive the named resource below zero or past its hard
    /// cap. The first violating resource in ascending id order is reported.
    #[error("insufficient funds: resource {resource:?} would leave its valid range")]
    InsufficientFunds { resource: ResourceId },

    /// The delta names a resource the ledger does not track.
    #[error("unknown resource {0:?}")]
    UnknownResource(ResourceId),
}

// ---------------------------------------------------------------------------
// ResourceDelta
// ---------------------------------------------------------------------------

/// A signed multi-resource delta. Ordered by resource id, so validation and
/// error reporting are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDelta(BTreeMap<ResourceId, Amount>);

impl ResourceDelta {
    /// An empty delta.
    pub fn new() -> Self {
        Self::default()
    }

    /// A delta with a single entry.
    pub fn single(resource: ResourceId, amount: Amount) -> Self {
        let mut d = Self::new();
        d.add(resource, amount);
        d
    }

    /// Accumulate an amount onto a resource. Entries that cancel to exactly
    /// zero are removed.
    pub fn add(&mut self, resource: ResourceId, amount: Amount) {
        let entry = self.0.entry(resource).or_insert(Decimal::ZERO);
        *entry += amount;
        if entry.is_zero() {
            self.0.remove(&resource);
        }
    }

    /// Accumulate every entry of `other` onto this delta.
    pub fn merge(&mut self, other: &ResourceDelta) {
        for (&resource, &amount) in other.iter() {
            self.add(resource, amount);
        }
    }

    /// The accumulated amount for a resource (zero if absent).
    pub fn get(&self, resource: ResourceId) -> Amount {
        self.0.get(&resource).copied().unwrap_or(Decimal::ZERO)
    }

    /// Iterate entries in ascending resource-id order.
    pub fn iter(&self) -> impl Iterator<Item = (&ResourceId, &Amount)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// A copy of this delta with every entry negated. Turns a cost vector
    /// into the delta that pays it.
    pub fn negated(&self) -> ResourceDelta {
        ResourceDelta(self.0.iter().map(|(&r, &a)| (r, -a)).collect())
    }
}

impl FromIterator<(ResourceId, Amount)> for ResourceDelta {
    fn from_iter<T: IntoIterator<Item = (ResourceId, Amount)>>(iter: T) -> Self {
        let mut d = Self::new();
        for (r, a) in iter {
            d.add(r, a);
        }
        d
    }
}

// ---------------------------------------------------------------------------
// ResourceLedger
// ---------------------------------------------------------------------------

/// Dense per-resource amounts with optional soft and hard caps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLedger {
    amounts: Vec<Amount>,
    soft_caps: Vec<Option<Amount>>,
    hard_caps: Vec<Option<Amount>>,
}

impl ResourceLedger {
    /// Build a ledger from per-resource (initial, soft cap, hard cap) rows,
    /// in resource-id order. `Catalog::new_ledger` is the usual entry point.
    pub fn from_rows(rows: impl IntoIterator<Item = (Amount, Option<Amount>, Option<Amount>)>) -> Self {
        let mut amounts = Vec::new();
        let mut soft_caps = Vec::new();
        let mut hard_caps = Vec::new();
        for (initial, soft, hard) in rows {
            amounts.push(initial);
            soft_caps.push(soft);
            hard_caps.push(hard);
        }
        Self {
            amounts,
            soft_caps,
            hard_caps,
        }
    }

    /// Number of tracked resources.
    pub fn resource_count(&self) -> usize {
        self.amounts.len()
    }

    /// Current amount of a resource. Untracked ids read as zero.
    pub fn get(&self, resource: ResourceId) -> Amount {
        self.amounts
            .get(resource.0 as usize)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Soft cap for a resource, if configured.
    pub fn soft_cap(&self, resource: ResourceId) -> Option<Amount> {
        self.soft_caps.get(resource.0 as usize).copied().flatten()
    }

    /// Hard cap for a resource, if configured.
    pub fn hard_cap(&self, resource: ResourceId) -> Option<Amount> {
        self.hard_caps.get(resource.0 as usize).copied().flatten()
    }

    /// Apply a signed delta atomically.
    ///
    /// Every resulting amount is computed before anything commits. If any
    /// result is negative or above its hard cap, nothing changes and the
    /// first violating resource (ascending id) is reported.
    pub fn apply(&mut self, delta: &ResourceDelta) -> Result<(), LedgerError> {
        for (&resource, &change) in delta.iter() {
            let idx = resource.0 as usize;
            let current = self
                .amounts
                .get(idx)
                .copied()
                .ok_or(LedgerError::UnknownResource(resource))?;
            let next = current + change;
            if next < Decimal::ZERO {
                return Err(LedgerError::InsufficientFunds { resource });
            }
            if let Some(hard) = self.hard_caps[idx] {
                if next > hard {
                    return Err(LedgerError::InsufficientFunds { resource });
                }
            }
        }
        for (&resource, &change) in delta.iter() {
            self.amounts[resource.0 as usize] += change;
        }
        Ok(())
    }

    /// Overwrite a resource's amount directly. Used by persistence when
    /// restoring a save; gameplay goes through `apply`.
    pub fn restore(&mut self, resource: ResourceId, amount: Amount) -> Result<(), LedgerError> {
        let idx = resource.0 as usize;
        if idx >= self.amounts.len() {
            return Err(LedgerError::UnknownResource(resource));
        }
        self.amounts[idx] = amount;
        Ok(())
    }

    /// Snapshot all amounts in resource-id order.
    pub fn snapshot(&self) -> Vec<Amount> {
        self.amounts.clone()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
