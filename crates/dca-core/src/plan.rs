//! # Plan Compiler
//!
//! Flattens an [`AllocationPolicy`] into a [`StakePlan`]: one share per
//! subnet, expressed as a percentage of the whole per-cycle budget.
//!
//! A subnet's flat share is `category.total_percentage × subnet_pct / 100`.
//! With `growth = 70% {1: 50, 2: 50}` and `stable = 30% {3: 100}` the plan is
//! `{1: 35, 2: 35, 3: 30}`.
//!
//! When a subnet appears in more than one category, [`OverlapPolicy`]
//! decides: `Overwrite` (the default) keeps the share from the category
//! encountered last in document order, `Sum` adds the shares. Either way the
//! subnet is reported by [`StakePlan::overlapping_targets`].

use std::collections::{btree_map::Entry, BTreeMap, BTreeSet};

use serde::Serialize;

use crate::model::{AllocationPolicy, SubnetId};

/// How shares for a subnet listed in several categories combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// The later category replaces the earlier share.
    #[default]
    Overwrite,
    /// Shares from every category are added.
    Sum,
}

/// Flat subnet → percentage-of-budget map.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct StakePlan {
    shares: BTreeMap<SubnetId, f64>,
    #[serde(skip)]
    overlapping: BTreeSet<SubnetId>,
}

/// Compile with [`OverlapPolicy::Overwrite`].
pub fn compile(policy: &AllocationPolicy) -> StakePlan {
    compile_with(policy, OverlapPolicy::Overwrite)
}

/// Compile with an explicit overlap policy. Subnets whose final share is
/// zero are left out of the plan; they would only produce empty transfers.
pub fn compile_with(policy: &AllocationPolicy, overlap: OverlapPolicy) -> StakePlan {
    let mut shares = BTreeMap::new();
    let mut overlapping = BTreeSet::new();

    for (_, category) in policy.iter() {
        for &(target, subnet_pct) in &category.subnets {
            let share = category.total_percentage * subnet_pct / 100.0;
            match shares.entry(target) {
                Entry::Vacant(slot) => {
                    slot.insert(share);
                }
                Entry::Occupied(mut slot) => {
                    overlapping.insert(target);
                    match overlap {
                        OverlapPolicy::Overwrite => *slot.get_mut() = share,
                        OverlapPolicy::Sum => *slot.get_mut() += share,
                    }
                }
            }
        }
    }

    shares.retain(|_, share| *share > 0.0);
    StakePlan {
        shares,
        overlapping,
    }
}

/// Amount for one target: `budget × pct / 100`.
pub fn amount_for_share(budget: f64, pct: f64) -> f64 {
    budget * (pct / 100.0)
}

impl StakePlan {
    /// Share for `target`, if it is in the plan.
    pub fn get(&self, target: SubnetId) -> Option<f64> {
        self.shares.get(&target).copied()
    }

    pub fn len(&self) -> usize {
        self.shares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }

    /// `(target, share)` pairs. Callers must not depend on the order.
    pub fn iter(&self) -> impl Iterator<Item = (SubnetId, f64)> + '_ {
        self.shares.iter().map(|(id, pct)| (*id, *pct))
    }

    /// Sum of all shares.
    pub fn total_percentage(&self) -> f64 {
        self.shares.values().sum()
    }

    /// Per-target amounts for a given budget.
    pub fn amounts(&self, budget: f64) -> BTreeMap<SubnetId, f64> {
        self.iter()
            .map(|(id, pct)| (id, amount_for_share(budget, pct)))
            .collect()
    }

    /// Subnets that appeared in more than one category.
    pub fn overlapping_targets(&self) -> impl Iterator<Item = SubnetId> + '_ {
        self.overlapping.iter().copied()
    }
}

impl FromIterator<(SubnetId, f64)> for StakePlan {
    fn from_iter<I: IntoIterator<Item = (SubnetId, f64)>>(iter: I) -> Self {
        Self {
            shares: iter.into_iter().collect(),
            overlapping: BTreeSet::new(),
        }
    }
}
