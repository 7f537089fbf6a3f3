//! # Cycle Executor
//!
//! Runs one cycle: turns a [`StakePlan`] and a budget into per-target
//! amounts and dispatches one stake per target concurrently.
//!
//! Each dispatch runs on its own spawned task. The executor awaits every
//! handle before returning, so a failing or panicking target never cancels
//! its siblings, and every outcome stays tied to its target regardless of
//! completion order. Spawned dispatches keep running if the cycle future is
//! dropped; a transfer already handed to the ledger is never aborted.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use dca_core::{amount_for_share, DcaError, DelegateKey, StakePlan, SubnetId};
use dca_ledger::{LedgerClient, LedgerError, StakeRequest};
use tokio::task::{JoinError, JoinHandle};

/// Result of one target's dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleOutcome {
    pub target: SubnetId,
    pub requested_amount: f64,
    pub succeeded: bool,
    pub error: Option<String>,
}

impl CycleOutcome {
    fn accepted(target: SubnetId, requested_amount: f64) -> Self {
        Self {
            target,
            requested_amount,
            succeeded: true,
            error: None,
        }
    }

    fn failed(target: SubnetId, requested_amount: f64, reason: String) -> Self {
        let error = DcaError::LedgerSubmission { target, reason }.to_string();
        Self {
            target,
            requested_amount,
            succeeded: false,
            error: Some(error),
        }
    }
}

/// Aggregate of one cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleSummary {
    /// One-based cycle number.
    pub cycle: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// One entry per plan target, in plan iteration order.
    pub outcomes: Vec<CycleOutcome>,
}

impl CycleSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded).count()
    }

    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failed(&self) -> usize {
        self.attempted() - self.succeeded()
    }

    /// Outcome for `target`, if it was part of the cycle.
    pub fn outcome(&self, target: SubnetId) -> Option<&CycleOutcome> {
        self.outcomes.iter().find(|o| o.target == target)
    }

    /// Sum of amounts the ledger accepted.
    pub fn staked_amount(&self) -> f64 {
        self.outcomes
            .iter()
            .filter(|o| o.succeeded)
            .map(|o| o.requested_amount)
            .sum()
    }
}

/// Dispatches plan targets to a ledger.
#[derive(Clone)]
pub struct CycleExecutor {
    ledger: Arc<dyn LedgerClient>,
}

impl std::fmt::Debug for CycleExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CycleExecutor")
            .field("ledger", &self.ledger.name())
            .finish()
    }
}

impl CycleExecutor {
    pub fn new(ledger: Arc<dyn LedgerClient>) -> Self {
        Self { ledger }
    }

    /// Dispatch every target of `plan` with `budget × share / 100` and wait
    /// for all of them. Never fails: per-target errors land in the outcomes.
    pub async fn run_cycle(
        &self,
        cycle: u64,
        plan: &StakePlan,
        budget: f64,
        delegate: &DelegateKey,
    ) -> CycleSummary {
        let started_at = Utc::now();

        let dispatches: Vec<(SubnetId, f64, JoinHandle<Result<bool, LedgerError>>)> = plan
            .iter()
            .map(|(target, share)| {
                let amount = amount_for_share(budget, share);
                let request = StakeRequest::fire_and_forget(delegate.clone(), target, amount);
                let ledger = Arc::clone(&self.ledger);
                let handle = tokio::spawn(async move { ledger.submit_stake(&request).await });
                (target, amount, handle)
            })
            .collect();

        let mut outcomes = Vec::with_capacity(dispatches.len());
        for (target, amount, handle) in dispatches {
            let outcome = match handle.await {
                Ok(Ok(true)) => CycleOutcome::accepted(target, amount),
                Ok(Ok(false)) => {
                    CycleOutcome::failed(target, amount, "ledger declined the request".into())
                }
                Ok(Err(e)) => CycleOutcome::failed(target, amount, e.to_string()),
                Err(e) => CycleOutcome::failed(target, amount, join_failure(&e)),
            };

            match &outcome.error {
                None => tracing::debug!(cycle, target_subnet = %target, amount, "stake accepted"),
                Some(error) => tracing::warn!(cycle, target_subnet = %target, amount, "{error}"),
            }
            outcomes.push(outcome);
        }

        CycleSummary {
            cycle,
            started_at,
            finished_at: Utc::now(),
            outcomes,
        }
    }
}

fn join_failure(e: &JoinError) -> String {
    if e.is_panic() {
        "dispatch task panicked".into()
    } else {
        "dispatch task was cancelled".into()
    }
}
