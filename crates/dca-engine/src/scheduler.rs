//! # Scheduler
//!
//! Drives an unbounded sequence of cycles at a fixed interval.
//!
//! ## State Machine
//!
//! ```text
//! Idle ──▶ Running{1} ──▶ Sleeping{1} ──▶ Running{2} ──▶ Sleeping{2} ──▶ …
//!              │                │              │
//!              └────────────────┴──────────────┴──▶ Stopped (on shutdown)
//! ```
//!
//! Each `Running` step queries the available balance, then either executes
//! the plan with `amount_per_cycle` or skips the cycle when the balance is
//! short. A failed balance query is reported and treated like a skip.
//!
//! Shutdown is honoured at the balance query and during the interval sleep.
//! A cycle whose dispatches are already in flight runs to completion; the
//! scheduler stops at the next suspension point.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use dca_core::{Balance, StakePlan, StakingParameters};
use dca_ledger::WalletHandle;

use crate::executor::{CycleExecutor, CycleSummary};
use crate::shutdown::ShutdownSignal;

/// Where the scheduler is in its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SchedulerState {
    /// Constructed, no cycle started.
    Idle,
    /// About to run cycle `cycle`.
    Running { cycle: u64 },
    /// Cycle `cycle` finished; waiting out the interval.
    Sleeping { cycle: u64 },
    /// Terminal.
    Stopped,
}

impl SchedulerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running { .. } => "running",
            Self::Sleeping { .. } => "sleeping",
            Self::Stopped => "stopped",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped)
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running { cycle } | Self::Sleeping { cycle } => {
                write!(f, "{}({cycle})", self.as_str())
            }
            _ => f.write_str(self.as_str()),
        }
    }
}

/// What a `Running` step did.
#[derive(Debug, Clone)]
pub enum CycleReport {
    /// The plan was dispatched.
    Executed(CycleSummary),
    /// Available balance was below the per-cycle amount.
    Skipped {
        cycle: u64,
        available: Balance,
        required: Balance,
    },
    /// The balance query failed; nothing was dispatched.
    BalanceUnavailable { cycle: u64, reason: String },
}

impl CycleReport {
    pub fn cycle(&self) -> u64 {
        match self {
            Self::Executed(summary) => summary.cycle,
            Self::Skipped { cycle, .. } | Self::BalanceUnavailable { cycle, .. } => *cycle,
        }
    }

    pub fn summary(&self) -> Option<&CycleSummary> {
        match self {
            Self::Executed(summary) => Some(summary),
            _ => None,
        }
    }
}

/// Running totals over a scheduler's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SchedulerStats {
    pub cycles_executed: u64,
    pub cycles_skipped: u64,
    pub submissions_succeeded: u64,
    pub submissions_failed: u64,
}

impl SchedulerStats {
    fn record(&mut self, report: &CycleReport) {
        match report {
            CycleReport::Executed(summary) => {
                self.cycles_executed += 1;
                self.submissions_succeeded += summary.succeeded() as u64;
                self.submissions_failed += summary.failed() as u64;
            }
            CycleReport::Skipped { .. } | CycleReport::BalanceUnavailable { .. } => {
                self.cycles_skipped += 1;
            }
        }
    }
}

/// The DCA loop. Owns the compiled plan for the lifetime of one
/// configuration load.
pub struct Scheduler {
    staking: StakingParameters,
    plan: StakePlan,
    wallet: Arc<dyn WalletHandle>,
    executor: CycleExecutor,
    shutdown: ShutdownSignal,
    state: SchedulerState,
    stats: SchedulerStats,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("state", &self.state)
            .field("targets", &self.plan.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    pub fn new(
        staking: StakingParameters,
        plan: StakePlan,
        wallet: Arc<dyn WalletHandle>,
        executor: CycleExecutor,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            staking,
            plan,
            wallet,
            executor,
            shutdown,
            state: SchedulerState::Idle,
            stats: SchedulerStats::default(),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    pub fn plan(&self) -> &StakePlan {
        &self.plan
    }

    /// Perform one transition. Returns a report when a `Running` step
    /// completed a cycle (executed or skipped).
    pub async fn step(&mut self) -> Option<CycleReport> {
        match self.state {
            SchedulerState::Idle => {
                self.state = if self.shutdown.is_triggered() {
                    SchedulerState::Stopped
                } else {
                    SchedulerState::Running { cycle: 1 }
                };
                None
            }
            SchedulerState::Running { cycle } => {
                let report = self.run_one(cycle).await;
                if let Some(report) = &report {
                    self.stats.record(report);
                    log_report(report);
                    self.state = SchedulerState::Sleeping { cycle };
                } else {
                    self.state = SchedulerState::Stopped;
                }
                report
            }
            SchedulerState::Sleeping { cycle } => {
                let interval = self.staking.interval();
                tracing::debug!(cycle, ?interval, "sleeping until next cycle");
                tokio::select! {
                    biased;
                    _ = self.shutdown.cancelled() => {
                        self.state = SchedulerState::Stopped;
                    }
                    _ = tokio::time::sleep(interval) => {
                        self.state = SchedulerState::Running { cycle: cycle + 1 };
                    }
                }
                None
            }
            SchedulerState::Stopped => None,
        }
    }

    /// Step until `Stopped`, then return the accumulated stats.
    pub async fn run(mut self) -> SchedulerStats {
        tracing::info!(
            targets = self.plan.len(),
            amount_per_cycle = self.staking.amount_per_cycle,
            interval_secs = self.staking.interval_secs,
            "scheduler started"
        );
        while !self.state.is_terminal() {
            self.step().await;
        }
        tracing::info!(
            cycles_executed = self.stats.cycles_executed,
            cycles_skipped = self.stats.cycles_skipped,
            "scheduler stopped"
        );
        self.stats
    }

    /// Balance check plus dispatch. `None` means shutdown won the race
    /// against the balance query.
    async fn run_one(&mut self, cycle: u64) -> Option<CycleReport> {
        let balance = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => return None,
            balance = self.wallet.available_balance() => balance,
        };

        let required = Balance::from_tao(self.staking.amount_per_cycle);
        let available = match balance {
            Ok(available) => available,
            Err(e) => {
                return Some(CycleReport::BalanceUnavailable {
                    cycle,
                    reason: e.to_string(),
                })
            }
        };
        if available < required {
            return Some(CycleReport::Skipped {
                cycle,
                available,
                required,
            });
        }

        let summary = self
            .executor
            .run_cycle(cycle, &self.plan, self.staking.amount_per_cycle, &self.staking.delegate)
            .await;
        Some(CycleReport::Executed(summary))
    }
}

fn log_report(report: &CycleReport) {
    match report {
        CycleReport::Executed(summary) => tracing::info!(
            cycle = summary.cycle,
            succeeded = summary.succeeded(),
            attempted = summary.attempted(),
            staked = summary.staked_amount(),
            "cycle complete: {}/{} stakes succeeded",
            summary.succeeded(),
            summary.attempted()
        ),
        CycleReport::Skipped {
            cycle,
            available,
            required,
        } => tracing::warn!(
            cycle,
            %available,
            %required,
            "insufficient balance, skipping cycle"
        ),
        CycleReport::BalanceUnavailable { cycle, reason } => {
            tracing::error!(cycle, "balance query failed, skipping cycle: {reason}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shutdown::Shutdown;
    use dca_core::{DelegateKey, SubnetId};
    use dca_ledger::DryRunLedger;
    use std::time::Duration;

    fn staking(amount: f64) -> StakingParameters {
        StakingParameters {
            delegate: DelegateKey::new("5Fdelegate"),
            amount_per_cycle: amount,
            interval_secs: 300,
        }
    }

    fn scheduler(ledger: &Arc<DryRunLedger>, amount: f64, signal: ShutdownSignal) -> Scheduler {
        let plan: StakePlan = [(SubnetId::new(1), 60.0), (SubnetId::new(2), 40.0)]
            .into_iter()
            .collect();
        Scheduler::new(
            staking(amount),
            plan,
            ledger.clone(),
            CycleExecutor::new(ledger.clone()),
            signal,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn steps_through_idle_running_sleeping() {
        let ledger = Arc::new(DryRunLedger::new(Balance::from_tao(10.0)));
        let mut s = scheduler(&ledger, 1.0, ShutdownSignal::never());

        assert_eq!(s.state(), SchedulerState::Idle);
        assert!(s.step().await.is_none());
        assert_eq!(s.state(), SchedulerState::Running { cycle: 1 });

        let report = s.step().await.expect("cycle report");
        assert_eq!(report.summary().map(CycleSummary::succeeded), Some(2));
        assert_eq!(s.state(), SchedulerState::Sleeping { cycle: 1 });

        assert!(s.step().await.is_none());
        assert_eq!(s.state(), SchedulerState::Running { cycle: 2 });
        assert_eq!(s.stats().cycles_executed, 1);
        assert_eq!(s.stats().submissions_succeeded, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn low_balance_skips_and_keeps_going() {
        let ledger = Arc::new(DryRunLedger::new(Balance::from_tao(0.5)));
        let mut s = scheduler(&ledger, 1.0, ShutdownSignal::never());

        s.step().await;
        let report = s.step().await.expect("cycle report");
        match report {
            CycleReport::Skipped {
                cycle,
                available,
                required,
            } => {
                assert_eq!(cycle, 1);
                assert_eq!(available, Balance::from_tao(0.5));
                assert_eq!(required, Balance::from_tao(1.0));
            }
            other => panic!("expected skip, got {other:?}"),
        }
        assert!(ledger.submissions().is_empty());
        assert_eq!(s.state(), SchedulerState::Sleeping { cycle: 1 });

        s.step().await;
        assert_eq!(s.state(), SchedulerState::Running { cycle: 2 });
        assert_eq!(s.stats().cycles_skipped, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exact_balance_is_enough() {
        let ledger = Arc::new(DryRunLedger::new(Balance::from_tao(1.0)));
        let mut s = scheduler(&ledger, 1.0, ShutdownSignal::never());
        s.step().await;
        assert!(matches!(s.step().await, Some(CycleReport::Executed(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn balance_failure_is_reported_not_fatal() {
        let ledger = Arc::new(DryRunLedger::new(Balance::from_tao(10.0)));
        ledger.fail_balance_queries(Some("rpc down"));
        let mut s = scheduler(&ledger, 1.0, ShutdownSignal::never());

        s.step().await;
        match s.step().await {
            Some(CycleReport::BalanceUnavailable { reason, .. }) => assert!(reason.contains("rpc down")),
            other => panic!("expected BalanceUnavailable, got {other:?}"),
        }
        assert_eq!(s.state(), SchedulerState::Sleeping { cycle: 1 });
        assert!(ledger.submissions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_during_sleep_stops_before_next_cycle() {
        let ledger = Arc::new(DryRunLedger::new(Balance::from_tao(10.0)));
        let (shutdown, signal) = Shutdown::new();
        let mut s = scheduler(&ledger, 1.0, signal);

        s.step().await;
        s.step().await;
        assert_eq!(s.state(), SchedulerState::Sleeping { cycle: 1 });
        let queries_before = ledger.balance_queries();

        let trigger = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            shutdown.trigger();
        });
        s.step().await;
        trigger.await.unwrap();

        assert_eq!(s.state(), SchedulerState::Stopped);
        assert_eq!(ledger.balance_queries(), queries_before);
        assert_eq!(ledger.submissions().len(), 2);
        assert!(s.step().await.is_none());
        assert_eq!(s.state(), SchedulerState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_before_start_runs_nothing() {
        let ledger = Arc::new(DryRunLedger::new(Balance::from_tao(10.0)));
        let (shutdown, signal) = Shutdown::new();
        shutdown.trigger();

        let stats = scheduler(&ledger, 1.0, signal).run().await;
        assert_eq!(stats, SchedulerStats::default());
        assert_eq!(ledger.balance_queries(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn run_loops_until_cancelled() {
        let ledger = Arc::new(DryRunLedger::new(Balance::from_tao(100.0)));
        let (shutdown, signal) = Shutdown::new();
        let s = scheduler(&ledger, 1.0, signal);

        let handle = tokio::spawn(s.run());
        // Three cycles at t=0, 300, 600; stop during the third sleep.
        tokio::time::sleep(Duration::from_secs(700)).await;
        shutdown.trigger();
        let stats = handle.await.unwrap();

        assert_eq!(stats.cycles_executed, 3);
        assert_eq!(stats.submissions_succeeded, 6);
        assert_eq!(ledger.submissions().len(), 6);
    }

    #[test]
    fn state_display() {
        assert_eq!(SchedulerState::Running { cycle: 4 }.to_string(), "running(4)");
        assert_eq!(SchedulerState::Stopped.to_string(), "stopped");
        assert!(SchedulerState::Stopped.is_terminal());
        assert!(!SchedulerState::Idle.is_terminal());
    }
}
