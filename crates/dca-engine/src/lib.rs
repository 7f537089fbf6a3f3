//! # dca-engine — Cycle Execution and Scheduling
//!
//! - [`executor::CycleExecutor`] fans one cycle out to the ledger, one task
//!   per target, and joins every outcome.
//! - [`scheduler::Scheduler`] is the explicit `Idle → Running → Sleeping →
//!   Stopped` loop around it.
//! - [`shutdown`] carries the cancellation signal into the scheduler.
//!
//! The engine takes a validated configuration's pieces at construction and
//! holds no global state.

pub mod executor;
pub mod scheduler;
pub mod shutdown;

pub use executor::{CycleExecutor, CycleOutcome, CycleSummary};
pub use scheduler::{CycleReport, Scheduler, SchedulerState, SchedulerStats};
pub use shutdown::{Shutdown, ShutdownSignal};
