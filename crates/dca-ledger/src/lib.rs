//! # dca-ledger — Wallet and Ledger Collaborators
//!
//! The async boundary between the cycle engine and the outside world.
//!
//! - [`traits::WalletHandle`] unlocks the staking identity and reads balances.
//! - [`traits::LedgerClient`] submits one stake per call.
//! - [`http::HttpLedgerClient`] implements both against a staking gateway.
//! - [`dry_run::DryRunLedger`] implements both in process.
//!
//! Errors are split by side: [`WalletError`] for key custody,
//! [`LedgerError`] for submission.

pub mod dry_run;
pub mod error;
pub mod http;
pub mod retry;
pub mod traits;

pub use dry_run::{DryRunLedger, DRY_RUN_ADDRESS};
pub use error::{LedgerError, WalletError};
pub use http::{GatewayConfig, HttpLedgerClient};
pub use retry::Backoff;
pub use traits::{LedgerClient, StakeRequest, WalletHandle};
