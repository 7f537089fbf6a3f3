//! Wallet and ledger error types.

use dca_core::{DcaError, SubnetId};

/// Errors from the key-custody side: unlocking and balance queries.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    /// The wallet could not be unlocked.
    #[error("wallet '{wallet}' could not be unlocked: {reason}")]
    UnlockFailed {
        /// Wallet name.
        wallet: String,
        /// Human-readable cause.
        reason: String,
    },

    /// An operation needed the coldkey address before `unlock()` succeeded.
    #[error("wallet is locked")]
    Locked,

    /// The balance query failed.
    #[error("balance query for {address} failed: {reason}")]
    BalanceUnavailable {
        /// Queried address.
        address: String,
        /// Human-readable cause.
        reason: String,
    },
}

/// Errors from stake submission.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The gateway is unreachable or returned a 5xx status.
    #[error("ledger gateway unavailable: {reason}")]
    Unavailable {
        /// Human-readable cause.
        reason: String,
    },

    /// The request timed out.
    #[error("ledger request timed out after {elapsed_ms}ms")]
    Timeout {
        /// Configured timeout.
        elapsed_ms: u64,
    },

    /// The gateway refused the submission.
    #[error("stake to subnet {target} rejected: {reason}")]
    Rejected {
        /// Target subnet.
        target: SubnetId,
        /// Rejection reason reported by the gateway.
        reason: String,
    },

    /// The gateway answered with a body that could not be decoded.
    #[error("malformed ledger response: {reason}")]
    Deserialization {
        /// Decoder diagnostic.
        reason: String,
    },

    /// The client could not be built from its configuration.
    #[error("ledger client not configured: {reason}")]
    NotConfigured {
        /// Why configuration is unusable.
        reason: String,
    },
}

impl From<WalletError> for DcaError {
    fn from(err: WalletError) -> Self {
        DcaError::WalletAccess(err.to_string())
    }
}
