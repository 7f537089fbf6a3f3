//! # Collaborator Traits
//!
//! The two contracts the cycle engine depends on. Implementations must be
//! `Send + Sync` so one handle can be shared behind an `Arc` by every
//! per-target dispatch task in a cycle. Both traits are object-safe so the
//! binary can pick the HTTP gateway or the dry-run ledger at runtime.

use async_trait::async_trait;
use serde::Serialize;

use dca_core::{Balance, DelegateKey, SubnetId};

use crate::error::{LedgerError, WalletError};

/// One staking transfer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StakeRequest {
    /// Delegate that receives the stake.
    pub delegate: DelegateKey,
    /// Target subnet.
    pub target: SubnetId,
    /// Amount in TAO.
    pub amount: f64,
    /// Block until the transfer is included in a block.
    pub wait_for_inclusion: bool,
    /// Block until the transfer is finalized.
    pub wait_for_finalization: bool,
}

impl StakeRequest {
    /// A request that returns as soon as the ledger accepts it.
    pub fn fire_and_forget(delegate: DelegateKey, target: SubnetId, amount: f64) -> Self {
        Self {
            delegate,
            target,
            amount,
            wait_for_inclusion: false,
            wait_for_finalization: false,
        }
    }

    /// The amount converted to rao.
    pub fn balance(&self) -> Balance {
        Balance::from_tao(self.amount)
    }
}

/// Key custody: unlocking the staking identity and reading its balance.
///
/// The handle is read-only from the engine's point of view; concurrent
/// dispatches never mutate it.
#[async_trait]
pub trait WalletHandle: Send + Sync {
    /// Unlock the wallet. A failure here is fatal at startup.
    async fn unlock(&self) -> Result<(), WalletError>;

    /// Coldkey address, available once [`unlock`](Self::unlock) succeeded.
    fn address(&self) -> Option<String>;

    /// Free balance of `address`.
    async fn get_balance(&self, address: &str) -> Result<Balance, WalletError>;

    /// Free balance of this wallet's own address.
    async fn available_balance(&self) -> Result<Balance, WalletError> {
        let address = self.address().ok_or(WalletError::Locked)?;
        self.get_balance(&address).await
    }
}

/// Ledger submission.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Submit one stake. `Ok(true)` means the ledger accepted the request;
    /// `Ok(false)` means it declined without an error. Inclusion and
    /// finalization are not awaited unless the request asks for them.
    async fn submit_stake(&self, request: &StakeRequest) -> Result<bool, LedgerError>;

    /// Human-readable implementation name for logs.
    fn name(&self) -> &str;
}
