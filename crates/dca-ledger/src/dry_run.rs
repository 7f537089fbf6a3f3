//! In-process ledger for `--dry-run` and tests.
//!
//! `DryRunLedger` implements both collaborator traits without touching a
//! network. Accepted stakes are recorded and deducted from the simulated
//! balance, so a long dry run eventually exercises the low-balance skip.
//! Failures are scripted per target.

use std::collections::BTreeSet;

use async_trait::async_trait;
use parking_lot::Mutex;

use dca_core::{Balance, SubnetId};

use crate::error::{LedgerError, WalletError};
use crate::traits::{LedgerClient, StakeRequest, WalletHandle};

/// Address reported by an unlocked dry-run wallet.
pub const DRY_RUN_ADDRESS: &str = "dry-run-coldkey";

#[derive(Debug, Default)]
struct DryRunState {
    balance: Balance,
    locked: bool,
    unlocked: bool,
    balance_failure: Option<String>,
    failing: BTreeSet<SubnetId>,
    declined: BTreeSet<SubnetId>,
    submissions: Vec<StakeRequest>,
    balance_queries: u64,
}

/// Simulated wallet and ledger.
#[derive(Debug, Default)]
pub struct DryRunLedger {
    state: Mutex<DryRunState>,
}

impl DryRunLedger {
    /// An unlocked wallet holding `balance`.
    pub fn new(balance: Balance) -> Self {
        Self {
            state: Mutex::new(DryRunState {
                balance,
                unlocked: true,
                ..DryRunState::default()
            }),
        }
    }

    /// A wallet whose `unlock()` always fails.
    pub fn locked() -> Self {
        Self {
            state: Mutex::new(DryRunState {
                locked: true,
                ..DryRunState::default()
            }),
        }
    }

    pub fn set_balance(&self, balance: Balance) {
        self.state.lock().balance = balance;
    }

    pub fn balance(&self) -> Balance {
        self.state.lock().balance
    }

    /// Make every submission to `target` fail with [`LedgerError::Rejected`].
    pub fn fail_target(&self, target: SubnetId) {
        self.state.lock().failing.insert(target);
    }

    /// Make every submission to `target` return `Ok(false)`.
    pub fn decline_target(&self, target: SubnetId) {
        self.state.lock().declined.insert(target);
    }

    /// Make balance queries fail with `reason` until cleared with `None`.
    pub fn fail_balance_queries(&self, reason: Option<&str>) {
        self.state.lock().balance_failure = reason.map(str::to_string);
    }

    /// Every accepted request, in submission order.
    pub fn submissions(&self) -> Vec<StakeRequest> {
        self.state.lock().submissions.clone()
    }

    pub fn balance_queries(&self) -> u64 {
        self.state.lock().balance_queries
    }
}

#[async_trait]
impl WalletHandle for DryRunLedger {
    async fn unlock(&self) -> Result<(), WalletError> {
        let mut state = self.state.lock();
        if state.locked {
            return Err(WalletError::UnlockFailed {
                wallet: "dry-run".into(),
                reason: "wallet is locked".into(),
            });
        }
        state.unlocked = true;
        Ok(())
    }

    fn address(&self) -> Option<String> {
        self.state.lock().unlocked.then(|| DRY_RUN_ADDRESS.to_string())
    }

    async fn get_balance(&self, address: &str) -> Result<Balance, WalletError> {
        let mut state = self.state.lock();
        state.balance_queries += 1;
        match &state.balance_failure {
            Some(reason) => Err(WalletError::BalanceUnavailable {
                address: address.to_string(),
                reason: reason.clone(),
            }),
            None => Ok(state.balance),
        }
    }
}

#[async_trait]
impl LedgerClient for DryRunLedger {
    async fn submit_stake(&self, request: &StakeRequest) -> Result<bool, LedgerError> {
        let mut state = self.state.lock();
        if state.failing.contains(&request.target) {
            return Err(LedgerError::Rejected {
                target: request.target,
                reason: "scripted failure".into(),
            });
        }
        if state.declined.contains(&request.target) {
            return Ok(false);
        }

        state.balance = state.balance.saturating_sub(request.balance());
        state.submissions.push(request.clone());
        tracing::info!(
            target_subnet = %request.target,
            amount = request.amount,
            delegate = %request.delegate,
            "dry run: stake recorded"
        );
        Ok(true)
    }

    fn name(&self) -> &str {
        "dry-run"
    }
}
