//! # dca-core — Allocation Policy, Validation, and Plan Compilation
//!
//! Foundational crate for the stake DCA daemon. Everything here is pure
//! and synchronous; async collaborators live in `dca-ledger` and the cycle
//! engine lives in `dca-engine`.
//!
//! ## Data Flow
//!
//! ```text
//! YamlConfigFile ──load──▶ RawConfig ──validate_config──▶ ValidatedConfig
//!                                                            │
//!                                            plan::compile(&allocation)
//!                                                            ▼
//!                                                        StakePlan
//! ```
//!
//! ## Modules
//!
//! - [`model`] — typed configuration sections, `SubnetId`, `Balance`.
//! - [`validate`] — the rule checks; each returns the typed value it checked.
//! - [`plan`] — flattening of categories into a per-subnet share map.
//! - [`config`] — the raw document and its file-backed source.
//! - [`error`] — `ValidationError` and the process-level `DcaError`.

pub mod config;
pub mod error;
pub mod model;
pub mod plan;
pub mod validate;

pub use config::{load_validated, ConfigSource, RawConfig, YamlConfigFile};
pub use error::{DcaError, ValidationError};
pub use model::{
    AllocationPolicy, Balance, CategoryAllocation, DelegateKey, LedgerSettings, Network,
    StakingParameters, SubnetId, ValidatedConfig, WalletSpec, MIN_AMOUNT_PER_CYCLE,
    MIN_INTERVAL_SECS, RAO_PER_TAO,
};
pub use plan::{amount_for_share, compile, compile_with, OverlapPolicy, StakePlan};
pub use validate::{
    collect_errors, validate_allocation, validate_config, validate_ledger, validate_network,
    validate_staking_params, validate_wallet,
};
