//! # Error Types — Structured Error Hierarchy
//!
//! Two layers:
//!
//! - [`ValidationError`] — one variant per allocation/staking rule. Every
//!   validator in [`crate::validate`] returns it, so callers branch on the
//!   variant rather than on message text.
//! - [`DcaError`] — the process-level taxonomy. `ConfigNotFound`,
//!   `ConfigParse`, and `InvalidConfig` are startup-fatal; `WalletAccess`
//!   is fatal during the initial unlock; `LedgerSubmission` is recorded
//!   per target and never aborts a cycle.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::{Network, SubnetId};

/// A single violated configuration rule.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Network name is not on the allow-list.
    #[error("invalid network '{network}': must be one of: {}", Network::ALLOWED.join(", "))]
    UnknownNetwork {
        /// The rejected network name.
        network: String,
    },

    /// A required field is absent.
    #[error("missing required field '{field}' in {section}")]
    MissingField {
        /// Section the field belongs to (e.g. `staking`, `allocation.growth`).
        section: String,
        /// Name of the absent field.
        field: String,
    },

    /// A field is present but holds the wrong kind of value.
    #[error("invalid type for '{field}' in {section}: expected {expected}")]
    WrongType {
        /// Section the field belongs to.
        section: String,
        /// Name of the offending field.
        field: String,
        /// Human-readable description of the expected kind.
        expected: &'static str,
    },

    /// A string field is present but empty.
    #[error("'{field}' in {section} must not be empty")]
    EmptyValue {
        /// Section the field belongs to.
        section: String,
        /// Name of the empty field.
        field: String,
    },

    /// A numeric field is below its floor.
    #[error("{field} must be at least {minimum} {unit}, got {actual}")]
    BelowMinimum {
        /// Dotted field path.
        field: &'static str,
        /// Inclusive lower bound.
        minimum: f64,
        /// Observed value.
        actual: f64,
        /// Unit label for the message.
        unit: &'static str,
    },

    /// A section or category that must be a mapping is not one.
    #[error("{section} must be a mapping")]
    NotAMapping {
        /// Description of the offending section.
        section: String,
    },

    /// A subnet key is not an integer in the `u16` range.
    #[error("invalid subnet id '{key}' in {category}: expected an integer between 0 and 65535")]
    InvalidSubnetId {
        /// Category containing the key.
        category: String,
        /// The rejected key, rendered as text.
        key: String,
    },

    /// Two keys in one category name the same subnet (`1` and `'1'`, or `1` and `01`).
    #[error("subnet {id} is listed more than once in {category}")]
    DuplicateSubnet {
        /// Category containing the repeated id.
        category: String,
        /// The repeated subnet id.
        id: SubnetId,
    },

    /// A percentage is negative.
    #[error("percentage for {field} in {category} must not be negative, got {value}")]
    NegativePercentage {
        /// Category containing the value.
        category: String,
        /// `total_percentage` or `subnet <id>`.
        field: String,
        /// Observed value.
        value: f64,
    },

    /// A category with a positive share lists no subnets.
    #[error("subnets in {category} must not be empty when total_percentage is {total}%")]
    EmptySubnets {
        /// Offending category.
        category: String,
        /// The category's total_percentage.
        total: f64,
    },

    /// Subnet shares inside a category do not sum to 100 (±0.01).
    #[error("subnet percentages in {category} must sum to 100%, but they sum to {sum}%")]
    SubnetSumMismatch {
        /// Offending category.
        category: String,
        /// Observed sum.
        sum: f64,
    },

    /// Category totals do not sum to exactly 100.
    #[error("total allocation percentage must be 100%, got {total}%")]
    TotalMismatch {
        /// Observed grand total.
        total: f64,
    },

    /// The ledger endpoint is not a usable http(s) URL.
    #[error("invalid ledger endpoint '{endpoint}': {reason}")]
    InvalidEndpoint {
        /// The rejected endpoint text.
        endpoint: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Top-level error type for the stake DCA daemon.
#[derive(Error, Debug)]
pub enum DcaError {
    /// The configuration file does not exist.
    #[error("configuration file not found: {}", path.display())]
    ConfigNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The configuration file exists but could not be read.
    #[error("failed to read configuration file {}: {source}", path.display())]
    ConfigRead {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML.
    #[error("error parsing configuration file {}: {reason}", path.display())]
    ConfigParse {
        /// Path that was parsed.
        path: PathBuf,
        /// Parser diagnostic.
        reason: String,
    },

    /// The configuration file could not be written.
    #[error("failed to write configuration file {}: {source}", path.display())]
    ConfigWrite {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// The in-memory document could not be rendered as YAML.
    #[error("failed to serialize configuration for {}: {reason}", path.display())]
    ConfigSerialize {
        /// Destination path.
        path: PathBuf,
        /// Serializer diagnostic.
        reason: String,
    },

    /// A configuration rule was violated.
    #[error("configuration validation error: {0}")]
    InvalidConfig(#[from] ValidationError),

    /// The wallet could not be unlocked or queried.
    #[error("failed to access wallet: {0}")]
    WalletAccess(String),

    /// A stake submission for one target failed.
    #[error("stake submission to subnet {target} failed: {reason}")]
    LedgerSubmission {
        /// Target subnet.
        target: SubnetId,
        /// Failure description.
        reason: String,
    },
}

impl DcaError {
    /// Whether this error must stop the process before the scheduler starts.
    pub fn is_startup_fatal(&self) -> bool {
        !matches!(self, Self::LedgerSubmission { .. })
    }
}
