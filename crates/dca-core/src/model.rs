//! # Domain Model
//!
//! Typed values produced by the validators in [`crate::validate`]. Nothing
//! here is constructed from raw configuration directly; a value of these
//! types has already passed its rule checks.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

/// Smallest accepted per-cycle budget, in TAO.
pub const MIN_AMOUNT_PER_CYCLE: f64 = 0.001;

/// Shortest accepted interval between cycles, in seconds.
pub const MIN_INTERVAL_SECS: u64 = 300;

/// Number of rao in one TAO.
pub const RAO_PER_TAO: u64 = 1_000_000_000;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Integer identifier of a staking target (a subnet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubnetId(u16);

impl SubnetId {
    /// Wrap a raw subnet number.
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// The raw subnet number.
    pub const fn get(self) -> u16 {
        self.0
    }
}

impl From<u16> for SubnetId {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

impl fmt::Display for SubnetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier of the delegate that receives the stake.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DelegateKey(String);

impl DelegateKey {
    /// Wrap a delegate key. Emptiness is checked by the staking validator.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The key as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DelegateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Known ledger networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// The public main network.
    Finney,
    /// A locally running development chain.
    Local,
}

impl Network {
    /// Allow-list of accepted network names, in display order.
    pub const ALLOWED: [&'static str; 2] = ["finney", "local"];

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Finney => "finney",
            Self::Local => "local",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Amounts
// ---------------------------------------------------------------------------

/// An on-ledger amount in rao.
///
/// Cycle arithmetic runs in TAO as `f64`; conversion to rao happens once,
/// at the wire boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Balance(u64);

impl Balance {
    /// Construct from a raw rao count.
    pub const fn from_rao(rao: u64) -> Self {
        Self(rao)
    }

    /// Convert a TAO amount, rounding to the nearest rao. Negative and
    /// non-finite inputs saturate to zero.
    pub fn from_tao(tao: f64) -> Self {
        let rao = (tao * RAO_PER_TAO as f64).round();
        if rao.is_finite() && rao > 0.0 {
            Self(rao as u64)
        } else {
            Self(0)
        }
    }

    /// Raw rao count.
    pub const fn as_rao(self) -> u64 {
        self.0
    }

    /// Amount in TAO.
    pub fn as_tao(self) -> f64 {
        self.0 as f64 / RAO_PER_TAO as f64
    }

    pub const fn saturating_sub(self, other: Balance) -> Balance {
        Self(self.0.saturating_sub(other.0))
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.9} TAO", self.as_tao())
    }
}

// ---------------------------------------------------------------------------
// Configuration sections
// ---------------------------------------------------------------------------

/// The `wallet` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSpec {
    /// Wallet name known to the key-custody service.
    pub name: String,
}

/// The `staking` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakingParameters {
    /// Delegate receiving every stake.
    pub delegate: DelegateKey,
    /// Budget spent per cycle, in TAO. At least [`MIN_AMOUNT_PER_CYCLE`].
    pub amount_per_cycle: f64,
    /// Seconds between cycles. At least [`MIN_INTERVAL_SECS`].
    pub interval_secs: u64,
}

impl StakingParameters {
    /// Interval between cycles.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// One category of the allocation policy.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryAllocation {
    /// Free-form description shown in summaries.
    pub description: String,
    /// Share of the whole budget assigned to this category, 0-100.
    pub total_percentage: f64,
    /// Per-subnet shares within the category, in document order.
    pub subnets: Vec<(SubnetId, f64)>,
}

impl CategoryAllocation {
    /// Sum of the subnet shares within this category.
    pub fn subnet_total(&self) -> f64 {
        self.subnets.iter().map(|(_, pct)| pct).sum()
    }
}

/// The full allocation policy: categories in document order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AllocationPolicy {
    categories: Vec<(String, CategoryAllocation)>,
}

impl AllocationPolicy {
    /// Build a policy from already-validated categories.
    pub fn new(categories: Vec<(String, CategoryAllocation)>) -> Self {
        Self { categories }
    }

    /// Categories in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CategoryAllocation)> {
        self.categories.iter().map(|(name, c)| (name.as_str(), c))
    }

    /// Look up a category by name.
    pub fn get(&self, name: &str) -> Option<&CategoryAllocation> {
        self.categories
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Sum of the category totals.
    pub fn total_percentage(&self) -> f64 {
        self.categories.iter().map(|(_, c)| c.total_percentage).sum()
    }

    /// Render back into the configuration document shape, with integer
    /// subnet keys.
    pub fn to_value(&self) -> Value {
        let mut root = Mapping::new();
        for (name, category) in &self.categories {
            let mut subnets = Mapping::new();
            for (id, pct) in &category.subnets {
                subnets.insert(Value::from(id.get()), Value::from(*pct));
            }
            let mut entry = Mapping::new();
            entry.insert("description".into(), category.description.clone().into());
            entry.insert("total_percentage".into(), category.total_percentage.into());
            entry.insert("subnets".into(), Value::Mapping(subnets));
            root.insert(name.clone().into(), Value::Mapping(entry));
        }
        Value::Mapping(root)
    }
}

/// The optional `ledger` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSettings {
    /// Base URL of the staking gateway.
    pub endpoint: url::Url,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Name of the environment variable holding the gateway bearer token.
    pub api_token_env: Option<String>,
}

impl LedgerSettings {
    /// Default per-request timeout.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
}

/// A configuration document that passed every validator.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedConfig {
    pub network: Network,
    pub wallet: WalletSpec,
    pub staking: StakingParameters,
    pub allocation: AllocationPolicy,
    pub ledger: Option<LedgerSettings>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_from_tao_rounds_to_nearest_rao() {
        assert_eq!(Balance::from_tao(1.0).as_rao(), RAO_PER_TAO);
        assert_eq!(Balance::from_tao(0.35).as_rao(), 350_000_000);
        assert_eq!(Balance::from_tao(0.000_000_000_4).as_rao(), 0);
        assert_eq!(Balance::from_tao(0.000_000_000_6).as_rao(), 1);
    }

    #[test]
    fn balance_from_tao_saturates_invalid_input() {
        assert_eq!(Balance::from_tao(-3.0), Balance::default());
        assert_eq!(Balance::from_tao(f64::NAN), Balance::default());
    }

    #[test]
    fn balance_display() {
        assert_eq!(Balance::from_rao(1_500_000_000).to_string(), "1.500000000 TAO");
    }

    #[test]
    fn network_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Network::Finney).unwrap(), "\"finney\"");
        assert_eq!(Network::Local.to_string(), "local");
    }

    #[test]
    fn allocation_to_value_uses_integer_subnet_keys() {
        let policy = AllocationPolicy::new(vec![(
            "stable".to_string(),
            CategoryAllocation {
                description: "low risk".into(),
                total_percentage: 100.0,
                subnets: vec![(SubnetId::new(3), 100.0)],
            },
        )]);
        let value = policy.to_value();
        let subnets = value["stable"]["subnets"]
            .as_mapping()
            .expect("subnets mapping");
        assert_eq!(
            subnets.get(&Value::from(3u16)).and_then(Value::as_f64),
            Some(100.0)
        );
    }

    #[test]
    fn policy_lookup_and_totals() {
        let policy = AllocationPolicy::new(vec![
            (
                "a".to_string(),
                CategoryAllocation {
                    description: String::new(),
                    total_percentage: 40.0,
                    subnets: vec![(SubnetId::new(1), 50.0), (SubnetId::new(2), 50.0)],
                },
            ),
            (
                "b".to_string(),
                CategoryAllocation {
                    description: String::new(),
                    total_percentage: 60.0,
                    subnets: vec![(SubnetId::new(3), 100.0)],
                },
            ),
        ]);
        assert_eq!(policy.len(), 2);
        assert_eq!(policy.total_percentage(), 100.0);
        assert_eq!(policy.get("a").map(CategoryAllocation::subnet_total), Some(100.0));
        assert!(policy.get("missing").is_none());
    }
}
