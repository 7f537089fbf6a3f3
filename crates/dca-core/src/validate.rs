//! # Policy Validation
//!
//! Pure, deterministic checks over the raw configuration document. Each
//! validator fails fast on the first violated rule and, on success, returns
//! the typed value it checked, so that no caller ever re-reads raw YAML.
//!
//! ## Rules
//!
//! | Section      | Rule |
//! |--------------|------|
//! | `network`    | member of [`Network::ALLOWED`] |
//! | `wallet`     | `name` present, non-empty string |
//! | `staking`    | `delegate_hotkey` non-empty string, `amount_per_cycle` number ≥ 0.001, `interval` integer ≥ 300 |
//! | `allocation` | every category has `description`, `total_percentage`, `subnets`; subnet shares sum to 100 ± 0.01; category totals sum to exactly 100 |
//! | `ledger`     | optional; `endpoint` is an http(s) URL, `timeout_secs` ≥ 1 |
//!
//! The grand total uses exact equality. Category totals are meant to be
//! round design constants, not measured values.

use std::collections::BTreeSet;

use serde_yaml::{Mapping, Value};

use crate::config::RawConfig;
use crate::error::ValidationError;
use crate::model::{
    AllocationPolicy, CategoryAllocation, DelegateKey, LedgerSettings, Network,
    StakingParameters, SubnetId, ValidatedConfig, WalletSpec, MIN_AMOUNT_PER_CYCLE,
    MIN_INTERVAL_SECS,
};

/// Allowed deviation of a category's subnet shares from 100.
pub const SUBNET_SUM_TOLERANCE: f64 = 0.01;

/// Required sum of all category totals.
pub const REQUIRED_TOTAL_PERCENTAGE: f64 = 100.0;

const ROOT: &str = "config";

// ---------------------------------------------------------------------------
// Section validators
// ---------------------------------------------------------------------------

/// Check a network name against the allow-list.
pub fn validate_network(name: &str) -> Result<Network, ValidationError> {
    match name {
        "finney" => Ok(Network::Finney),
        "local" => Ok(Network::Local),
        other => Err(ValidationError::UnknownNetwork {
            network: other.to_string(),
        }),
    }
}

/// Check the `wallet` section.
pub fn validate_wallet(wallet: &Value) -> Result<WalletSpec, ValidationError> {
    let map = as_mapping(wallet, "wallet")?;
    let name = required_str(map, "wallet", "name")?;
    non_empty(name, "wallet", "name")?;
    Ok(WalletSpec {
        name: name.to_string(),
    })
}

/// Check the `staking` section.
///
/// Presence and kind of every field are checked before any bound, in the
/// order `delegate_hotkey`, `amount_per_cycle`, `interval`.
pub fn validate_staking_params(staking: &Value) -> Result<StakingParameters, ValidationError> {
    const SECTION: &str = "staking";
    let map = as_mapping(staking, SECTION)?;

    let delegate = required_str(map, SECTION, "delegate_hotkey")?;
    let amount = required_number(map, SECTION, "amount_per_cycle")?;
    let interval = required_integer(map, SECTION, "interval")?;

    non_empty(delegate, SECTION, "delegate_hotkey")?;

    finite(amount, SECTION, "amount_per_cycle")?;
    if amount < MIN_AMOUNT_PER_CYCLE {
        return Err(ValidationError::BelowMinimum {
            field: "amount_per_cycle",
            minimum: MIN_AMOUNT_PER_CYCLE,
            actual: amount,
            unit: "TAO",
        });
    }

    let interval_secs = match u64::try_from(interval) {
        Ok(secs) if secs >= MIN_INTERVAL_SECS => secs,
        _ => {
            return Err(ValidationError::BelowMinimum {
                field: "interval",
                minimum: MIN_INTERVAL_SECS as f64,
                actual: interval as f64,
                unit: "seconds",
            })
        }
    };

    Ok(StakingParameters {
        delegate: DelegateKey::new(delegate),
        amount_per_cycle: amount,
        interval_secs,
    })
}

/// Check the `allocation` section.
pub fn validate_allocation(allocation: &Value) -> Result<AllocationPolicy, ValidationError> {
    let map = as_mapping(allocation, "allocation")?;

    let mut categories = Vec::with_capacity(map.len());
    let mut total = 0.0;

    for (key, data) in map {
        let name = category_name(key)?;
        let category = validate_category(&name, data)?;
        total += category.total_percentage;
        categories.push((name, category));
    }

    if total != REQUIRED_TOTAL_PERCENTAGE {
        return Err(ValidationError::TotalMismatch { total });
    }

    Ok(AllocationPolicy::new(categories))
}

fn validate_category(name: &str, data: &Value) -> Result<CategoryAllocation, ValidationError> {
    let section = format!("allocation.{name}");
    let map = data.as_mapping().ok_or_else(|| ValidationError::NotAMapping {
        section: format!("allocation category {name}"),
    })?;

    for field in ["description", "total_percentage", "subnets"] {
        field_value(map, &section, field)?;
    }

    let description = required_str(map, &section, "description")?;
    let total_percentage = required_number(map, &section, "total_percentage")?;
    finite(total_percentage, &section, "total_percentage")?;
    if total_percentage < 0.0 {
        return Err(ValidationError::NegativePercentage {
            category: name.to_string(),
            field: "total_percentage".to_string(),
            value: total_percentage,
        });
    }

    let raw_subnets = field_value(map, &section, "subnets")?
        .as_mapping()
        .ok_or_else(|| ValidationError::NotAMapping {
            section: format!("subnets in {name}"),
        })?;

    let subnets_section = format!("{section}.subnets");
    let mut seen = BTreeSet::new();
    let mut subnets = Vec::with_capacity(raw_subnets.len());
    for (key, pct) in raw_subnets {
        let id = parse_subnet_id(name, key)?;
        if !seen.insert(id) {
            return Err(ValidationError::DuplicateSubnet {
                category: name.to_string(),
                id,
            });
        }
        let pct = pct.as_f64().ok_or_else(|| ValidationError::WrongType {
            section: subnets_section.clone(),
            field: id.to_string(),
            expected: "number",
        })?;
        finite(pct, &subnets_section, &id.to_string())?;
        if pct < 0.0 {
            return Err(ValidationError::NegativePercentage {
                category: name.to_string(),
                field: format!("subnet {id}"),
                value: pct,
            });
        }
        subnets.push((id, pct));
    }

    let category = CategoryAllocation {
        description: description.to_string(),
        total_percentage,
        subnets,
    };

    if category.subnets.is_empty() {
        if total_percentage > 0.0 {
            return Err(ValidationError::EmptySubnets {
                category: name.to_string(),
                total: total_percentage,
            });
        }
        return Ok(category);
    }

    let sum = category.subnet_total();
    if (sum - 100.0).abs() > SUBNET_SUM_TOLERANCE {
        return Err(ValidationError::SubnetSumMismatch {
            category: name.to_string(),
            sum,
        });
    }

    Ok(category)
}

/// Check the optional `ledger` section. An absent or null section yields `None`.
pub fn validate_ledger(ledger: Option<&Value>) -> Result<Option<LedgerSettings>, ValidationError> {
    const SECTION: &str = "ledger";
    let ledger = match ledger {
        None | Some(Value::Null) => return Ok(None),
        Some(value) => value,
    };
    let map = as_mapping(ledger, SECTION)?;

    let endpoint_text = required_str(map, SECTION, "endpoint")?;
    let endpoint = url::Url::parse(endpoint_text).map_err(|e| ValidationError::InvalidEndpoint {
        endpoint: endpoint_text.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(endpoint.scheme(), "http" | "https") {
        return Err(ValidationError::InvalidEndpoint {
            endpoint: endpoint_text.to_string(),
            reason: format!("unsupported scheme '{}'", endpoint.scheme()),
        });
    }

    let timeout_secs = match map.get("timeout_secs") {
        None | Some(Value::Null) => LedgerSettings::DEFAULT_TIMEOUT_SECS,
        Some(_) => {
            let secs = required_integer(map, SECTION, "timeout_secs")?;
            match u64::try_from(secs) {
                Ok(secs) if secs >= 1 => secs,
                _ => {
                    return Err(ValidationError::BelowMinimum {
                        field: "ledger.timeout_secs",
                        minimum: 1.0,
                        actual: secs as f64,
                        unit: "seconds",
                    })
                }
            }
        }
    };

    let api_token_env = match map.get("api_token_env") {
        None | Some(Value::Null) => None,
        Some(_) => Some(required_str(map, SECTION, "api_token_env")?.to_string()),
    };

    Ok(Some(LedgerSettings {
        endpoint,
        timeout_secs,
        api_token_env,
    }))
}

// ---------------------------------------------------------------------------
// Whole-document validation
// ---------------------------------------------------------------------------

/// Run every validator in order, failing on the first violation.
pub fn validate_config(raw: &RawConfig) -> Result<ValidatedConfig, ValidationError> {
    let root = as_mapping(raw.as_value(), ROOT)?;

    let network = validate_network(required_str(root, ROOT, "network")?)?;
    let wallet = validate_wallet(field_value(root, ROOT, "wallet")?)?;
    let staking = validate_staking_params(field_value(root, ROOT, "staking")?)?;
    let allocation = validate_allocation(field_value(root, ROOT, "allocation")?)?;
    let ledger = validate_ledger(root.get("ledger"))?;

    Ok(ValidatedConfig {
        network,
        wallet,
        staking,
        allocation,
        ledger,
    })
}

/// Run every section validator independently and collect all failures.
///
/// An empty result means [`validate_config`] would succeed.
pub fn collect_errors(raw: &RawConfig) -> Vec<ValidationError> {
    let root = match as_mapping(raw.as_value(), ROOT) {
        Ok(root) => root,
        Err(e) => return vec![e],
    };

    let mut errors = Vec::new();
    let mut record = |result: Result<(), ValidationError>| {
        if let Err(e) = result {
            errors.push(e);
        }
    };

    record(required_str(root, ROOT, "network").and_then(|n| validate_network(n).map(drop)));
    record(field_value(root, ROOT, "wallet").and_then(|w| validate_wallet(w).map(drop)));
    record(field_value(root, ROOT, "staking").and_then(|s| validate_staking_params(s).map(drop)));
    record(field_value(root, ROOT, "allocation").and_then(|a| validate_allocation(a).map(drop)));
    record(validate_ledger(root.get("ledger")).map(drop));

    errors
}

// ---------------------------------------------------------------------------
// Field access helpers
// ---------------------------------------------------------------------------

fn as_mapping<'a>(value: &'a Value, section: &str) -> Result<&'a Mapping, ValidationError> {
    value.as_mapping().ok_or_else(|| ValidationError::NotAMapping {
        section: section.to_string(),
    })
}

fn field_value<'a>(map: &'a Mapping, section: &str, field: &str) -> Result<&'a Value, ValidationError> {
    map.get(field).ok_or_else(|| ValidationError::MissingField {
        section: section.to_string(),
        field: field.to_string(),
    })
}

fn required_str<'a>(map: &'a Mapping, section: &str, field: &str) -> Result<&'a str, ValidationError> {
    field_value(map, section, field)?
        .as_str()
        .ok_or_else(|| wrong_type(section, field, "string"))
}

fn required_number(map: &Mapping, section: &str, field: &str) -> Result<f64, ValidationError> {
    match field_value(map, section, field)? {
        Value::Number(n) => n.as_f64().ok_or_else(|| wrong_type(section, field, "number")),
        _ => Err(wrong_type(section, field, "number")),
    }
}

/// Integers only: `300.0` is rejected. Values beyond `i64` saturate.
fn required_integer(map: &Mapping, section: &str, field: &str) -> Result<i64, ValidationError> {
    match field_value(map, section, field)? {
        Value::Number(n) if n.is_i64() => n.as_i64().ok_or_else(|| wrong_type(section, field, "integer")),
        Value::Number(n) if n.is_u64() => Ok(i64::MAX),
        _ => Err(wrong_type(section, field, "integer")),
    }
}

/// NaN and infinities slip past every ordered comparison, so reject them up front.
fn finite(value: f64, section: &str, field: &str) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(wrong_type(section, field, "finite number"))
    }
}

fn non_empty(value: &str, section: &str, field: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyValue {
            section: section.to_string(),
            field: field.to_string(),
        });
    }
    Ok(())
}

fn wrong_type(section: &str, field: &str, expected: &'static str) -> ValidationError {
    ValidationError::WrongType {
        section: section.to_string(),
        field: field.to_string(),
        expected,
    }
}

fn category_name(key: &Value) -> Result<String, ValidationError> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(ValidationError::WrongType {
            section: "allocation".to_string(),
            field: describe(other),
            expected: "string category name",
        }),
    }
}

/// Accepts integer keys (YAML) and numeric string keys (JSON).
fn parse_subnet_id(category: &str, key: &Value) -> Result<SubnetId, ValidationError> {
    let parsed = match key {
        Value::Number(n) => n.as_u64().and_then(|v| u16::try_from(v).ok()),
        Value::String(s) => s.trim().parse::<u16>().ok(),
        _ => None,
    };
    parsed.map(SubnetId::new).ok_or_else(|| ValidationError::InvalidSubnetId {
        category: category.to_string(),
        key: describe(key),
    })
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        _ => "<non-scalar>".to_string(),
    }
}
