//! Property tests: any policy that validates compiles into a plan whose
//! shares cover the whole budget.

use dca_core::{
    compile, validate_allocation, AllocationPolicy, CategoryAllocation, SubnetId, ValidationError,
};
use proptest::prelude::*;

/// Build a policy from raw weights: category totals are integers summing
/// to exactly 100, subnet shares are floats summing to 100 within rounding.
/// Subnet ids are unique across categories.
fn policy_from_weights(weights: &[(u32, Vec<u32>)]) -> AllocationPolicy {
    let weight_sum: u32 = weights.iter().map(|(w, _)| w).sum();
    let mut remaining = 100u32;
    let mut next_id = 0u16;
    let mut categories = Vec::new();

    for (index, (weight, subnet_weights)) in weights.iter().enumerate() {
        let total = if index + 1 == weights.len() {
            remaining
        } else {
            let share = weight * 100 / weight_sum;
            remaining -= share;
            share
        };

        let subnet_sum: u32 = subnet_weights.iter().sum();
        let subnets = subnet_weights
            .iter()
            .map(|w| {
                next_id += 1;
                (SubnetId::new(next_id), *w as f64 * 100.0 / subnet_sum as f64)
            })
            .collect();

        categories.push((
            format!("category_{index}"),
            CategoryAllocation {
                description: format!("generated {index}"),
                total_percentage: total as f64,
                subnets,
            },
        ));
    }

    AllocationPolicy::new(categories)
}

fn weights() -> impl Strategy<Value = Vec<(u32, Vec<u32>)>> {
    prop::collection::vec(
        (1u32..100, prop::collection::vec(1u32..1000, 1..6)),
        1..6,
    )
}

proptest! {
    /// Generated policies pass validation and flatten to 100% (±0.01).
    #[test]
    fn valid_policy_plan_sums_to_100(w in weights()) {
        let generated = policy_from_weights(&w);
        let policy = validate_allocation(&generated.to_value());
        prop_assert!(policy.is_ok(), "validation failed: {:?}", policy.err());

        let plan = compile(&policy.unwrap());
        prop_assert!((plan.total_percentage() - 100.0).abs() <= 0.01,
            "plan total {}", plan.total_percentage());
    }

    /// Per-target amounts add up to the budget.
    #[test]
    fn amounts_cover_budget(w in weights(), budget in 0.001f64..1000.0) {
        let plan = compile(&policy_from_weights(&w));
        let spent: f64 = plan.amounts(budget).values().sum();
        prop_assert!((spent - budget).abs() <= budget * 1e-4);
    }

    /// Raising any category total breaks the exact 100% rule.
    #[test]
    fn inflated_total_is_rejected(w in weights(), extra in 1u32..50) {
        let mut value = policy_from_weights(&w).to_value();
        let first = value
            .as_mapping_mut()
            .and_then(|m| m.iter_mut().next().map(|(_, category)| category))
            .and_then(|c| c.as_mapping_mut())
            .expect("first category");
        let current = first
            .get("total_percentage")
            .and_then(serde_yaml::Value::as_f64)
            .expect("number");
        first.insert("total_percentage".into(), (current + extra as f64).into());

        let err = validate_allocation(&value).unwrap_err();
        prop_assert!(matches!(err, ValidationError::TotalMismatch { .. }), "got {err:?}");
    }
}
