//! `dca plan` — preview what one cycle would stake.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use dca_core::{amount_for_share, compile_with, OverlapPolicy, StakePlan, ValidatedConfig};

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Print the flattened plan and per-cycle amounts as JSON.
    #[arg(long)]
    pub json: bool,

    /// Add shares of a subnet listed in several categories instead of
    /// keeping the last one.
    #[arg(long)]
    pub sum_overlaps: bool,
}

pub(crate) fn overlap_policy(sum_overlaps: bool) -> OverlapPolicy {
    if sum_overlaps {
        OverlapPolicy::Sum
    } else {
        OverlapPolicy::Overwrite
    }
}

pub fn run_plan(args: &PlanArgs, config_path: &Path) -> Result<u8> {
    let config = crate::load_config(config_path)?;
    let plan = compile_with(&config.allocation, overlap_policy(args.sum_overlaps));
    warn_overlaps(&plan);

    if args.json {
        let amounts = plan.amounts(config.staking.amount_per_cycle);
        let doc = serde_json::json!({
            "amount_per_cycle": config.staking.amount_per_cycle,
            "interval_secs": config.staking.interval_secs,
            "shares": plan,
            "amounts": amounts,
        });
        let text = serde_json::to_string_pretty(&doc).context("rendering plan")?;
        println!("{text}");
    } else {
        print!("{}", strategy_summary(&config, &plan));
    }
    Ok(0)
}

pub(crate) fn warn_overlaps(plan: &StakePlan) {
    for target in plan.overlapping_targets() {
        tracing::warn!(target_subnet = %target, "subnet appears in more than one category");
    }
}

/// Human-readable strategy: settings, each category with its subnets, and
/// the flattened plan.
pub fn strategy_summary(config: &ValidatedConfig, plan: &StakePlan) -> String {
    let budget = config.staking.amount_per_cycle;
    let mut out = String::new();

    let _ = writeln!(out, "Network:          {}", config.network);
    let _ = writeln!(out, "Wallet:           {}", config.wallet.name);
    let _ = writeln!(out, "Delegate:         {}", config.staking.delegate);
    let _ = writeln!(out, "Amount per cycle: {budget} TAO");
    let _ = writeln!(out, "Interval:         {} seconds", config.staking.interval_secs);

    for (name, category) in config.allocation.iter() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{} ({}%)", title_case(name), category.total_percentage);
        if !category.description.is_empty() {
            let _ = writeln!(out, "  {}", category.description);
        }
        for (target, pct) in &category.subnets {
            let share = category.total_percentage * pct / 100.0;
            let _ = writeln!(
                out,
                "  - subnet {target}: {pct}% of category ({:.6} TAO)",
                amount_for_share(budget, share)
            );
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Plan ({} targets):", plan.len());
    for (target, share) in plan.iter() {
        let _ = writeln!(
            out,
            "  subnet {target:>5}: {share:>7.3}%  {:.6} TAO",
            amount_for_share(budget, share)
        );
    }
    out
}

/// `long_term_growth` → `Long Term Growth`.
fn title_case(name: &str) -> String {
    name.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
