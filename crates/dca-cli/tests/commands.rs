//! Subcommand handlers against configuration files on disk.

use std::path::{Path, PathBuf};

use dca_cli::plan::{run_plan, PlanArgs};
use dca_cli::validate::run_validate;

fn example_config() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config.example.yaml")
}

#[test]
fn example_configuration_is_valid() {
    assert_eq!(run_validate(&example_config()).unwrap(), 0);
}

#[test]
fn example_configuration_loads() {
    let config = dca_cli::load_config(&example_config()).unwrap();
    assert_eq!(config.allocation.len(), 2);
    assert_eq!(config.staking.interval_secs, 10_800);
    let ledger = config.ledger.expect("ledger section");
    assert_eq!(ledger.api_token_env.as_deref(), Some("DCA_GATEWAY_TOKEN"));
}

#[test]
fn plan_succeeds_in_both_formats() {
    let text = PlanArgs {
        json: false,
        sum_overlaps: false,
    };
    let json = PlanArgs {
        json: true,
        sum_overlaps: true,
    };
    assert_eq!(run_plan(&text, &example_config()).unwrap(), 0);
    assert_eq!(run_plan(&json, &example_config()).unwrap(), 0);
}

#[test]
fn invalid_configuration_is_fatal_for_plan() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(
        &path,
        "network: finney\nwallet:\n  name: w\nstaking:\n  delegate_hotkey: d\n  amount_per_cycle: 0.0001\n  interval: 300\nallocation: {}\n",
    )
    .unwrap();

    let err = run_plan(
        &PlanArgs {
            json: false,
            sum_overlaps: false,
        },
        &path,
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("amount_per_cycle"));
}
