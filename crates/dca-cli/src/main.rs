//! # dca CLI entry point
//!
//! Parses command-line arguments, sets up logging, and dispatches to the
//! subcommand handlers in the library.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use dca_cli::plan::{run_plan, PlanArgs};
use dca_cli::run::{run_daemon, RunArgs};
use dca_cli::serve::{run_serve, ServeArgs};
use dca_cli::validate::run_validate;
use dca_cli::DEFAULT_CONFIG_PATH;

/// Periodic stake dollar-cost averaging across weighted subnet allocations.
#[derive(Parser, Debug)]
#[command(name = "dca", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Path to the configuration file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the staking daemon until interrupted.
    Run(RunArgs),

    /// Check the configuration and report every problem.
    Validate,

    /// Show the staking strategy and the per-cycle plan.
    Plan(PlanArgs),

    /// Serve the configuration editor API.
    ServeConfig(ServeArgs),
}

impl Commands {
    /// Long-running commands log progress at info level without `-v`.
    fn default_verbosity(&self) -> u8 {
        match self {
            Self::Run(_) | Self::ServeConfig(_) => 1,
            Self::Validate | Self::Plan(_) => 0,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG, when set, overrides the -v count.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match cli.verbose.max(cli.command.default_verbosity()) {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    });

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    tracing::debug!(config = %cli.config.display(), "dca starting");

    let result = match &cli.command {
        Commands::Run(args) => run_daemon(args, &cli.config),
        Commands::Validate => run_validate(&cli.config),
        Commands::Plan(args) => run_plan(args, &cli.config),
        Commands::ServeConfig(args) => run_serve(args, &cli.config),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parse_run_defaults() {
        let cli = Cli::try_parse_from(["dca", "run"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("config.yaml"));
        match cli.command {
            Commands::Run(args) => {
                assert!(!args.dry_run);
                assert_eq!(args.dry_run_balance, 10.0);
                assert!(args.ledger_url.is_none());
                assert_eq!(args.password_env, "DCA_WALLET_PASSWORD");
                assert!(!args.sum_overlaps);
            }
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn cli_parse_run_dry_run() {
        let cli = Cli::try_parse_from(["dca", "-vv", "run", "--dry-run", "--dry-run-balance", "2.5"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(!cli.log_json);
        if let Commands::Run(args) = cli.command {
            assert!(args.dry_run);
            assert_eq!(args.dry_run_balance, 2.5);
        }
    }

    #[test]
    fn cli_parse_dry_run_conflicts_with_ledger_url() {
        let parsed = Cli::try_parse_from([
            "dca",
            "run",
            "--dry-run",
            "--ledger-url",
            "http://127.0.0.1:9000",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn cli_parse_rejects_bad_ledger_url() {
        assert!(Cli::try_parse_from(["dca", "run", "--ledger-url", "not a url"]).is_err());
    }

    #[test]
    fn cli_parse_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["dca", "validate", "--config", "/etc/dca.yaml"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("/etc/dca.yaml"));
        assert!(matches!(cli.command, Commands::Validate));
    }

    #[test]
    fn cli_parse_plan_json() {
        let cli = Cli::try_parse_from(["dca", "plan", "--json"]).unwrap();
        if let Commands::Plan(args) = cli.command {
            assert!(args.json);
        }
    }

    #[test]
    fn cli_parse_serve_config_bind() {
        let cli = Cli::try_parse_from(["dca", "serve-config"]).unwrap();
        if let Commands::ServeConfig(args) = cli.command {
            assert_eq!(args.bind.to_string(), "127.0.0.1:5000");
        }
        let cli = Cli::try_parse_from(["dca", "serve-config", "--bind", "0.0.0.0:8080"]).unwrap();
        if let Commands::ServeConfig(args) = cli.command {
            assert_eq!(args.bind.port(), 8080);
        }
    }

    #[test]
    fn long_running_commands_default_to_info() {
        let cli = Cli::try_parse_from(["dca", "run", "--dry-run"]).unwrap();
        assert_eq!(cli.command.default_verbosity(), 1);
        let cli = Cli::try_parse_from(["dca", "validate"]).unwrap();
        assert_eq!(cli.command.default_verbosity(), 0);
    }
}
