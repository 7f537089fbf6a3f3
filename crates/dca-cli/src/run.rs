//! `dca run` — the daemon.
//!
//! Startup is all-or-nothing: a missing, unparsable, or invalid
//! configuration stops the process before any ledger contact, and so does
//! a wallet that will not unlock. After that the scheduler runs until
//! Ctrl-C.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use url::Url;
use zeroize::Zeroizing;

use dca_core::{compile_with, Balance, DcaError, ValidatedConfig};
use dca_engine::{CycleExecutor, Scheduler};
use dca_ledger::{DryRunLedger, GatewayConfig, HttpLedgerClient, LedgerClient, WalletHandle};

use crate::plan::{overlap_policy, strategy_summary, warn_overlaps};

/// Default environment variable holding the wallet password.
pub const DEFAULT_PASSWORD_ENV: &str = "DCA_WALLET_PASSWORD";

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Stake against an in-process simulated ledger instead of the gateway.
    #[arg(long)]
    pub dry_run: bool,

    /// Starting balance of the simulated wallet, in TAO.
    #[arg(long, default_value_t = 10.0)]
    pub dry_run_balance: f64,

    /// Staking gateway URL. Overrides `ledger.endpoint` in the configuration.
    #[arg(long, conflicts_with = "dry_run")]
    pub ledger_url: Option<Url>,

    /// Environment variable the wallet password is read from.
    #[arg(long, default_value = DEFAULT_PASSWORD_ENV)]
    pub password_env: String,

    /// Add shares of a subnet listed in several categories instead of
    /// keeping the last one.
    #[arg(long)]
    pub sum_overlaps: bool,
}

type Collaborators = (Arc<dyn WalletHandle>, Arc<dyn LedgerClient>);

pub fn run_daemon(args: &RunArgs, config_path: &Path) -> Result<u8> {
    let config = crate::load_config(config_path)?;
    let plan = compile_with(&config.allocation, overlap_policy(args.sum_overlaps));
    warn_overlaps(&plan);
    tracing::info!("staking strategy\n{}", strategy_summary(&config, &plan));

    crate::runtime()?.block_on(async {
        let (wallet, ledger) = collaborators(args, &config)?;

        wallet
            .unlock()
            .await
            .map_err(DcaError::from)
            .with_context(|| format!("unlocking wallet '{}'", config.wallet.name))?;
        match wallet.available_balance().await {
            Ok(balance) => tracing::info!(%balance, "wallet unlocked"),
            Err(e) => tracing::warn!("wallet unlocked, balance unknown: {e}"),
        }

        let scheduler = Scheduler::new(
            config.staking.clone(),
            plan,
            wallet,
            CycleExecutor::new(ledger),
            crate::ctrl_c_signal(),
        );
        let stats = scheduler.run().await;
        tracing::info!(
            cycles_executed = stats.cycles_executed,
            cycles_skipped = stats.cycles_skipped,
            submissions_succeeded = stats.submissions_succeeded,
            submissions_failed = stats.submissions_failed,
            "shut down"
        );
        Ok::<_, anyhow::Error>(())
    })?;
    Ok(0)
}

fn collaborators(args: &RunArgs, config: &ValidatedConfig) -> Result<Collaborators> {
    if args.dry_run {
        if !args.dry_run_balance.is_finite() || args.dry_run_balance < 0.0 {
            bail!("--dry-run-balance must be a non-negative number");
        }
        tracing::warn!("dry run: no stake leaves this process");
        let ledger = Arc::new(DryRunLedger::new(Balance::from_tao(args.dry_run_balance)));
        let wallet: Arc<dyn WalletHandle> = ledger.clone();
        let ledger: Arc<dyn LedgerClient> = ledger;
        return Ok((wallet, ledger));
    }

    let mut gateway = match (&config.ledger, &args.ledger_url) {
        (Some(settings), _) => GatewayConfig::from_settings(settings, config.network, &config.wallet)
            .context("configuring ledger gateway")?,
        (None, Some(url)) => GatewayConfig::new(url.clone(), config.network, config.wallet.name.clone()),
        (None, None) => bail!(
            "no ledger endpoint: set ledger.endpoint in the configuration, pass --ledger-url, or use --dry-run"
        ),
    };
    if let Some(url) = &args.ledger_url {
        gateway.endpoint = url.clone();
    }
    match std::env::var(&args.password_env) {
        Ok(password) => gateway = gateway.with_password(Zeroizing::new(password)),
        Err(_) => tracing::debug!(var = %args.password_env, "no wallet password in environment"),
    }

    tracing::info!(endpoint = %gateway.endpoint, network = %config.network, "using ledger gateway");
    let client = Arc::new(HttpLedgerClient::new(gateway).context("building ledger client")?);
    let wallet: Arc<dyn WalletHandle> = client.clone();
    let ledger: Arc<dyn LedgerClient> = client;
    Ok((wallet, ledger))
}
