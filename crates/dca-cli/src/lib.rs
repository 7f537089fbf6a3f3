//! # dca-cli — The `dca` Command
//!
//! ## Subcommands
//!
//! - `dca run` — validate the configuration, unlock the wallet, and run the
//!   scheduler until Ctrl-C.
//! - `dca validate` — report every rule the configuration breaks.
//! - `dca plan` — print the strategy summary and the flattened plan.
//! - `dca serve-config` — serve the configuration editor API.
//!
//! ```bash
//! dca --config config.yaml validate
//! dca plan --json
//! dca -v run --dry-run --dry-run-balance 5
//! ```

pub mod plan;
pub mod run;
pub mod serve;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};

use dca_core::{load_validated, ValidatedConfig, YamlConfigFile};
use dca_engine::{Shutdown, ShutdownSignal};

/// Default configuration path, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Load and validate the configuration at `path`. Any failure is fatal.
pub fn load_config(path: &Path) -> Result<ValidatedConfig> {
    load_validated(&YamlConfigFile::new(path))
        .with_context(|| format!("loading configuration from {}", path.display()))
}

/// Multi-threaded runtime for the async subcommands.
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting async runtime")
}

/// A shutdown signal that fires on the first Ctrl-C. Must be called from
/// inside a runtime.
pub(crate) fn ctrl_c_signal() -> ShutdownSignal {
    let (shutdown, signal) = Shutdown::new();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::warn!("interrupt received, shutting down");
                shutdown.trigger();
            }
            Err(e) => tracing::error!("cannot listen for Ctrl-C: {e}"),
        }
    });
    signal
}
