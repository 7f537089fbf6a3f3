//! `dca serve-config` — the configuration editor API.

use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use dca_config_api::AppState;
use dca_core::YamlConfigFile;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,
}

pub fn run_serve(args: &ServeArgs, config_path: &Path) -> Result<u8> {
    let state = AppState::new(YamlConfigFile::new(config_path));
    crate::runtime()?.block_on(async {
        let mut signal = crate::ctrl_c_signal();
        dca_config_api::serve(state, args.bind, async move { signal.cancelled().await })
            .await
            .with_context(|| format!("serving configuration editor on {}", args.bind))
    })?;
    Ok(0)
}
