//! `dca validate` — check a configuration without running it.

use std::path::Path;

use anyhow::{Context, Result};

use dca_core::{collect_errors, ConfigSource, ValidationError, YamlConfigFile};

/// Print `configuration valid`, or every broken rule. Returns the exit code.
pub fn run_validate(config_path: &Path) -> Result<u8> {
    let raw = YamlConfigFile::new(config_path)
        .load()
        .with_context(|| format!("loading configuration from {}", config_path.display()))?;

    let errors = collect_errors(&raw);
    if errors.is_empty() {
        println!("configuration valid");
        return Ok(0);
    }

    eprint!("{}", report(&errors));
    Ok(1)
}

/// One `invalid:` line per broken rule.
fn report(errors: &[ValidationError]) -> String {
    errors.iter().map(|error| format!("invalid: {error}\n")).collect()
}
