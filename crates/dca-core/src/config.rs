//! # Configuration Document
//!
//! The raw YAML document (`network`, `wallet`, `staking`, `allocation`,
//! optional `ledger`) and the sources it is loaded from. Raw documents are
//! never run directly; they go through [`crate::validate::validate_config`]
//! first.

use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};

use crate::error::DcaError;
use crate::model::ValidatedConfig;
use crate::validate::validate_config;

/// An unvalidated configuration document.
#[derive(Debug, Clone, PartialEq)]
pub struct RawConfig(Value);

impl RawConfig {
    /// Wrap an already-parsed YAML value.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Parse YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text).map(Self)
    }

    /// Render as YAML text, preserving key order.
    pub fn to_yaml_string(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self.0)
    }

    /// The document as a YAML value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// A top-level section, if present.
    pub fn section(&self, name: &str) -> Option<&Value> {
        self.0.as_mapping().and_then(|m| m.get(name))
    }

    /// Replace (or insert) a top-level section. A non-mapping document is
    /// reset to an empty mapping first.
    pub fn set_section(&mut self, name: &str, value: Value) {
        self.root_mut().insert(Value::from(name), value);
    }

    /// Mutable access to a top-level mapping section, creating it when
    /// absent or replacing it when it is not a mapping.
    pub fn section_mapping_mut(&mut self, name: &str) -> &mut Mapping {
        let slot = self
            .root_mut()
            .entry(Value::from(name))
            .or_insert(Value::Mapping(Mapping::new()));
        if !slot.is_mapping() {
            *slot = Value::Mapping(Mapping::new());
        }
        match slot {
            Value::Mapping(section) => section,
            _ => unreachable!("section {name} holds a mapping"),
        }
    }

    fn root_mut(&mut self) -> &mut Mapping {
        if !self.0.is_mapping() {
            self.0 = Value::Mapping(Mapping::new());
        }
        match &mut self.0 {
            Value::Mapping(root) => root,
            _ => unreachable!("document root holds a mapping"),
        }
    }

    /// The document the configuration editor starts from when no file
    /// exists yet. It does not pass validation until a wallet, delegate,
    /// and allocation are filled in.
    pub fn defaults() -> Self {
        let mut staking = Mapping::new();
        staking.insert("delegate_hotkey".into(), "".into());
        staking.insert("amount_per_cycle".into(), 0.01.into());
        staking.insert("interval".into(), 10_800u64.into());

        let mut wallet = Mapping::new();
        wallet.insert("name".into(), "".into());

        let mut root = Mapping::new();
        root.insert("network".into(), "finney".into());
        root.insert("wallet".into(), Value::Mapping(wallet));
        root.insert("staking".into(), Value::Mapping(staking));
        root.insert("allocation".into(), Value::Mapping(Mapping::new()));
        Self(Value::Mapping(root))
    }
}

/// Where configuration documents come from.
pub trait ConfigSource {
    /// Load the raw document. Fails with [`DcaError::ConfigNotFound`] or
    /// [`DcaError::ConfigParse`].
    fn load(&self) -> Result<RawConfig, DcaError>;
}

/// Load from `source` and run every validator.
pub fn load_validated(source: &impl ConfigSource) -> Result<ValidatedConfig, DcaError> {
    let raw = source.load()?;
    Ok(validate_config(&raw)?)
}

/// A YAML file on disk.
#[derive(Debug, Clone)]
pub struct YamlConfigFile {
    path: PathBuf,
}

impl YamlConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the file, or return [`RawConfig::defaults`] when it does not exist.
    pub fn load_or_default(&self) -> Result<RawConfig, DcaError> {
        match self.load() {
            Err(DcaError::ConfigNotFound { .. }) => Ok(RawConfig::defaults()),
            other => other,
        }
    }

    /// Write the document. The file is replaced atomically via a sibling
    /// temporary file.
    pub fn save(&self, config: &RawConfig) -> Result<(), DcaError> {
        let text = config
            .to_yaml_string()
            .map_err(|e| self.serialize_error(&e))?;

        let mut tmp_name = self.path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp = self.path.with_file_name(tmp_name);

        let write_err = |source| DcaError::ConfigWrite {
            path: self.path.clone(),
            source,
        };
        std::fs::write(&tmp, text).map_err(write_err)?;
        std::fs::rename(&tmp, &self.path).map_err(write_err)
    }

    fn serialize_error(&self, e: &serde_yaml::Error) -> DcaError {
        DcaError::ConfigSerialize {
            path: self.path.clone(),
            reason: e.to_string(),
        }
    }
}

impl ConfigSource for YamlConfigFile {
    fn load(&self) -> Result<RawConfig, DcaError> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                DcaError::ConfigNotFound {
                    path: self.path.clone(),
                }
            } else {
                DcaError::ConfigRead {
                    path: self.path.clone(),
                    source,
                }
            }
        })?;

        RawConfig::from_yaml_str(&text).map_err(|e| DcaError::ConfigParse {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }
}
