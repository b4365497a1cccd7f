//! Ledger configuration via `txledger.toml`
//!
//! The config file lives next to the ledger data. On first open a default
//! `txledger.toml` is written; to change settings, edit the file and rerun.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use txledger_core::{Error, Result};
use txledger_storage::{FileLedger, SyncMode};

use crate::listing::ListPolicy;

/// Config file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "txledger.toml";

/// Ledger configuration loaded from `txledger.toml`
///
/// # Example
///
/// ```toml
/// data_dir = ".txledger"
/// sync = "always"
/// seed_on_open = false
/// list_policy = "fail-fast"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Directory holding `ledger.log`
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Log sync mode: `"always"` or `"none"`
    #[serde(default = "default_sync_str")]
    pub sync: String,
    /// Run InitLedger when opening an empty ledger
    #[serde(default)]
    pub seed_on_open: bool,
    /// Policy used by `list`
    #[serde(default)]
    pub list_policy: ListPolicy,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".txledger")
}

fn default_sync_str() -> String {
    "always".to_string()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            sync: default_sync_str(),
            seed_on_open: false,
            list_policy: ListPolicy::default(),
        }
    }
}

impl LedgerConfig {
    /// Parse the sync string into a `SyncMode`
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the string is not `"always"` or `"none"`.
    pub fn sync_mode(&self) -> Result<SyncMode> {
        match self.sync.as_str() {
            "always" => Ok(SyncMode::Always),
            "none" => Ok(SyncMode::None),
            other => Err(Error::InvalidConfig(format!(
                "invalid sync mode '{}' in {}, expected \"always\" or \"none\"",
                other, CONFIG_FILE_NAME
            ))),
        }
    }

    /// Default config file content with comments
    pub fn default_toml() -> &'static str {
        r#"# txledger configuration
#
# Directory holding the ledger log (default: ".txledger")
data_dir = ".txledger"

# Sync mode: "always" (default) or "none"
#   "always" = fsync after every write
#   "none"   = leave flushing to the OS, may lose recent writes on crash
sync = "always"

# Seed the well-known transactions when the ledger is empty (default: false)
seed_on_open = false

# Listing policy: "fail-fast" (default) or "skip-malformed"
list_policy = "fail-fast"
"#
    }

    /// Read and parse config from a file path
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the file cannot be read, parsed, or holds an
    /// invalid sync mode.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidConfig(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: LedgerConfig = toml::from_str(&content).map_err(|e| {
            Error::InvalidConfig(format!(
                "failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.sync_mode()?;
        Ok(config)
    }

    /// Load `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write the default config file if it does not already exist
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::InvalidConfig(format!(
                    "failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to `path`
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::InvalidConfig(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::InvalidConfig(format!(
                "failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Open the file ledger this config describes
    pub fn open_ledger(&self) -> Result<FileLedger> {
        FileLedger::open_with(&self.data_dir, self.sync_mode()?)
    }
}
