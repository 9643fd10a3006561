//! Configuration management for the ledger server

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::traits::{DefaultTransactionValidator, DeliveryWindowValidator, TransactionValidator};
use crate::types::*;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,
    /// SQLite database file, used by the `sqlite` backend
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerConfig {
    /// Where the chain snapshot lives; the chain is memory-only when unset
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationConfig {
    /// Reject transactions expected to arrive before they ship
    #[serde(default)]
    pub enforce_delivery_window: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_backend() -> StoreBackend {
    StoreBackend::Sqlite
}

fn default_db_path() -> PathBuf {
    PathBuf::from("supply_chain.db")
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}

impl Config {
    /// Load configuration from `path`, falling back to defaults when the file is absent
    pub fn load(path: &Path) -> LedgerResult<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path).map_err(|e| {
            LedgerError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parse and check a TOML document
    pub fn from_toml_str(raw: &str) -> LedgerResult<Self> {
        let config: Config =
            toml::from_str(raw).map_err(|e| LedgerError::Config(e.to_string()))?;

        if config.store.backend == StoreBackend::Sqlite && config.store.path.as_os_str().is_empty() {
            return Err(LedgerError::Config(
                "store.path must be set for the sqlite backend".to_string(),
            ));
        }
        if config.server.bind.trim().is_empty() {
            return Err(LedgerError::Config("server.bind must be set".to_string()));
        }

        Ok(config)
    }

    /// The validator selected by `validation.enforce_delivery_window`
    pub fn validator(&self) -> Box<dyn TransactionValidator> {
        if self.validation.enforce_delivery_window {
            Box::new(DeliveryWindowValidator)
        } else {
            Box::new(DefaultTransactionValidator)
        }
    }
}
