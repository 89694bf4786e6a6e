//! Configuration types for the connectify service.
//!
//! Loaded once at process start: TOML file first, then `CONNECTIFY_*`
//! environment overrides. A missing store table or region is a startup
//! error reported by [`ConnectifyConfig::validate`], never a per-request one.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConnectifyError, Result};

/// Environment variable names recognized by [`ConnectifyConfig::apply_env`].
pub const ENV_TABLE: &str = "CONNECTIFY_TABLE";
pub const ENV_REGION: &str = "CONNECTIFY_REGION";
pub const ENV_DATA_DIR: &str = "CONNECTIFY_DATA_DIR";
pub const ENV_STORE: &str = "CONNECTIFY_STORE";
pub const ENV_HOST: &str = "CONNECTIFY_HOST";
pub const ENV_PORT: &str = "CONNECTIFY_PORT";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectifyConfig {
    /// Relationship store location.
    pub store: StoreConfig,
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Check-in date scheduling settings.
    pub scheduling: SchedulingConfig,
}

/// Which store implementation backs the directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Single-file SQLite database under `data_dir`.
    #[default]
    Sqlite,
    /// In-process map; contents are lost on exit.
    Memory,
}

/// Store location and handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Table name. Required.
    pub table: String,
    /// Region / endpoint identifier. Required.
    pub region: String,
    /// Root directory for on-disk stores.
    pub data_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            table: String::new(),
            region: String::new(),
            data_dir: default_data_dir(),
        }
    }
}

impl StoreConfig {
    /// Path of the SQLite database file: `{data_dir}/{region}/{table}.db`.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir
            .join(&self.region)
            .join(format!("{}.db", self.table))
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    /// Use `0` to let the OS pick a port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8787,
        }
    }
}

/// Check-in scheduling configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    /// Seed for reproducible jitter. `None` draws from the thread RNG.
    pub jitter_seed: Option<u64>,
}

fn default_data_dir() -> PathBuf {
    if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".connectify")
    } else {
        PathBuf::from("/tmp").join(".connectify")
    }
}

/// Table and region end up as path components, so keep them to a safe set.
fn is_identifier(s: &str) -> bool {
    !s.is_empty()
        && s != "."
        && s != ".."
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

impl ConnectifyConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ConnectifyError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ConnectifyError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/connectify/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("connectify").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("connectify")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/connectify-config/config.toml")
        }
    }

    /// Load from `path` (or the default path if it exists), then apply
    /// process environment overrides.
    ///
    /// Does not validate; call [`validate`](Self::validate) before use.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit file cannot be read or parsed, or an
    /// environment override is malformed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let default_path = Self::default_config_path();
                if default_path.is_file() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Override fields from `CONNECTIFY_*` variables read through `lookup`.
    ///
    /// Values are trimmed; empty values are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectifyError::Config`] for an unknown backend or a
    /// non-numeric port.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        if let Some(table) = get(ENV_TABLE) {
            self.store.table = table;
        }
        if let Some(region) = get(ENV_REGION) {
            self.store.region = region;
        }
        if let Some(dir) = get(ENV_DATA_DIR) {
            self.store.data_dir = PathBuf::from(dir);
        }
        if let Some(backend) = get(ENV_STORE) {
            self.store.backend = match backend.as_str() {
                "sqlite" => StoreBackend::Sqlite,
                "memory" => StoreBackend::Memory,
                other => {
                    return Err(ConnectifyError::Config(format!(
                        "{ENV_STORE} must be \"sqlite\" or \"memory\", got {other:?}"
                    )));
                }
            };
        }
        if let Some(host) = get(ENV_HOST) {
            self.server.host = host;
        }
        if let Some(port) = get(ENV_PORT) {
            self.server.port = port.parse().map_err(|e| {
                ConnectifyError::Config(format!("{ENV_PORT} must be a port number: {e}"))
            })?;
        }
        Ok(())
    }

    /// Check startup invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectifyError::Config`] if the table or region is unset
    /// or not a plain identifier, or the host is empty.
    pub fn validate(&self) -> Result<()> {
        let table = self.store.table.trim();
        let region = self.store.region.trim();
        if table.is_empty() {
            return Err(ConnectifyError::Config(format!(
                "store.table must be set (or {ENV_TABLE})"
            )));
        }
        if region.is_empty() {
            return Err(ConnectifyError::Config(format!(
                "store.region must be set (or {ENV_REGION})"
            )));
        }
        if !is_identifier(table) || !is_identifier(region) {
            return Err(ConnectifyError::Config(
                "store.table and store.region may only contain letters, digits, '-', '_' or '.'"
                    .into(),
            ));
        }
        if self.server.host.trim().is_empty() {
            return Err(ConnectifyError::Config("server.host must not be empty".into()));
        }
        Ok(())
    }
}
