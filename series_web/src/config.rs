//! Layered service configuration
//!
//! Precedence, lowest first: built-in defaults, an optional TOML file,
//! `TIMESCOPE_*` environment variables, then command line flags (applied by
//! the binary).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_CONFIG: &str = "TIMESCOPE_CONFIG";
pub const ENV_BIND: &str = "TIMESCOPE_BIND";
pub const ENV_DATA_DIR: &str = "TIMESCOPE_DATA_DIR";
pub const ENV_STATIC_DIR: &str = "TIMESCOPE_STATIC_DIR";
pub const ENV_ACF_LAGS: &str = "TIMESCOPE_ACF_LAGS";
pub const ENV_LOG: &str = "TIMESCOPE_LOG";
pub const ENV_LOG_JSON: &str = "TIMESCOPE_LOG_JSON";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value {value:?} for {var}")]
    Env { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Socket address the HTTP server listens on
    pub bind: String,
    /// Where uploaded files are stored
    pub data_dir: PathBuf,
    /// Where plot artifacts are written and served from
    pub static_dir: PathBuf,
    /// Autocorrelation lags drawn during analysis
    pub acf_lags: usize,
    /// `tracing` filter directive used when `RUST_LOG` is unset
    pub log_filter: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
            data_dir: PathBuf::from("data"),
            static_dir: PathBuf::from("static"),
            acf_lags: series_forecast::controller::DEFAULT_ACF_LAGS,
            log_filter: "info".to_string(),
            log_json: false,
        }
    }
}

impl Settings {
    /// Defaults, overlaid with `config_file` when given, then the process environment
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_env(|var| std::env::var(var).ok())?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse TOML; missing keys keep their defaults
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Overlay variables returned by `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup(ENV_BIND) {
            self.bind = bind;
        }
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(ENV_STATIC_DIR) {
            self.static_dir = PathBuf::from(dir);
        }
        if let Some(value) = lookup(ENV_ACF_LAGS) {
            self.acf_lags = value.trim().parse().map_err(|_| ConfigError::Env {
                var: ENV_ACF_LAGS,
                value,
            })?;
        }
        if let Some(filter) = lookup(ENV_LOG) {
            self.log_filter = filter;
        }
        if let Some(value) = lookup(ENV_LOG_JSON) {
            self.log_json = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::Env {
                        var: ENV_LOG_JSON,
                        value,
                    })
                }
            };
        }
        Ok(())
    }

    /// Create the data and static directories if they are missing
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.static_dir)
    }
}
