//! Settings loading and platform defaults
//!
//! Service settings are resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! Steps 1 and 2 belong to the binary's argument parser; this module provides
//! steps 3 and 4. A missing or malformed TOML file never stops startup: it is
//! logged and the compiled defaults apply.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable that points at an explicit TOML config file
pub const CONFIG_ENV_VAR: &str = "SAB_CONFIG";

/// Compiled-in defaults for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub host: String,
    pub port: u16,
    pub history_capacity: usize,
    pub read_timeout_ms: u64,
    pub jitter: bool,
    pub log_level: String,
}

impl CompiledDefaults {
    /// Defaults for the platform this binary was built for
    pub fn for_current_platform() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8081,
            history_capacity: 1000,
            read_timeout_ms: 2000,
            jitter: true,
            log_level: "info".to_string(),
        }
    }
}

/// `[bridge]` table of the TOML config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BridgeToml {
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Maximum retained measurements (0 = unbounded)
    pub history_capacity: Option<usize>,
    /// Per-file read timeout during acquisition
    pub read_timeout_ms: Option<u64>,
    /// Generator PRNG seed; entropy-seeded when absent
    pub seed: Option<u64>,
    /// Measurement-noise jitter in synthesized data
    pub jitter: Option<bool>,
    /// Replaces the platform data-directory search list with one directory
    pub data_dir: Option<PathBuf>,
}

/// `[logging]` table of the TOML config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. "info" or "sab_bridge=debug"
    pub level: Option<String>,
}

/// Whole TOML config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub bridge: BridgeToml,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Location of the TOML config file
///
/// `$SAB_CONFIG` wins; otherwise `<config dir>/sab/config.toml`
/// (`~/.config` on Linux, `~/Library/Application Support` on macOS,
/// `%APPDATA%` on Windows).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    dirs::config_dir().map(|d| d.join("sab").join("config.toml"))
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
}

/// Load the TOML config, degrading to defaults when it is missing or invalid
pub fn load_toml_config_or_default(path: Option<&Path>) -> TomlConfig {
    let Some(path) = path else {
        return TomlConfig::default();
    };

    if !path.exists() {
        info!("No config file at {} (using defaults)", path.display());
        return TomlConfig::default();
    }

    match load_toml_config(path) {
        Ok(config) => {
            info!("Loaded config file {}", path.display());
            config
        }
        Err(e) => {
            warn!("Ignoring config file: {}", e);
            TomlConfig::default()
        }
    }
}
