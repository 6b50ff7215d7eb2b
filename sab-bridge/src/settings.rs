//! Service settings resolution
//!
//! Combines command-line/environment overrides, the TOML file and compiled
//! defaults into one [`BridgeSettings`], fixed for the life of the process.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use sab_common::config::{CompiledDefaults, TomlConfig};

use crate::config::BridgeConfig;
use crate::discovery::{Discovery, DiscoveryPaths, ProcessListing};
use crate::error::{Error, Result};
use crate::generator::Generator;
use crate::state::BridgeState;

/// Values supplied on the command line or through `SAB_*` variables
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub history_capacity: Option<usize>,
    pub read_timeout_ms: Option<u64>,
    pub seed: Option<u64>,
    /// `true` disables jitter; `false` defers to the file and defaults
    pub no_jitter: bool,
    pub data_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

/// Resolved process-level settings
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeSettings {
    pub host: String,
    pub port: u16,
    /// 0 = unbounded
    pub history_capacity: usize,
    pub read_timeout: Duration,
    pub seed: Option<u64>,
    pub jitter: bool,
    pub data_dir: Option<PathBuf>,
    pub log_level: String,
}

impl BridgeSettings {
    /// Overrides, then TOML, then compiled defaults
    pub fn resolve(
        overrides: SettingsOverrides,
        toml: TomlConfig,
        defaults: CompiledDefaults,
    ) -> Self {
        let bridge = toml.bridge;
        let jitter = if overrides.no_jitter {
            false
        } else {
            bridge.jitter.unwrap_or(defaults.jitter)
        };

        Self {
            host: overrides.host.or(bridge.host).unwrap_or(defaults.host),
            port: overrides.port.or(bridge.port).unwrap_or(defaults.port),
            history_capacity: overrides
                .history_capacity
                .or(bridge.history_capacity)
                .unwrap_or(defaults.history_capacity),
            read_timeout: sab_common::time::millis_to_duration(
                overrides
                    .read_timeout_ms
                    .or(bridge.read_timeout_ms)
                    .unwrap_or(defaults.read_timeout_ms),
            ),
            seed: overrides.seed.or(bridge.seed),
            jitter,
            data_dir: overrides.data_dir.or(bridge.data_dir),
            log_level: overrides
                .log_level
                .or(toml.logging.level)
                .unwrap_or(defaults.log_level),
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| Error::InvalidInput(format!("invalid bind host: {}", self.host)))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn discovery_paths(&self) -> DiscoveryPaths {
        let paths = DiscoveryPaths::for_current_platform();
        match &self.data_dir {
            Some(dir) => paths.with_data_dir(dir.clone()),
            None => paths,
        }
    }

    /// Bridge state wired from these settings and the default runtime config
    pub fn build_state(&self) -> BridgeState {
        BridgeState::new(
            Discovery::new(self.discovery_paths(), ProcessListing::System),
            BridgeConfig::default(),
            Generator::from_seed(self.seed, self.jitter),
            self.history_capacity,
            self.read_timeout,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sab_common::config::{BridgeToml, LoggingConfig};

    fn toml() -> TomlConfig {
        TomlConfig {
            bridge: BridgeToml {
                host: Some("0.0.0.0".to_string()),
                port: Some(9000),
                history_capacity: Some(10),
                read_timeout_ms: None,
                seed: Some(5),
                jitter: Some(true),
                data_dir: None,
            },
            logging: LoggingConfig {
                level: Some("debug".to_string()),
            },
        }
    }

    #[test]
    fn test_defaults_only() {
        let settings = BridgeSettings::resolve(
            SettingsOverrides::default(),
            TomlConfig::default(),
            CompiledDefaults::for_current_platform(),
        );
        assert_eq!(settings.host, "127.0.0.1");
        assert_eq!(settings.port, 8081);
        assert_eq!(settings.history_capacity, 1000);
        assert_eq!(settings.read_timeout, Duration::from_millis(2000));
        assert!(settings.jitter);
        assert!(settings.seed.is_none());
    }

    #[test]
    fn test_toml_over_defaults() {
        let settings = BridgeSettings::resolve(
            SettingsOverrides::default(),
            toml(),
            CompiledDefaults::for_current_platform(),
        );
        assert_eq!(settings.port, 9000);
        assert_eq!(settings.history_capacity, 10);
        assert_eq!(settings.seed, Some(5));
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.read_timeout, Duration::from_millis(2000));
    }

    #[test]
    fn test_overrides_win() {
        let overrides = SettingsOverrides {
            port: Some(7000),
            no_jitter: true,
            log_level: Some("warn".to_string()),
            ..Default::default()
        };
        let settings =
            BridgeSettings::resolve(overrides, toml(), CompiledDefaults::for_current_platform());
        assert_eq!(settings.port, 7000);
        assert_eq!(settings.host, "0.0.0.0");
        assert!(!settings.jitter);
        assert_eq!(settings.log_level, "warn");
    }

    #[test]
    fn test_socket_addr() {
        let settings = BridgeSettings::resolve(
            SettingsOverrides::default(),
            TomlConfig::default(),
            CompiledDefaults::for_current_platform(),
        );
        assert_eq!(settings.socket_addr().unwrap().to_string(), "127.0.0.1:8081");

        let bad = BridgeSettings {
            host: "not a host".to_string(),
            ..settings
        };
        assert!(bad.socket_addr().is_err());
    }
}
