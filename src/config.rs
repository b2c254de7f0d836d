use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::OnceLock;
use thiserror::Error;

/// Version reported by `/health` when `APP_VERSION` is unset.
pub const DEFAULT_APP_VERSION: &str = "1.0.0";
/// Environment name reported by `/health` when `ENVIRONMENT` is unset.
pub const DEFAULT_ENVIRONMENT: &str = "development";
/// Port the HTTP server listens on when `SERVER_PORT` is unset.
pub const DEFAULT_SERVER_PORT: u16 = 8000;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the user registry server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Application version reported by the health endpoint.
    pub app_version: String,
    /// Deployment environment name reported by the health endpoint.
    pub environment: String,
    /// Address the HTTP server binds to.
    pub server_host: IpAddr,
    /// Port the HTTP server binds to.
    pub server_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_version: DEFAULT_APP_VERSION.to_string(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            server_host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            server_port: DEFAULT_SERVER_PORT,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults for unset keys.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// `APP_VERSION` and `ENVIRONMENT` are reported exactly as set, even when empty. Blank
    /// `SERVER_HOST`/`SERVER_PORT` values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        Ok(Self {
            app_version: lookup("APP_VERSION").unwrap_or(defaults.app_version),
            environment: lookup("ENVIRONMENT").unwrap_or(defaults.environment),
            server_host: optional("SERVER_HOST")
                .map(|value| {
                    value
                        .trim()
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_HOST".into()))
                })
                .transpose()?
                .unwrap_or(defaults.server_host),
            server_port: optional("SERVER_PORT")
                .map(|value| {
                    value
                        .trim()
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?
                .unwrap_or(defaults.server_port),
        })
    }

    /// Socket address the HTTP listener should bind.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server_host, self.server_port)
    }
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    Ok(CONFIG.get_or_init(|| config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup_from(&[])).expect("config");
        assert_eq!(config.app_version, "1.0.0");
        assert_eq!(config.environment, "development");
        assert_eq!(config.bind_addr().to_string(), "0.0.0.0:8000");
    }

    #[test]
    fn overrides_are_read() {
        let config = Config::from_lookup(lookup_from(&[
            ("APP_VERSION", "2.3.4"),
            ("ENVIRONMENT", "staging"),
            ("SERVER_HOST", "127.0.0.1"),
            ("SERVER_PORT", "9090"),
        ]))
        .expect("config");
        assert_eq!(config.app_version, "2.3.4");
        assert_eq!(config.environment, "staging");
        assert_eq!(config.bind_addr().to_string(), "127.0.0.1:9090");
    }

    #[test]
    fn empty_version_and_environment_are_reported_as_set() {
        let config =
            Config::from_lookup(lookup_from(&[("ENVIRONMENT", ""), ("APP_VERSION", "")]))
                .expect("config");
        assert_eq!(config.environment, "");
        assert_eq!(config.app_version, "");
    }

    #[test]
    fn blank_bind_settings_fall_back_to_defaults() {
        let config =
            Config::from_lookup(lookup_from(&[("SERVER_HOST", " "), ("SERVER_PORT", "")]))
                .expect("config");
        assert_eq!(config.server_port, DEFAULT_SERVER_PORT);
        assert_eq!(config.bind_addr().to_string(), "0.0.0.0:8000");
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("SERVER_PORT", "eighty")]))
            .expect_err("invalid port");
        assert!(matches!(err, ConfigError::InvalidValue(ref key) if key == "SERVER_PORT"));
    }

    #[test]
    fn invalid_host_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("SERVER_HOST", "not-an-ip")]))
            .expect_err("invalid host");
        assert!(matches!(err, ConfigError::InvalidValue(ref key) if key == "SERVER_HOST"));
    }
}
