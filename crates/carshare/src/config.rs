//! Configuration management for carshare.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::net::SocketAddr;
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::lifecycle::LifecyclePolicy;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "carshare";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "carshare.db";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "CARSHARE_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `CARSHARE_`, sections separated
///    by `__`, e.g. `CARSHARE_POLICY__DELETE_REQUIRES_CANCEL=true`)
/// 2. TOML config file at `~/.config/carshare/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Rental lifecycle policy.
    pub policy: LifecyclePolicy,
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Listing configuration.
    pub listing: ListingConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/carshare/carshare.db`
    pub database_path: Option<PathBuf>,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the JSON API listens on.
    pub bind: String,
}

/// Listing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    /// Maximum rentals returned when browsing.
    pub page_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
        }
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self { page_size: 20 }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);
        Self::from_figment(Self::figment(&config_file))
    }

    /// The layered configuration sources for `config_file`.
    #[must_use]
    pub fn figment(config_file: &std::path::Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Extract and validate a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if extraction or validation fails.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        self.bind_addr()?;

        if self.listing.page_size == 0 {
            return Err(Error::ConfigValidation {
                message: "listing.page_size must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// The parsed server bind address.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `server.bind` is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server.bind.parse().map_err(|_| Error::ConfigValidation {
            message: format!("server.bind is not a socket address: {}", self.server.bind),
        })
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.storage.database_path.is_none());
        assert!(!config.policy.delete_requires_cancel);
        assert!(!config.policy.allow_edit_after_cancel);
        assert_eq!(config.server.bind, "127.0.0.1:3000");
        assert_eq!(config.listing.page_size, 20);
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_bad_bind() {
        let mut config = Config::default();
        config.server.bind = "localhost".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("server.bind"));
    }

    #[test]
    fn test_validate_zero_page_size() {
        let mut config = Config::default();
        config.listing.page_size = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("page_size"));
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        assert!(config
            .database_path()
            .to_string_lossy()
            .contains("carshare.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/db.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/db.sqlite")
        );
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("carshare"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert_eq!(result.unwrap(), Config::default());
    }

    #[test]
    fn test_load_toml_and_env_layers() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [policy]
                delete_requires_cancel = true

                [listing]
                page_size = 5
                "#,
            )?;
            jail.set_env("CARSHARE_LISTING__PAGE_SIZE", "7");
            jail.set_env("CARSHARE_SERVER__BIND", "0.0.0.0:8080");

            let config = Config::from_figment(Config::figment("config.toml".as_ref()))
                .map_err(|e| e.to_string())?;
            assert!(config.policy.delete_requires_cancel);
            assert!(!config.policy.allow_edit_after_cancel);
            assert_eq!(config.listing.page_size, 7);
            assert_eq!(config.server.bind, "0.0.0.0:8080");
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[listing]\npage_size = 0\n")?;
            let err = Config::from_figment(Config::figment("config.toml".as_ref())).unwrap_err();
            assert!(matches!(err, Error::ConfigValidation { .. }));
            Ok(())
        });
    }

    #[test]
    fn test_config_round_trips_through_toml_shape() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert!(json["policy"]["delete_requires_cancel"].is_boolean());
        assert!(json["server"]["bind"].is_string());
    }
}
