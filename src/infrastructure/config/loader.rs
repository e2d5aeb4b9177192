use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Project config file looked up in the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "tc-image-migrate.yaml";

/// Prefix of environment variable overrides
pub const ENV_PREFIX: &str = "TC_IMAGE_MIGRATE_";

const MAX_SWEEP_CONCURRENCY: usize = 64;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid request_timeout_secs: {0}. Must be at least 1")]
    InvalidRequestTimeout(u64),

    #[error("Invalid connect_timeout_secs: {0}. Must be at least 1")]
    InvalidConnectTimeout(u64),

    #[error("Invalid sweep concurrency: {0}. Must be between 1 and 64")]
    InvalidConcurrency(usize),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: pretty, compact, json")]
    InvalidLogFormat(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. `tc-image-migrate.yaml` in the working directory (optional)
    /// 3. Environment variables (`TC_IMAGE_MIGRATE_*` prefix, highest priority)
    pub fn load() -> Result<Config> {
        Self::load_with(Figment::new().merge(Yaml::file(DEFAULT_CONFIG_FILE)))
    }

    /// Load configuration from a specific file, still honouring environment overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }

        Self::load_with(Figment::new().merge(Yaml::file(path)))
            .with_context(|| format!("Failed to load config from {}", path.display()))
    }

    fn load_with(file: Figment) -> Result<Config> {
        let config: Config = Figment::new()
            // 1. Start with programmatic defaults
            .merge(Serialized::defaults(Config::default()))
            // 2. Merge the config file
            .merge(file)
            // 3. Merge environment variables (highest priority)
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.http.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidRequestTimeout(
                config.http.request_timeout_secs,
            ));
        }

        if config.http.connect_timeout_secs == 0 {
            return Err(ConfigError::InvalidConnectTimeout(
                config.http.connect_timeout_secs,
            ));
        }

        if config.sweep.concurrency == 0 || config.sweep.concurrency > MAX_SWEEP_CONCURRENCY {
            return Err(ConfigError::InvalidConcurrency(config.sweep.concurrency));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["pretty", "compact", "json"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.http.request_timeout_secs, 30);
        assert_eq!(config.http.connect_timeout_secs, 10);
        assert_eq!(config.sweep.concurrency, 8);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "compact");
        assert!(config.logging.log_dir.is_none());
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
http:
  request_timeout_secs: 60
sweep:
  concurrency: 16
logging:
  level: debug
  format: json
  log_dir: /var/log/tc-image-migrate
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.http.request_timeout_secs, 60);
        assert_eq!(config.http.connect_timeout_secs, 10);
        assert_eq!(config.sweep.concurrency, 16);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
        assert_eq!(
            config.logging.log_dir.as_deref(),
            Some(Path::new("/var/log/tc-image-migrate"))
        );

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.http.request_timeout_secs = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidRequestTimeout(0))
        ));

        let mut config = Config::default();
        config.http.connect_timeout_secs = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidConnectTimeout(0))
        ));
    }

    #[test]
    fn test_validate_concurrency_bounds() {
        let mut config = Config::default();
        config.sweep.concurrency = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidConcurrency(0))
        ));

        config.sweep.concurrency = 65;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidConcurrency(65))
        ));

        config.sweep.concurrency = 64;
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();

        match ConfigLoader::validate(&config) {
            Err(ConfigError::InvalidLogLevel(level)) => assert_eq!(level, "verbose"),
            other => panic!("Expected InvalidLogLevel error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();

        match ConfigLoader::validate(&config) {
            Err(ConfigError::InvalidLogFormat(format)) => assert_eq!(format, "xml"),
            other => panic!("Expected InvalidLogFormat error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_from_file_with_env_override() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "sweep:\n  concurrency: 4\nhttp:\n  request_timeout_secs: 45"
        )
        .expect("write config");

        temp_env::with_vars(
            [("TC_IMAGE_MIGRATE_SWEEP__CONCURRENCY", Some("12"))],
            || {
                let config = ConfigLoader::load_from_file(file.path()).expect("config loads");
                assert_eq!(config.sweep.concurrency, 12);
                assert_eq!(config.http.request_timeout_secs, 45);
            },
        );
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = ConfigLoader::load_from_file(dir.path().join("absent.yaml")).unwrap_err();
        assert!(err.downcast_ref::<ConfigError>().is_some());
    }

    #[test]
    fn test_invalid_file_value_fails_validation() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "logging:\n  format: xml").expect("write config");

        temp_env::with_vars_unset(["TC_IMAGE_MIGRATE_LOGGING__FORMAT"], || {
            let err = ConfigLoader::load_from_file(file.path()).unwrap_err();
            let root = err.root_cause().to_string();
            assert!(root.contains("Invalid log format"), "unexpected error: {root}");
        });
    }
}
