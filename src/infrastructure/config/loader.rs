use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::Config;

/// Config file read from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "hubcrawl.yaml";

/// Prefix of environment overrides; nested keys are split on `__`.
pub const ENV_PREFIX: &str = "HUBCRAWL_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid per_page: {0}. Must be between 1 and 100")]
    InvalidPerPage(u32),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_attempts: {0}. Cannot be 0")]
    InvalidMaxAttempts(u32),

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must not exceed max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Organization name is required (set org_name or pass --org)")]
    MissingOrganization,

    #[error("GitHub token is required (set github_token or pass --token)")]
    MissingToken,
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. `path`, or `hubcrawl.yaml` in the working directory (optional)
    /// 3. Environment variables (`HUBCRAWL_*` prefix, highest priority)
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        let config: Config = Self::figment(file)
            .extract()
            .with_context(|| format!("Failed to load configuration (file: {})", file.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn figment(file: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.per_page == 0 || config.per_page > 100 {
            return Err(ConfigError::InvalidPerPage(config.per_page));
        }

        if config.database.path.trim().is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.log_format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.log_format.clone()));
        }

        if config.retry.max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts(config.retry.max_attempts));
        }

        if config.retry.initial_backoff_ms > config.retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.retry.initial_backoff_ms,
                config.retry.max_backoff_ms,
            ));
        }

        Ok(())
    }

    /// Checks that only matter when a crawl is about to start.
    pub fn validate_for_crawl(config: &Config) -> Result<(), ConfigError> {
        if config.org_name.trim().is_empty() {
            return Err(ConfigError::MissingOrganization);
        }
        if config.github_token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        Ok(())
    }
}
