use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid rate limit: {0}. Must be positive")]
    InvalidRateLimit(f64),

    #[error("Invalid burst_size: {0}. Must be at least 1")]
    InvalidBurstSize(u32),

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must be <= max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Invalid target_quality_score: {0}. Must be between 0 and 100")]
    InvalidTargetScore(f64),

    #[error("Invalid max_iterations: {0}. Must be at least 1")]
    InvalidMaxIterations(u32),

    #[error("Invalid plateau_window: {0}. Must be at least 1 when plateau_stop is enabled")]
    InvalidPlateauWindow(usize),

    #[error("Invalid timeout for tool '{0}': must be at least 1 second")]
    InvalidTimeout(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .specforge/config.yaml (project config)
    /// 3. .specforge/local.yaml (local overrides, optional)
    /// 4. Environment variables (SPECFORGE_* prefix, highest priority)
    ///
    /// Configuration is project-local (pwd/.specforge/) so multiple projects
    /// on one machine can carry different settings.
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".specforge/config.yaml"))
            .merge(Yaml::file(".specforge/local.yaml"))
            .merge(Env::prefixed("SPECFORGE_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading.
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        match config.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => return Err(ConfigError::InvalidLogLevel(other.to_string())),
        }

        match config.logging.format.as_str() {
            "json" | "pretty" => {}
            other => return Err(ConfigError::InvalidLogFormat(other.to_string())),
        }

        if config.rate_limit.requests_per_second <= 0.0 {
            return Err(ConfigError::InvalidRateLimit(
                config.rate_limit.requests_per_second,
            ));
        }

        if config.rate_limit.burst_size == 0 {
            return Err(ConfigError::InvalidBurstSize(config.rate_limit.burst_size));
        }

        if config.retry.initial_backoff_ms > config.retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.retry.initial_backoff_ms,
                config.retry.max_backoff_ms,
            ));
        }

        if !(0.0..=100.0).contains(&config.run.target_quality_score) {
            return Err(ConfigError::InvalidTargetScore(
                config.run.target_quality_score,
            ));
        }

        if config.run.max_iterations == 0 {
            return Err(ConfigError::InvalidMaxIterations(config.run.max_iterations));
        }

        if config.run.plateau_stop && config.run.plateau_window == 0 {
            return Err(ConfigError::InvalidPlateauWindow(config.run.plateau_window));
        }

        if config.timeouts.default_seconds == 0 {
            return Err(ConfigError::InvalidTimeout("<default>".to_string()));
        }
        for (tool, seconds) in &config.timeouts.per_tool_seconds {
            if *seconds == 0 {
                return Err(ConfigError::InvalidTimeout(tool.clone()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ConfigLoader::validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_load_from_file_merges_over_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "run:\n  max_iterations: 9\ngenerator:\n  model: gpt-4o"
        )
        .unwrap();

        let config = ConfigLoader::load_from_file(file.path()).unwrap();
        assert_eq!(config.run.max_iterations, 9);
        assert_eq!(config.generator.model, "gpt-4o");
        // Untouched sections keep their defaults.
        assert_eq!(config.timeouts.for_tool("generate").as_secs(), 300);
    }

    #[test]
    fn test_invalid_target_rejected() {
        let mut config = Config::default();
        config.run.target_quality_score = 150.0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidTargetScore(_))
        ));
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let mut config = Config::default();
        config.run.max_iterations = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxIterations(0))
        ));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config
            .timeouts
            .per_tool_seconds
            .insert("generate".to_string(), 0);
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidTimeout(tool)) if tool == "generate"
        ));
    }
}
