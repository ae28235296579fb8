//! Configuration tree for Specforge.
//!
//! An explicit configuration value is built once at startup and passed into
//! provider construction; there is no process-wide mutable configuration
//! state behind the core loop.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Main configuration structure for Specforge.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Generator (model) provider configuration.
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Per-tool dispatch timeouts.
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Retry policy for transient generator HTTP failures.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Rate limiting for the generator provider.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Loop defaults (target score, iteration cap, plateau stop).
    #[serde(default)]
    pub run: RunConfig,
}

/// Generator (model) provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GeneratorConfig {
    /// Chat-completions endpoint base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier sent with each request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable holding the API key. The key itself never lives
    /// in config files.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Target framework tag requested from the generator.
    #[serde(default = "default_framework")]
    pub framework: String,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "SPECFORGE_API_KEY".to_string()
}

fn default_framework() -> String {
    "fastapi".to_string()
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            framework: default_framework(),
        }
    }
}

/// Per-tool dispatch timeouts in seconds.
///
/// Generation legitimately needs a much longer budget than test execution or
/// analysis; the gateway looks the budget up by tool name and falls back to
/// `default_seconds` for tools without an override.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TimeoutConfig {
    /// Fallback timeout for tools without an explicit entry.
    #[serde(default = "default_timeout_seconds")]
    pub default_seconds: u64,

    /// Tool name -> timeout seconds overrides.
    #[serde(default = "default_tool_overrides")]
    pub per_tool_seconds: BTreeMap<String, u64>,
}

const fn default_timeout_seconds() -> u64 {
    30
}

fn default_tool_overrides() -> BTreeMap<String, u64> {
    BTreeMap::from([
        ("generate".to_string(), 300),
        ("refine".to_string(), 300),
        ("test".to_string(), 60),
        ("analyze".to_string(), 60),
        ("package".to_string(), 30),
    ])
}

impl TimeoutConfig {
    /// Timeout for the given tool name.
    pub fn for_tool(&self, tool_name: &str) -> std::time::Duration {
        let seconds = self
            .per_tool_seconds
            .get(tool_name)
            .copied()
            .unwrap_or(self.default_seconds);
        std::time::Duration::from_secs(seconds)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            default_seconds: default_timeout_seconds(),
            per_tool_seconds: default_tool_overrides(),
        }
    }
}

/// Retry policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Maximum retry attempts for transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff duration in milliseconds.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff duration in milliseconds.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    1_000
}

const fn default_max_backoff_ms() -> u64 {
    30_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Rate limiting configuration for the generator provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RateLimitConfig {
    /// Sustained requests per second allowed.
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: f64,

    /// Burst capacity.
    #[serde(default = "default_burst_size")]
    pub burst_size: u32,
}

const fn default_requests_per_second() -> f64 {
    2.0
}

const fn default_burst_size() -> u32 {
    5
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_requests_per_second(),
            burst_size: default_burst_size(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty.
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Optional directory for rolling daily log files. Stderr-only when unset.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            directory: None,
        }
    }
}

/// Loop defaults, overridable per invocation from the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RunConfig {
    /// Quality score the loop tries to reach.
    #[serde(default = "default_target_quality_score")]
    pub target_quality_score: f64,

    /// Upper bound on loop passes.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Stop early when recent scores stop improving meaningfully.
    #[serde(default)]
    pub plateau_stop: bool,

    /// Plateau window size (records).
    #[serde(default = "default_plateau_window")]
    pub plateau_window: usize,

    /// Plateau epsilon (score spread considered flat).
    #[serde(default = "default_plateau_epsilon")]
    pub plateau_epsilon: f64,
}

const fn default_target_quality_score() -> f64 {
    80.0
}

const fn default_max_iterations() -> u32 {
    5
}

const fn default_plateau_window() -> usize {
    3
}

const fn default_plateau_epsilon() -> f64 {
    1.0
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            target_quality_score: default_target_quality_score(),
            max_iterations: default_max_iterations(),
            plateau_stop: false,
            plateau_window: default_plateau_window(),
            plateau_epsilon: default_plateau_epsilon(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.run.max_iterations, 5);
        assert!((config.run.target_quality_score - 80.0).abs() < f64::EPSILON);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.timeouts.for_tool("generate").as_secs(), 300);
        assert_eq!(config.timeouts.for_tool("unknown-tool").as_secs(), 30);
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
generator:
  model: gpt-4o
  framework: axum
timeouts:
  default_seconds: 10
  per_tool_seconds:
    generate: 600
run:
  target_quality_score: 90
  max_iterations: 8
";
        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");
        assert_eq!(config.generator.model, "gpt-4o");
        assert_eq!(config.generator.framework, "axum");
        assert_eq!(config.timeouts.for_tool("generate").as_secs(), 600);
        assert_eq!(config.timeouts.for_tool("test").as_secs(), 10);
        assert_eq!(config.run.max_iterations, 8);
    }
}
