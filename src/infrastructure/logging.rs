//! Tracing subscriber setup.
//!
//! Stderr output in the configured format, plus an optional rolling daily
//! JSON log file. Returns a guard that must stay alive for the process
//! lifetime so the non-blocking file writer flushes on shutdown.

use anyhow::{anyhow, Result};
use std::io;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::domain::models::LoggingConfig;

/// Keeps the non-blocking writer alive.
pub struct LoggerGuard {
    _guard: Option<WorkerGuard>,
}

/// Initialize global logging from config. Call once at startup.
pub fn init(config: &LoggingConfig) -> Result<LoggerGuard> {
    let default_level = parse_log_level(&config.level)?;
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let guard = if let Some(directory) = &config.directory {
        let file_appender = rolling::daily(directory, "specforge.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        // File output is always JSON for downstream tooling.
        let file_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .with_filter(env_filter);

        let stderr_filter = EnvFilter::builder()
            .with_default_directive(default_level.into())
            .from_env_lossy();
        let registry = tracing_subscriber::registry().with(file_layer);
        if config.format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(io::stderr)
                        .with_filter(stderr_filter),
                )
                .init();
        } else {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(io::stderr)
                        .with_filter(stderr_filter),
                )
                .init();
        }
        Some(guard)
    } else {
        if config.format == "json" {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(io::stderr)
                        .with_filter(env_filter),
                )
                .init();
        } else {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(io::stderr)
                        .with_filter(env_filter),
                )
                .init();
        }
        None
    };

    Ok(LoggerGuard { _guard: guard })
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(anyhow!("invalid log level: {other}")),
    }
}
