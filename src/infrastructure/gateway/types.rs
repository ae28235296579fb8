//! Wire types for the protocol gateway.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::errors::ToolErrorKind;

/// Canonical tool names registered by the default provider wiring.
pub mod tool_names {
    pub const GENERATE: &str = "generate";
    pub const REFINE: &str = "refine";
    pub const TEST: &str = "test";
    pub const ANALYZE: &str = "analyze";
    pub const PACKAGE: &str = "package";
}

/// A single tool invocation travelling through the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Name the target provider was registered under.
    pub tool_name: String,

    /// Tool-specific arguments, decoded by the provider binding.
    pub arguments: Value,

    /// Correlation id, present in every log line for this call.
    pub request_id: Uuid,
}

impl ToolCallRequest {
    /// Create a request with a fresh correlation id.
    pub fn new(tool_name: impl Into<String>, arguments: Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
            request_id: Uuid::new_v4(),
        }
    }
}

/// Uniform result shape for every dispatch.
///
/// Dispatch itself never returns `Err`; provider failures, timeouts, and
/// panics all arrive as `Failure` values so one misbehaving provider cannot
/// take the loop down.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolCallResult {
    Success { content: Value },
    Failure { kind: ToolErrorKind, message: String },
}

impl ToolCallResult {
    /// Whether this result is a success.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// A contained tool failure, produced by provider bindings and by the
/// dispatcher itself (timeouts, panics, unknown tools).
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ToolFailure {
    pub kind: ToolErrorKind,
    pub message: String,
}

impl ToolFailure {
    /// A provider-side failure.
    pub fn provider(message: impl Into<String>) -> Self {
        Self {
            kind: ToolErrorKind::ProviderError,
            message: message.into(),
        }
    }

    /// An argument-decoding failure.
    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self {
            kind: ToolErrorKind::InvalidArguments,
            message: message.into(),
        }
    }
}

impl From<ToolFailure> for ToolCallResult {
    fn from(failure: ToolFailure) -> Self {
        Self::Failure {
            kind: failure.kind,
            message: failure.message,
        }
    }
}
