//! Error taxonomy for the Specforge development loop.
//!
//! Recoverable conditions (failing tests, lint findings, slow analysis) are
//! data inside the outcome structures, not errors. Only conditions that leave
//! a run with no valid implementation to iterate on, or that indicate an
//! internal bug, surface through these types.

use thiserror::Error;

/// The kind of a gateway-contained tool failure.
///
/// Both `UnknownTool` and `ProviderError` are recoverable mid-run: the
/// orchestrator treats them as the current phase failing, not as run-fatal,
/// except during first generation and refinement where no valid artifact
/// would remain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    /// No provider is registered under the requested name.
    UnknownTool,

    /// The provider failed, panicked, or exceeded its dispatch timeout.
    ProviderError,

    /// The request arguments did not match the tool's argument schema.
    InvalidArguments,
}

impl std::fmt::Display for ToolErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownTool => write!(f, "unknown_tool"),
            Self::ProviderError => write!(f, "provider_error"),
            Self::InvalidArguments => write!(f, "invalid_arguments"),
        }
    }
}

/// Gateway registration errors.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Tool already registered: {0}")]
    DuplicateTool(String),
}

/// Ledger integrity errors. Always indicate an orchestrator bug; never
/// recovered from.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Out-of-order ledger append: expected iteration {expected}, got {actual}")]
    OutOfOrder { expected: u32, actual: u32 },
}

/// Run-level errors surfaced to the caller before or outside the loop.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_error_kind_serde() {
        let json = serde_json::to_string(&ToolErrorKind::ProviderError).unwrap();
        assert_eq!(json, "\"provider_error\"");
        let back: ToolErrorKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ToolErrorKind::ProviderError);
    }

    #[test]
    fn test_error_messages() {
        let err = RunError::InvalidConfiguration("max_iterations must be >= 1".into());
        assert!(err.to_string().contains("max_iterations"));

        let err = LedgerError::OutOfOrder {
            expected: 2,
            actual: 4,
        };
        assert!(err.to_string().contains("expected iteration 2"));
    }
}
