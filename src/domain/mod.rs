//! Domain layer for the Specforge iterative development loop.
//!
//! This module contains the core data model, error taxonomy, and the
//! tool-provider port traits the orchestrator depends on.

pub mod errors;
pub mod models;
pub mod ports;

// Re-export error types for convenient access
pub use errors::{LedgerError, RunError, ToolErrorKind};
