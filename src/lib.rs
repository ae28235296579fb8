//! Specforge - iterative spec-to-code development loop
//!
//! Specforge turns a behavioral specification (Given/When/Then scenarios plus
//! non-functional constraints) into generated source code, then iteratively
//! tests, analyzes, scores, and refines it until a quality target is reached
//! or the iteration budget runs out.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Specification, implementation, outcome, and
//!   run models, the iteration ledger, error taxonomy, provider port traits
//! - **Application Layer** (`application`): The iterative orchestrator
//! - **Service Layer** (`services`): Quality scoring
//! - **Infrastructure Layer** (`infrastructure`): Protocol gateway, tool
//!   providers, configuration, logging, spec loading
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use specforge::application::{IterativeOrchestrator, RunOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Wire providers into a gateway, then drive a run
//!     Ok(())
//! }
//! ```

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::{CancelHandle, IterativeOrchestrator, RunOptions};
pub use domain::errors::{GatewayError, LedgerError, RunError, ToolErrorKind};
pub use domain::models::{
    AnalysisOutcome, Config, DevelopmentRun, Implementation, IterationLedger, IterationRecord,
    RunReport, Scenario, Specification, TerminalState, TestOutcome,
};
pub use domain::ports::{Analyzer, Generator, Packager, Tester};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use infrastructure::gateway::{GatewayClient, ProtocolGateway, ToolCallRequest, ToolCallResult};
