//! Tool-provider port traits and their typed call contracts.
//!
//! Four capability contracts back the development loop: Generator, Tester,
//! Analyzer, Packager. Concrete implementations live in
//! `infrastructure::providers`; the loop only ever sees these traits through
//! the protocol gateway. The serde argument structs here are the wire shapes
//! the gateway bindings decode, so the tool-call contract is checked by the
//! type system rather than by convention.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::models::{AnalysisOutcome, Implementation, Specification, TestOutcome};

// ---------------------------------------------------------------------------
// Provider traits
// ---------------------------------------------------------------------------

/// Generates and refines implementations.
///
/// The returned [`Implementation`] must carry at least one non-empty source
/// file, or the call counts as failed.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produce the first implementation from a specification.
    async fn generate(&self, specification: &Specification) -> anyhow::Result<Implementation>;

    /// Produce the next implementation from the immediately preceding
    /// iteration's artifact and outcomes. Always receives exactly one
    /// iteration of feedback, never an aggregate, which bounds prompt size
    /// and keeps the contract stateless per call.
    async fn refine(
        &self,
        current: &Implementation,
        test_outcome: &TestOutcome,
        analysis_outcome: &AnalysisOutcome,
        target_quality_score: f64,
    ) -> anyhow::Result<Implementation>;
}

/// Runs tests against an implementation.
///
/// Ordinary failures (invalid syntax, failing tests) are data inside the
/// returned [`TestOutcome`]; `Err` is reserved for infrastructure failures
/// and surfaces as a gateway `ProviderError`.
#[async_trait]
pub trait Tester: Send + Sync {
    async fn run(&self, implementation: &Implementation) -> anyhow::Result<TestOutcome>;
}

/// Statically analyzes an implementation.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, implementation: &Implementation) -> anyhow::Result<AnalysisOutcome>;
}

/// Packages a converged implementation into a deployable artifact
/// description. Only invoked after a successful run.
#[async_trait]
pub trait Packager: Send + Sync {
    async fn package(&self, implementation: &Implementation) -> anyhow::Result<Value>;
}

// ---------------------------------------------------------------------------
// Typed call arguments (wire shapes decoded by the gateway bindings)
// ---------------------------------------------------------------------------

/// Arguments for the `generate` tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateArgs {
    pub specification: Specification,
}

/// Arguments for the `refine` tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefineArgs {
    pub current_implementation: Implementation,
    pub test_outcome: TestOutcome,
    pub analysis_outcome: AnalysisOutcome,
    pub target_quality_score: f64,
}

/// Arguments for the `test` tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestArgs {
    pub implementation: Implementation,
}

/// Arguments for the `analyze` tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeArgs {
    pub implementation: Implementation,
}

/// Arguments for the `package` tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageArgs {
    pub implementation: Implementation,
}
