pub mod config;
pub mod implementation;
pub mod ledger;
pub mod outcomes;
pub mod run;
pub mod specification;

pub use config::{
    Config, GeneratorConfig, LoggingConfig, RateLimitConfig, RetryConfig, RunConfig, TimeoutConfig,
};
pub use implementation::Implementation;
pub use ledger::IterationLedger;
pub use outcomes::{
    AnalysisOutcome, DetectedIssue, IssueCategory, IssueSeverity, LintIssue, LintSeverity,
    TestFailure, TestOutcome, UnitTestResults,
};
pub use run::{DevelopmentRun, IterationRecord, RunReport, TerminalState};
pub use specification::{Constraint, ConstraintCategory, Scenario, Specification};
