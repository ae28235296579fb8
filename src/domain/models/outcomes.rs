//! Structured measurement outcomes for a single iteration.
//!
//! Testing and analysis never surface "normal" failures as errors; a failing
//! unit test or a lint warning is data inside the outcome, consumed by the
//! scorer and fed back into refinement. Only infrastructure failures travel
//! through the gateway's error path, and the orchestrator re-encodes those
//! as failed outcomes so the loop can keep iterating.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TestOutcome
// ---------------------------------------------------------------------------

/// Severity of a lint finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LintSeverity {
    Info,
    Warning,
    Error,
}

/// A single lint finding with its location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintIssue {
    pub severity: LintSeverity,
    pub message: String,
    /// `file:line` style location, best effort.
    pub location: String,
}

impl LintIssue {
    /// Create a new lint issue.
    pub fn new(
        severity: LintSeverity,
        message: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            message: message.into(),
            location: location.into(),
        }
    }
}

/// One failed unit test with its failure message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestFailure {
    pub test_name: String,
    pub message: String,
}

/// Aggregate unit test counts plus per-failure detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UnitTestResults {
    pub passed: u32,
    pub failed: u32,
    pub failures: Vec<TestFailure>,
}

impl UnitTestResults {
    /// Results for a run where every test passed.
    pub fn all_passed(passed: u32) -> Self {
        Self {
            passed,
            failed: 0,
            failures: Vec::new(),
        }
    }
}

/// The tester's structured verdict on one implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestOutcome {
    /// Whether the sources parse at all.
    pub syntax_valid: bool,

    /// Whether every declared dependency resolved.
    pub dependencies_resolved: bool,

    /// Lint findings in detection order.
    pub lint_issues: Vec<LintIssue>,

    /// Unit test counts and failures.
    pub unit_test_results: UnitTestResults,
}

impl TestOutcome {
    /// A fully green outcome with the given pass count.
    pub fn passing(passed: u32) -> Self {
        Self {
            syntax_valid: true,
            dependencies_resolved: true,
            lint_issues: Vec::new(),
            unit_test_results: UnitTestResults::all_passed(passed),
        }
    }

    /// Outcome synthesized when the tester itself failed (provider error or
    /// timeout at the gateway). Marked syntactically invalid so the scorer's
    /// test contribution is zero and the failure message survives as a lint
    /// entry for the next refinement prompt.
    pub fn from_infrastructure_failure(message: impl Into<String>) -> Self {
        Self {
            syntax_valid: false,
            dependencies_resolved: false,
            lint_issues: vec![LintIssue::new(
                LintSeverity::Error,
                format!("tester unavailable: {}", message.into()),
                "<gateway>",
            )],
            unit_test_results: UnitTestResults::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// AnalysisOutcome
// ---------------------------------------------------------------------------

/// Category of a static-analysis finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    Complexity,
    Maintainability,
    Performance,
    Completeness,
    Style,
}

/// Severity of a static-analysis finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Info,
    Minor,
    Major,
    Critical,
}

/// A single analyzer finding with a suggested fix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedIssue {
    pub category: IssueCategory,
    pub severity: IssueSeverity,
    pub description: String,
    pub suggested_fix: String,
}

impl DetectedIssue {
    /// Create a new detected issue.
    pub fn new(
        category: IssueCategory,
        severity: IssueSeverity,
        description: impl Into<String>,
        suggested_fix: impl Into<String>,
    ) -> Self {
        Self {
            category,
            severity,
            description: description.into(),
            suggested_fix: suggested_fix.into(),
        }
    }
}

/// The analyzer's structured assessment of one implementation.
///
/// The three scores are normalized to `[0, 1]`; the scorer weights them into
/// the 0-100 quality score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub complexity_score: f64,
    pub maintainability_score: f64,
    pub performance_score: f64,
    pub detected_issues: Vec<DetectedIssue>,
}

impl AnalysisOutcome {
    /// Create an outcome with all scores clamped into `[0, 1]`.
    pub fn new(complexity: f64, maintainability: f64, performance: f64) -> Self {
        Self {
            complexity_score: complexity.clamp(0.0, 1.0),
            maintainability_score: maintainability.clamp(0.0, 1.0),
            performance_score: performance.clamp(0.0, 1.0),
            detected_issues: Vec::new(),
        }
    }

    /// Attach detected issues, returning `self` for chained construction.
    pub fn with_issues(mut self, issues: Vec<DetectedIssue>) -> Self {
        self.detected_issues = issues;
        self
    }

    /// Outcome synthesized when the analyzer itself failed at the gateway.
    /// All scores zero; the failure is recorded as a critical finding.
    pub fn from_infrastructure_failure(message: impl Into<String>) -> Self {
        Self::new(0.0, 0.0, 0.0).with_issues(vec![DetectedIssue::new(
            IssueCategory::Maintainability,
            IssueSeverity::Critical,
            format!("analyzer unavailable: {}", message.into()),
            "retry once the analysis provider recovers",
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passing_outcome() {
        let outcome = TestOutcome::passing(7);
        assert!(outcome.syntax_valid);
        assert!(outcome.dependencies_resolved);
        assert_eq!(outcome.unit_test_results.passed, 7);
        assert_eq!(outcome.unit_test_results.failed, 0);
    }

    #[test]
    fn test_infrastructure_failure_encoding() {
        let outcome = TestOutcome::from_infrastructure_failure("sandbox allocation failed");
        assert!(!outcome.syntax_valid);
        assert!(!outcome.dependencies_resolved);
        assert_eq!(outcome.lint_issues.len(), 1);
        assert!(outcome.lint_issues[0].message.contains("sandbox allocation"));
    }

    #[test]
    fn test_analysis_scores_clamped() {
        let outcome = AnalysisOutcome::new(1.7, -0.2, 0.5);
        assert!((outcome.complexity_score - 1.0).abs() < f64::EPSILON);
        assert!((outcome.maintainability_score - 0.0).abs() < f64::EPSILON);
        assert!((outcome.performance_score - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(IssueSeverity::Critical > IssueSeverity::Major);
        assert!(LintSeverity::Error > LintSeverity::Warning);
    }
}
