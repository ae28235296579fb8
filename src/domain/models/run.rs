//! Development run lifecycle types.
//!
//! A `DevelopmentRun` is created when orchestration starts, grows by
//! appending one [`IterationRecord`] per loop pass, and ends by fixing a
//! [`TerminalState`]. One run owns its ledger exclusively; nothing is ever
//! reordered or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::implementation::Implementation;
use super::ledger::IterationLedger;
use super::outcomes::{AnalysisOutcome, TestOutcome};
use super::specification::Specification;

// ---------------------------------------------------------------------------
// IterationRecord
// ---------------------------------------------------------------------------

/// Immutable record of one generate(or refine)→test→analyze pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    /// 0-based index, strictly increasing within a run.
    pub iteration_index: u32,

    /// The artifact this iteration produced.
    pub implementation: Implementation,

    /// The tester's verdict on the artifact.
    pub test_outcome: TestOutcome,

    /// The analyzer's assessment of the artifact.
    pub analysis_outcome: AnalysisOutcome,

    /// Quality score in `[0, 100]`, recomputed from this iteration's outcomes
    /// alone, never carried over or averaged across iterations.
    pub quality_score: f64,

    /// Wall-clock duration of the whole pass in milliseconds.
    pub duration_ms: u64,

    /// When the record was created.
    pub timestamp: DateTime<Utc>,
}

impl IterationRecord {
    /// Create a record stamped with the current time.
    pub fn new(
        iteration_index: u32,
        implementation: Implementation,
        test_outcome: TestOutcome,
        analysis_outcome: AnalysisOutcome,
        quality_score: f64,
        duration_ms: u64,
    ) -> Self {
        Self {
            iteration_index,
            implementation,
            test_outcome,
            analysis_outcome,
            quality_score,
            duration_ms,
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// TerminalState
// ---------------------------------------------------------------------------

/// How a development run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TerminalState {
    /// The quality target was reached or exceeded.
    ConvergedSuccess,

    /// All allowed iterations ran without reaching the target.
    ExhaustedIterations,

    /// The run could not continue: first generation failed, a refinement
    /// failed, or the ledger detected an ordering bug. Carries a message;
    /// the partial ledger is always preserved alongside.
    FatalError { message: String },

    /// Cooperative cancellation was requested between state transitions.
    Cancelled,
}

impl TerminalState {
    /// Whether this terminal state counts as a successful run.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::ConvergedSuccess)
    }
}

impl std::fmt::Display for TerminalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConvergedSuccess => write!(f, "converged"),
            Self::ExhaustedIterations => write!(f, "exhausted"),
            Self::FatalError { message } => write!(f, "fatal: {message}"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

// ---------------------------------------------------------------------------
// DevelopmentRun
// ---------------------------------------------------------------------------

/// A whole run: input specification, loop parameters, the ledger, and the
/// terminal state once reached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevelopmentRun {
    /// The immutable input specification.
    pub specification: Specification,

    /// Score the loop tries to reach, in `[0, 100]`.
    pub target_quality_score: f64,

    /// Upper bound on loop passes.
    pub max_iterations: u32,

    /// Append-only iteration history.
    pub ledger: IterationLedger,

    /// Set exactly once, when the run ends.
    pub terminal_state: Option<TerminalState>,

    /// The best implementation observed, set when the run ends.
    pub final_implementation: Option<Implementation>,

    /// When the run started.
    pub started_at: DateTime<Utc>,
}

impl DevelopmentRun {
    /// Create a run that has not iterated yet.
    pub fn new(specification: Specification, target_quality_score: f64, max_iterations: u32) -> Self {
        Self {
            specification,
            target_quality_score,
            max_iterations,
            ledger: IterationLedger::new(),
            terminal_state: None,
            final_implementation: None,
            started_at: Utc::now(),
        }
    }

    /// Build the caller-facing report. The final score and implementation
    /// come from `best_so_far`, not the last record, since a late refinement may
    /// regress and the caller should receive the best observed artifact.
    pub fn report(&self) -> RunReport {
        let best = self.ledger.best_so_far();
        RunReport {
            success: self
                .terminal_state
                .as_ref()
                .is_some_and(TerminalState::is_success),
            final_quality_score: best.map_or(0.0, |r| r.quality_score),
            iteration_count: self.ledger.len() as u32,
            terminal_state: self
                .terminal_state
                .clone()
                .unwrap_or(TerminalState::FatalError {
                    message: "run did not reach a terminal state".to_string(),
                }),
            final_implementation: self.final_implementation.clone(),
            ledger: self.ledger.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// RunReport
// ---------------------------------------------------------------------------

/// External report format for a finished run.
///
/// Serializing a report to JSON and parsing it back preserves iteration
/// ordering and scores exactly (f64 values round-trip losslessly through
/// serde_json).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub success: bool,
    pub final_quality_score: f64,
    pub iteration_count: u32,
    pub terminal_state: TerminalState,
    pub final_implementation: Option<Implementation>,
    pub ledger: IterationLedger,
}
