//! Quality scoring for one iteration.
//!
//! The score is a pure function of the iteration's own outcomes. Weighting:
//! tests 40, code quality 40, performance 20, then a completeness penalty
//! for leftover placeholder markers, clamped into [0, 100]. Nothing here
//! reads the ledger; two iterations with equal outcomes always score equally.

use crate::domain::models::{AnalysisOutcome, Implementation, TestOutcome};

const TEST_WEIGHT: f64 = 40.0;
const QUALITY_WEIGHT: f64 = 40.0;
const PERFORMANCE_WEIGHT: f64 = 20.0;

/// Severity band of an incompleteness marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerBand {
    /// Code that raises or returns a not-implemented signal.
    HardUnimplemented,
    /// Placeholder bodies standing in for real logic.
    Stub,
    /// Deferred-work annotations.
    Todo,
}

impl MarkerBand {
    /// Penalty points per occurrence.
    pub fn penalty(self) -> f64 {
        match self {
            Self::HardUnimplemented => 50.0,
            Self::Stub => 40.0,
            Self::Todo => 30.0,
        }
    }
}

/// One incompleteness marker found in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerHit {
    pub file: String,
    pub line: usize,
    pub band: MarkerBand,
}

/// Scan all source files for incompleteness markers.
///
/// At most one hit is recorded per line, at the most severe band that
/// matches, so `raise NotImplementedError` does not also count as its
/// `NotImplemented` substring.
pub fn scan_markers(implementation: &Implementation) -> Vec<MarkerHit> {
    let mut hits = Vec::new();
    for (file, content) in &implementation.source_files {
        for (index, line) in content.lines().enumerate() {
            if let Some(band) = classify_line(line) {
                hits.push(MarkerHit {
                    file: file.clone(),
                    line: index + 1,
                    band,
                });
            }
        }
    }
    hits
}

fn classify_line(line: &str) -> Option<MarkerBand> {
    let trimmed = line.trim();
    if trimmed.contains("raise NotImplementedError")
        || trimmed.contains("NotImplemented")
        || trimmed.contains("todo!(")
        || trimmed.contains("unimplemented!(")
    {
        return Some(MarkerBand::HardUnimplemented);
    }
    if trimmed == "..."
        || trimmed.starts_with("pass  # ")
        || trimmed.contains("# Not implemented")
    {
        return Some(MarkerBand::Stub);
    }
    if trimmed.contains("TODO:") || trimmed.contains("FIXME:") || trimmed.contains("XXX:") {
        return Some(MarkerBand::Todo);
    }
    None
}

/// Total completeness penalty for an implementation.
pub fn completeness_penalty(implementation: &Implementation) -> f64 {
    scan_markers(implementation)
        .iter()
        .map(|hit| hit.band.penalty())
        .sum()
}

/// Compute the quality score for one iteration.
pub fn score(
    implementation: &Implementation,
    test_outcome: &TestOutcome,
    analysis_outcome: &AnalysisOutcome,
) -> f64 {
    let test_contribution =
        if !test_outcome.syntax_valid || !test_outcome.dependencies_resolved {
            0.0
        } else {
            let results = &test_outcome.unit_test_results;
            if results.failed == 0 {
                TEST_WEIGHT
            } else {
                let total = (results.passed + results.failed).max(1);
                TEST_WEIGHT * f64::from(results.passed) / f64::from(total)
            }
        };

    let quality_contribution = QUALITY_WEIGHT
        * (analysis_outcome.complexity_score + analysis_outcome.maintainability_score)
        / 2.0;

    let performance_contribution = PERFORMANCE_WEIGHT * analysis_outcome.performance_score;

    let raw = test_contribution + quality_contribution + performance_contribution
        - completeness_penalty(implementation);
    raw.clamp(0.0, 100.0)
}
