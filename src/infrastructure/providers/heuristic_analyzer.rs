//! Offline heuristic Analyzer provider.
//!
//! Derives the three normalized analysis scores from structural measurements
//! of the source text: branch density and function length for complexity,
//! line length and documentation for maintainability, nested loops and
//! blocking sleeps for performance. Incompleteness markers surface as
//! Completeness findings.

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::domain::models::{
    AnalysisOutcome, DetectedIssue, Implementation, IssueCategory, IssueSeverity,
};
use crate::domain::ports::Analyzer;
use crate::services::scorer::{scan_markers, MarkerBand};

const BRANCH_KEYWORDS: &[&str] = &["if ", "elif ", "for ", "while ", "except ", "match ", "case "];
const LONG_FUNCTION_LINES: usize = 50;
const LONG_LINE: usize = 120;

/// Heuristic analyzer with no external toolchain.
#[derive(Debug, Default)]
pub struct HeuristicAnalyzer;

impl HeuristicAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Analyzer for HeuristicAnalyzer {
    async fn analyze(&self, implementation: &Implementation) -> Result<AnalysisOutcome> {
        let mut issues = Vec::new();

        let complexity = complexity_score(implementation, &mut issues);
        let maintainability = maintainability_score(implementation, &mut issues);
        let performance = performance_score(implementation, &mut issues);

        for hit in scan_markers(implementation) {
            let severity = match hit.band {
                MarkerBand::HardUnimplemented => IssueSeverity::Critical,
                MarkerBand::Stub => IssueSeverity::Major,
                MarkerBand::Todo => IssueSeverity::Minor,
            };
            issues.push(DetectedIssue::new(
                IssueCategory::Completeness,
                severity,
                format!("incomplete code at {}:{}", hit.file, hit.line),
                "replace the placeholder with a real implementation",
            ));
        }

        debug!(
            complexity,
            maintainability,
            performance,
            issues = issues.len(),
            "analysis complete"
        );

        Ok(AnalysisOutcome::new(complexity, maintainability, performance).with_issues(issues))
    }
}

fn code_lines(implementation: &Implementation) -> usize {
    implementation
        .source_files
        .values()
        .flat_map(|content| content.lines())
        .filter(|line| !line.trim().is_empty())
        .count()
}

/// 1.0 for straight-line code, decaying with branch density and long
/// function bodies.
fn complexity_score(implementation: &Implementation, issues: &mut Vec<DetectedIssue>) -> f64 {
    let total_lines = code_lines(implementation).max(1);
    let mut branches = 0usize;
    let mut longest_function = 0usize;

    for (file, content) in &implementation.source_files {
        let mut current_function = 0usize;
        for line in content.lines() {
            let trimmed = line.trim_start();
            if BRANCH_KEYWORDS.iter().any(|kw| trimmed.starts_with(kw)) {
                branches += 1;
            }
            if trimmed.starts_with("def ") || trimmed.starts_with("async def ") {
                current_function = 0;
            } else if !trimmed.is_empty() {
                current_function += 1;
            }
            longest_function = longest_function.max(current_function);
        }
        if longest_function > LONG_FUNCTION_LINES {
            issues.push(DetectedIssue::new(
                IssueCategory::Complexity,
                IssueSeverity::Minor,
                format!("{file} contains a function body over {LONG_FUNCTION_LINES} lines"),
                "split the function into smaller units",
            ));
        }
    }

    let branch_density = branches as f64 / total_lines as f64;
    let length_penalty = if longest_function > LONG_FUNCTION_LINES {
        0.2
    } else {
        0.0
    };
    (1.0 - branch_density * 2.0 - length_penalty).clamp(0.0, 1.0)
}

/// 1.0 for short documented lines, reduced by long lines and missing
/// module docstrings.
fn maintainability_score(implementation: &Implementation, issues: &mut Vec<DetectedIssue>) -> f64 {
    let total_lines = code_lines(implementation).max(1);
    let mut long_lines = 0usize;
    let mut undocumented_files = 0usize;

    for (file, content) in &implementation.source_files {
        long_lines += content.lines().filter(|line| line.len() > LONG_LINE).count();

        let is_python = std::path::Path::new(file)
            .extension()
            .is_some_and(|ext| ext == "py");
        let has_doc = content.trim_start().starts_with("\"\"\"")
            || content.lines().any(|line| line.trim_start().starts_with('#'));
        if is_python && !has_doc {
            undocumented_files += 1;
            issues.push(DetectedIssue::new(
                IssueCategory::Maintainability,
                IssueSeverity::Info,
                format!("{file} has no docstring or comments"),
                "add a module docstring describing the file",
            ));
        }
    }

    let long_line_ratio = long_lines as f64 / total_lines as f64;
    let doc_penalty = undocumented_files as f64 * 0.1;
    (1.0 - long_line_ratio * 2.0 - doc_penalty).clamp(0.0, 1.0)
}

/// 1.0 unless nested loops or blocking sleeps are present.
fn performance_score(implementation: &Implementation, issues: &mut Vec<DetectedIssue>) -> f64 {
    let mut nested_loops = 0usize;
    let mut blocking_sleeps = 0usize;

    for (file, content) in &implementation.source_files {
        let mut loop_indents: Vec<usize> = Vec::new();
        for (line_number, line) in content.lines().enumerate() {
            let indent = line.len() - line.trim_start().len();
            let trimmed = line.trim_start();

            loop_indents.retain(|&outer| indent > outer || trimmed.is_empty());
            if trimmed.starts_with("for ") || trimmed.starts_with("while ") {
                if !loop_indents.is_empty() {
                    nested_loops += 1;
                    issues.push(DetectedIssue::new(
                        IssueCategory::Performance,
                        IssueSeverity::Minor,
                        format!("nested loop at {file}:{}", line_number + 1),
                        "consider flattening or precomputing the inner loop",
                    ));
                }
                loop_indents.push(indent);
            }

            if trimmed.contains("time.sleep(") {
                blocking_sleeps += 1;
                issues.push(DetectedIssue::new(
                    IssueCategory::Performance,
                    IssueSeverity::Major,
                    format!("blocking sleep at {file}:{}", line_number + 1),
                    "use an async wait or remove the sleep",
                ));
            }
        }
    }

    (1.0 - nested_loops as f64 * 0.15 - blocking_sleeps as f64 * 0.25).clamp(0.0, 1.0)
}
