//! `specforge score` - one-shot scoring of an existing implementation.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use serde::Serialize;

use crate::domain::models::{AnalysisOutcome, Config, Implementation, TestOutcome};
use crate::domain::ports::{Analyzer, Tester};
use crate::infrastructure::gateway::bindings::{AnalyzeBinding, TestBinding};
use crate::infrastructure::gateway::{tool_names, GatewayClient, ProtocolGateway};
use crate::infrastructure::providers::{HeuristicAnalyzer, StaticTester};
use crate::services::scorer;

const SOURCE_EXTENSIONS: &[&str] = &["py", "rs", "js", "ts", "go"];

#[derive(Debug, Serialize)]
struct ScoreReport {
    quality_score: f64,
    test_outcome: TestOutcome,
    analysis_outcome: AnalysisOutcome,
    files: Vec<String>,
}

pub async fn execute(
    directory: String,
    framework: String,
    config: Config,
    json_mode: bool,
) -> Result<()> {
    let implementation = load_directory(Path::new(&directory), &framework)?;

    let tester: Arc<dyn Tester> = Arc::new(StaticTester::new());
    let analyzer: Arc<dyn Analyzer> = Arc::new(HeuristicAnalyzer::new());

    let mut gateway = ProtocolGateway::new(config.timeouts.clone());
    gateway.register(tool_names::TEST, Arc::new(TestBinding(tester)))?;
    gateway.register(tool_names::ANALYZE, Arc::new(AnalyzeBinding(analyzer)))?;
    let client = GatewayClient::new(Arc::new(gateway));

    let test_outcome = client
        .test(&implementation)
        .await
        .map_err(|f| anyhow::anyhow!("{f}"))?;
    let analysis_outcome = client
        .analyze(&implementation)
        .await
        .map_err(|f| anyhow::anyhow!("{f}"))?;
    let quality_score = scorer::score(&implementation, &test_outcome, &analysis_outcome);

    let report = ScoreReport {
        quality_score,
        test_outcome,
        analysis_outcome,
        files: implementation.source_files.keys().cloned().collect(),
    };

    if json_mode {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", render(&report));
    }
    Ok(())
}

fn load_directory(directory: &Path, framework: &str) -> Result<Implementation> {
    let mut implementation = Implementation::new(framework);
    let entries = std::fs::read_dir(directory)
        .with_context(|| format!("failed to read directory {}", directory.display()))?;

    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let has_source_extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext));
        if !has_source_extension {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        implementation = implementation.with_file(name, content);
    }

    if !implementation.has_usable_content() {
        bail!(
            "no source files found in {} (looked for: {})",
            directory.display(),
            SOURCE_EXTENSIONS.join(", ")
        );
    }
    Ok(implementation)
}

fn render(report: &ScoreReport) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Metric", "Value"]);
    table.add_row(vec![
        "Quality score".to_string(),
        format!("{:.1}", report.quality_score),
    ]);
    table.add_row(vec![
        "Syntax valid".to_string(),
        report.test_outcome.syntax_valid.to_string(),
    ]);
    table.add_row(vec![
        "Dependencies resolved".to_string(),
        report.test_outcome.dependencies_resolved.to_string(),
    ]);
    let results = &report.test_outcome.unit_test_results;
    table.add_row(vec![
        "Unit tests".to_string(),
        format!("{} passed, {} failed", results.passed, results.failed),
    ]);
    table.add_row(vec![
        "Lint findings".to_string(),
        report.test_outcome.lint_issues.len().to_string(),
    ]);
    table.add_row(vec![
        "Analysis findings".to_string(),
        report.analysis_outcome.detected_issues.len().to_string(),
    ]);

    let mut out = table.to_string();
    out.push('\n');
    for issue in &report.analysis_outcome.detected_issues {
        out.push_str(&format!("- {}\n", issue.description));
    }
    out
}
