//! End-to-end tests of the iterative development loop over scripted
//! providers: convergence, exhaustion, fatal failures, containment of
//! tester outages, and cooperative cancellation.

use std::sync::Arc;

use specforge::application::{IterativeOrchestrator, RunOptions};
use specforge::domain::models::{
    AnalysisOutcome, Implementation, Scenario, Specification, TerminalState, TestOutcome,
    TimeoutConfig,
};
use specforge::domain::ports::{Analyzer, Generator, Packager, Tester};
use specforge::domain::RunError;
use specforge::infrastructure::gateway::{register_standard_tools, GatewayClient, ProtocolGateway};
use specforge::infrastructure::providers::{
    ScriptedAnalyzer, ScriptedGenerator, ScriptedPackager, ScriptedTester,
};

fn specification() -> Specification {
    Specification::from_scenarios(vec![Scenario::new(
        "health_check",
        "the service is running",
        "GET /health is requested",
        "a 200 response is returned",
    )])
}

fn clean_implementation(version: &str) -> Implementation {
    Implementation::new("fastapi").with_file("main.py", format!("app_version = \"{version}\"\n"))
}

fn client_with(
    generator: Arc<dyn Generator>,
    tester: Arc<dyn Tester>,
    analyzer: Arc<dyn Analyzer>,
) -> GatewayClient {
    let packager: Arc<dyn Packager> = Arc::new(ScriptedPackager::new());
    let mut gateway = ProtocolGateway::new(TimeoutConfig::default());
    register_standard_tools(&mut gateway, generator, tester, analyzer, packager)
        .expect("tool registration should succeed");
    GatewayClient::new(Arc::new(gateway))
}

fn options(target: f64, max_iterations: u32) -> RunOptions {
    RunOptions {
        target_quality_score: target,
        max_iterations,
        include_packaging: false,
        plateau_stop: false,
        plateau_window: 3,
        plateau_epsilon: 1.0,
    }
}

// Passing tests contribute 40; the analysis pair contributes 40 * avg; the
// performance term 20 * p. These helpers pick analysis values for an exact
// total with a clean (marker-free) implementation.
fn analysis_for(quality_avg: f64, performance: f64) -> AnalysisOutcome {
    AnalysisOutcome::new(quality_avg, quality_avg, performance)
}

#[tokio::test]
async fn test_run_converges_once_target_reached() {
    // Iteration 0 scores 50, iteration 1 scores 75 against a target of 70.
    let generator = Arc::new(ScriptedGenerator::new(vec![
        clean_implementation("v1"),
        clean_implementation("v2"),
    ]));
    let tester = Arc::new(ScriptedTester::new(vec![
        TestOutcome::passing(3),
        TestOutcome::passing(3),
    ]));
    let analyzer = Arc::new(ScriptedAnalyzer::new(vec![
        analysis_for(0.25, 0.0),
        analysis_for(0.625, 0.5),
    ]));

    let (orchestrator, _cancel) = IterativeOrchestrator::new(client_with(generator, tester, analyzer));
    let report = orchestrator
        .run(specification(), options(70.0, 5))
        .await
        .expect("run should produce a report");

    assert!(report.success);
    assert_eq!(report.terminal_state, TerminalState::ConvergedSuccess);
    assert_eq!(report.iteration_count, 2);
    assert!((report.final_quality_score - 75.0).abs() < 1e-9);
    let final_implementation = report.final_implementation.expect("converged run has artifact");
    assert_eq!(final_implementation.source_files["main.py"], "app_version = \"v2\"\n");
}

#[tokio::test]
async fn test_plateaued_run_exhausts_iterations() {
    // Every iteration scores exactly 40 against a target of 90.
    let implementations: Vec<Implementation> =
        (1..=5).map(|i| clean_implementation(&format!("v{i}"))).collect();
    let generator = Arc::new(ScriptedGenerator::new(implementations));
    let tester = Arc::new(ScriptedTester::new(vec![TestOutcome::passing(1); 5]));
    let analyzer = Arc::new(ScriptedAnalyzer::new(vec![analysis_for(0.0, 0.0); 5]));

    let (orchestrator, _cancel) = IterativeOrchestrator::new(client_with(generator, tester, analyzer));
    let report = orchestrator
        .run(specification(), options(90.0, 5))
        .await
        .expect("run should produce a report");

    assert!(!report.success);
    assert_eq!(report.terminal_state, TerminalState::ExhaustedIterations);
    assert_eq!(report.iteration_count, 5);
    assert!((report.final_quality_score - 40.0).abs() < 1e-9);
    // The ledger never exceeds the iteration budget.
    assert_eq!(report.ledger.records().len(), 5);
}

#[tokio::test]
async fn test_plateau_early_stop_when_enabled() {
    let implementations: Vec<Implementation> =
        (1..=5).map(|i| clean_implementation(&format!("v{i}"))).collect();
    let generator = Arc::new(ScriptedGenerator::new(implementations));
    let tester = Arc::new(ScriptedTester::new(vec![TestOutcome::passing(1); 5]));
    let analyzer = Arc::new(ScriptedAnalyzer::new(vec![analysis_for(0.0, 0.0); 5]));

    let mut run_options = options(90.0, 5);
    run_options.plateau_stop = true;
    run_options.plateau_window = 3;
    run_options.plateau_epsilon = 1.0;

    let (orchestrator, _cancel) = IterativeOrchestrator::new(client_with(generator, tester, analyzer));
    let report = orchestrator
        .run(specification(), run_options)
        .await
        .expect("run should produce a report");

    // Stops after the third identical score instead of burning the budget.
    assert_eq!(report.terminal_state, TerminalState::ExhaustedIterations);
    assert_eq!(report.iteration_count, 3);
}

#[tokio::test]
async fn test_first_generation_failure_is_fatal_with_empty_ledger() {
    let generator = Arc::new(ScriptedGenerator::failing("model endpoint unreachable"));
    let tester = Arc::new(ScriptedTester::new(vec![]));
    let analyzer = Arc::new(ScriptedAnalyzer::new(vec![]));

    let (orchestrator, _cancel) = IterativeOrchestrator::new(client_with(generator, tester, analyzer));
    let report = orchestrator
        .run(specification(), options(80.0, 5))
        .await
        .expect("fatal runs still produce a report");

    assert!(!report.success);
    assert!(matches!(
        &report.terminal_state,
        TerminalState::FatalError { message } if message.contains("initial generation failed")
    ));
    assert_eq!(report.iteration_count, 0);
    // No fallback artifact is ever substituted.
    assert!(report.final_implementation.is_none());
}

#[tokio::test]
async fn test_empty_first_generation_is_fatal() {
    let generator = Arc::new(ScriptedGenerator::new(vec![Implementation::new("fastapi")]));
    let tester = Arc::new(ScriptedTester::new(vec![]));
    let analyzer = Arc::new(ScriptedAnalyzer::new(vec![]));

    let (orchestrator, _cancel) = IterativeOrchestrator::new(client_with(generator, tester, analyzer));
    let report = orchestrator
        .run(specification(), options(80.0, 5))
        .await
        .expect("fatal runs still produce a report");

    assert!(matches!(
        &report.terminal_state,
        TerminalState::FatalError { message } if message.contains("no usable source files")
    ));
    assert_eq!(report.iteration_count, 0);
}

#[tokio::test]
async fn test_refine_failure_is_fatal_but_keeps_best() {
    let generator = Arc::new(ScriptedGenerator::from_steps(vec![
        Ok(clean_implementation("v1")),
        Err("model endpoint unreachable".to_string()),
    ]));
    let tester = Arc::new(ScriptedTester::new(vec![TestOutcome::passing(2)]));
    let analyzer = Arc::new(ScriptedAnalyzer::new(vec![analysis_for(0.5, 0.5)]));

    let (orchestrator, _cancel) = IterativeOrchestrator::new(client_with(generator, tester, analyzer));
    let report = orchestrator
        .run(specification(), options(99.0, 5))
        .await
        .expect("fatal runs still produce a report");

    assert!(matches!(
        &report.terminal_state,
        TerminalState::FatalError { message } if message.contains("refinement failed")
    ));
    assert_eq!(report.iteration_count, 1);
    // The partial ledger and its best artifact survive the failure.
    assert!(report.final_implementation.is_some());
    assert!(report.final_quality_score > 0.0);
}

#[tokio::test]
async fn test_tester_outage_is_contained_and_loop_continues() {
    let generator = Arc::new(ScriptedGenerator::new(vec![
        clean_implementation("v1"),
        clean_implementation("v2"),
    ]));
    let tester = Arc::new(ScriptedTester::failing("sandbox allocation failed"));
    let analyzer = Arc::new(ScriptedAnalyzer::new(vec![
        analysis_for(0.0, 0.0),
        analysis_for(0.0, 0.0),
    ]));

    let (orchestrator, _cancel) = IterativeOrchestrator::new(client_with(generator, tester, analyzer));
    let report = orchestrator
        .run(specification(), options(80.0, 2))
        .await
        .expect("run should produce a report");

    // The outage never aborts the run; both iterations are recorded with a
    // synthesized failing outcome.
    assert_eq!(report.terminal_state, TerminalState::ExhaustedIterations);
    assert_eq!(report.iteration_count, 2);
    for record in report.ledger.records() {
        assert!(!record.test_outcome.syntax_valid);
        assert!(record
            .test_outcome
            .lint_issues
            .iter()
            .any(|issue| issue.message.contains("tester unavailable")));
        assert!((record.quality_score - 0.0).abs() < 1e-9);
    }
}

#[tokio::test]
async fn test_single_iteration_budget_never_refines() {
    // One scripted implementation only: a refine call would exhaust the
    // script and turn the run fatal.
    let generator = Arc::new(ScriptedGenerator::new(vec![clean_implementation("v1")]));
    let tester = Arc::new(ScriptedTester::new(vec![TestOutcome::passing(1)]));
    let analyzer = Arc::new(ScriptedAnalyzer::new(vec![analysis_for(0.0, 0.0)]));

    let (orchestrator, _cancel) = IterativeOrchestrator::new(client_with(generator, tester, analyzer));
    let report = orchestrator
        .run(specification(), options(99.0, 1))
        .await
        .expect("run should produce a report");

    assert_eq!(report.terminal_state, TerminalState::ExhaustedIterations);
    assert_eq!(report.iteration_count, 1);
}

#[tokio::test]
async fn test_zero_target_converges_immediately() {
    let generator = Arc::new(ScriptedGenerator::new(vec![clean_implementation("v1")]));
    let tester = Arc::new(ScriptedTester::failing("sandbox down"));
    let analyzer = Arc::new(ScriptedAnalyzer::failing("analyzer down"));

    let (orchestrator, _cancel) = IterativeOrchestrator::new(client_with(generator, tester, analyzer));
    let report = orchestrator
        .run(specification(), options(0.0, 5))
        .await
        .expect("run should produce a report");

    // Even an all-zero score meets a zero target; ties converge.
    assert_eq!(report.terminal_state, TerminalState::ConvergedSuccess);
    assert_eq!(report.iteration_count, 1);
}

#[tokio::test]
async fn test_invalid_parameters_rejected_before_any_iteration() {
    let generator = Arc::new(ScriptedGenerator::new(vec![clean_implementation("v1")]));
    let tester = Arc::new(ScriptedTester::new(vec![TestOutcome::passing(1)]));
    let analyzer = Arc::new(ScriptedAnalyzer::new(vec![analysis_for(0.5, 0.5)]));
    let (orchestrator, _cancel) = IterativeOrchestrator::new(client_with(generator, tester, analyzer));

    let err = orchestrator
        .run(specification(), options(80.0, 0))
        .await
        .expect_err("zero iterations must be rejected");
    assert!(matches!(err, RunError::InvalidConfiguration(_)));

    let err = orchestrator
        .run(specification(), options(150.0, 5))
        .await
        .expect_err("out-of-range target must be rejected");
    assert!(matches!(err, RunError::InvalidConfiguration(_)));
}

#[tokio::test]
async fn test_cancellation_before_start_preserves_empty_ledger() {
    let generator = Arc::new(ScriptedGenerator::new(vec![clean_implementation("v1")]));
    let tester = Arc::new(ScriptedTester::new(vec![TestOutcome::passing(1)]));
    let analyzer = Arc::new(ScriptedAnalyzer::new(vec![analysis_for(0.5, 0.5)]));

    let (orchestrator, cancel) = IterativeOrchestrator::new(client_with(generator, tester, analyzer));
    cancel.cancel();

    let report = orchestrator
        .run(specification(), options(80.0, 5))
        .await
        .expect("cancelled runs still produce a report");

    assert_eq!(report.terminal_state, TerminalState::Cancelled);
    assert_eq!(report.iteration_count, 0);
}
