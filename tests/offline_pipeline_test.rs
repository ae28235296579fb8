//! Full pipeline over the real offline providers: heuristic testing and
//! analysis drive the score up as a scripted generator swaps placeholder
//! code for a finished version.

use std::sync::Arc;

use specforge::application::{IterativeOrchestrator, RunOptions};
use specforge::domain::models::{Implementation, Specification, TerminalState, TimeoutConfig};
use specforge::domain::ports::{Analyzer, Generator, Packager, Tester};
use specforge::infrastructure::gateway::{register_standard_tools, GatewayClient, ProtocolGateway};
use specforge::infrastructure::providers::{
    ContainerPackager, HeuristicAnalyzer, ScriptedGenerator, StaticTester,
};
use specforge::infrastructure::spec_loader;

const DRAFT: &str = "\"\"\"Adder service, first draft.\"\"\"\n\n\
def add(a, b):\n    raise NotImplementedError\n\n\
def test_add():\n    assert add(1, 2) == 3\n";

const FINISHED: &str = "\"\"\"Adder service.\"\"\"\n\n\
def add(a, b):\n    return a + b\n\n\
def test_add():\n    assert add(1, 2) == 3\n";

fn specification() -> Specification {
    spec_loader::parse_specification(
        "scenarios:\n  - name: add\n    given: two integers\n    when: add is called\n    then: the sum is returned\n",
    )
    .expect("inline specification parses")
}

#[tokio::test]
async fn test_placeholder_draft_is_refined_to_convergence() {
    let generator: Arc<dyn Generator> = Arc::new(ScriptedGenerator::new(vec![
        Implementation::new("fastapi")
            .with_file("main.py", DRAFT)
            .with_dependency("pytest"),
        Implementation::new("fastapi")
            .with_file("main.py", FINISHED)
            .with_dependency("pytest"),
    ]));
    let tester: Arc<dyn Tester> = Arc::new(StaticTester::new());
    let analyzer: Arc<dyn Analyzer> = Arc::new(HeuristicAnalyzer::new());
    let packager: Arc<dyn Packager> = Arc::new(ContainerPackager::new());

    let mut gateway = ProtocolGateway::new(TimeoutConfig::default());
    register_standard_tools(&mut gateway, generator, tester, analyzer, packager)
        .expect("tool registration should succeed");

    let (orchestrator, _cancel) =
        IterativeOrchestrator::new(GatewayClient::new(Arc::new(gateway)));
    let report = orchestrator
        .run(
            specification(),
            RunOptions {
                target_quality_score: 80.0,
                max_iterations: 5,
                include_packaging: true,
                plateau_stop: false,
                plateau_window: 3,
                plateau_epsilon: 1.0,
            },
        )
        .await
        .expect("run should produce a report");

    assert_eq!(report.terminal_state, TerminalState::ConvergedSuccess);
    assert_eq!(report.iteration_count, 2);

    let records = report.ledger.records();
    // The placeholder draft scores far below the finished version.
    assert!(records[0].quality_score < 50.0);
    assert!(records[1].quality_score >= 80.0);
    assert!(records[0].test_outcome.unit_test_results.failed > 0);
    assert_eq!(records[1].test_outcome.unit_test_results.failed, 0);

    let best = report.final_implementation.expect("converged run has artifact");
    assert!(best.source_files["main.py"].contains("return a + b"));
}

#[tokio::test]
async fn test_spec_loader_feeds_the_loop() {
    let spec = specification();
    assert_eq!(spec.scenarios.len(), 1);
    assert_eq!(spec.scenarios[0].name, "add");
    assert_eq!(spec.scenarios[0].then, "the sum is returned");
}
