//! Iterative development loop.
//!
//! Drives the generate → test → analyze → decide → refine state machine for
//! one run. Every provider interaction goes through the gateway client; the
//! orchestrator never constructs a fallback artifact on generation failure
//! and never mutates a prior iteration's record.
//!
//! Cancellation is cooperative: a watch flag is checked at every phase
//! boundary, and a run interrupted mid-flight terminates as `Cancelled` with
//! its partial ledger intact.

use std::time::Instant;

use tokio::sync::watch;
use tracing::{info, instrument, warn};

use crate::domain::errors::RunError;
use crate::domain::models::{
    AnalysisOutcome, DevelopmentRun, Implementation, IterationRecord, RunConfig, RunReport,
    Specification, TerminalState, TestOutcome,
};
use crate::infrastructure::gateway::GatewayClient;
use crate::services::scorer;

/// Parameters for one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub target_quality_score: f64,
    pub max_iterations: u32,
    pub include_packaging: bool,
    pub plateau_stop: bool,
    pub plateau_window: usize,
    pub plateau_epsilon: f64,
}

impl RunOptions {
    /// Build options from the run section of the configuration.
    pub fn from_config(config: &RunConfig, include_packaging: bool) -> Self {
        Self {
            target_quality_score: config.target_quality_score,
            max_iterations: config.max_iterations,
            include_packaging,
            plateau_stop: config.plateau_stop,
            plateau_window: config.plateau_window,
            plateau_epsilon: config.plateau_epsilon,
        }
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::from_config(&RunConfig::default(), false)
    }
}

/// Requests cooperative cancellation of a running loop.
#[derive(Clone)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Signal the loop to stop at its next phase boundary.
    pub fn cancel(&self) {
        // Receivers may already be gone when the run finished first.
        let _ = self.tx.send(true);
    }
}

/// The iterative orchestrator.
pub struct IterativeOrchestrator {
    client: GatewayClient,
    cancel_rx: watch::Receiver<bool>,
}

enum Phase {
    Continue(Implementation),
    Terminal(TerminalState),
}

impl IterativeOrchestrator {
    /// Create an orchestrator and the handle that can cancel its runs.
    pub fn new(client: GatewayClient) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        (
            Self {
                client,
                cancel_rx: rx,
            },
            CancelHandle { tx },
        )
    }

    fn cancelled(&self) -> bool {
        *self.cancel_rx.borrow()
    }

    /// Run the full development loop for one specification.
    ///
    /// Returns `Err` only for invalid parameters, before any iteration
    /// starts. Every other outcome, including fatal mid-run failures, is an
    /// `Ok` report whose terminal state says what happened.
    #[instrument(skip_all, fields(target = options.target_quality_score, max_iterations = options.max_iterations))]
    pub async fn run(
        &self,
        specification: Specification,
        options: RunOptions,
    ) -> Result<RunReport, RunError> {
        if options.max_iterations == 0 {
            return Err(RunError::InvalidConfiguration(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&options.target_quality_score) {
            return Err(RunError::InvalidConfiguration(format!(
                "target_quality_score must be within [0, 100], got {}",
                options.target_quality_score
            )));
        }

        let mut run = DevelopmentRun::new(
            specification,
            options.target_quality_score,
            options.max_iterations,
        );

        let terminal = self.drive(&mut run, &options).await?;
        run.final_implementation = run
            .ledger
            .best_so_far()
            .map(|record| record.implementation.clone());
        run.terminal_state = Some(terminal.clone());

        if terminal.is_success() && options.include_packaging {
            self.package_best(&run).await;
        }

        info!(
            terminal = %terminal,
            iterations = run.ledger.len(),
            best_score = run.ledger.best_so_far().map_or(0.0, |r| r.quality_score),
            "run finished"
        );
        Ok(run.report())
    }

    async fn drive(
        &self,
        run: &mut DevelopmentRun,
        options: &RunOptions,
    ) -> Result<TerminalState, RunError> {
        if self.cancelled() {
            return Ok(TerminalState::Cancelled);
        }

        // First generation. A failure here is fatal: there is no artifact to
        // iterate on, and substituting one would hide the failure.
        let mut current = match self.generate(&run.specification).await {
            Phase::Continue(implementation) => implementation,
            Phase::Terminal(state) => return Ok(state),
        };

        for iteration_index in 0..options.max_iterations {
            let pass_started = Instant::now();

            if self.cancelled() {
                return Ok(TerminalState::Cancelled);
            }
            let test_outcome = self.test(&current).await;

            if self.cancelled() {
                return Ok(TerminalState::Cancelled);
            }
            let analysis_outcome = self.analyze(&current).await;

            let quality_score = scorer::score(&current, &test_outcome, &analysis_outcome);
            info!(
                iteration = iteration_index,
                score = quality_score,
                passed = test_outcome.unit_test_results.passed,
                failed = test_outcome.unit_test_results.failed,
                "iteration measured"
            );

            run.ledger.append(IterationRecord::new(
                iteration_index,
                current.clone(),
                test_outcome.clone(),
                analysis_outcome.clone(),
                quality_score,
                pass_started.elapsed().as_millis() as u64,
            ))?;

            // Deciding.
            if quality_score >= options.target_quality_score {
                return Ok(TerminalState::ConvergedSuccess);
            }
            if iteration_index + 1 == options.max_iterations {
                return Ok(TerminalState::ExhaustedIterations);
            }
            if options.plateau_stop
                && run
                    .ledger
                    .has_plateaued(options.plateau_window, options.plateau_epsilon)
            {
                info!(
                    window = options.plateau_window,
                    epsilon = options.plateau_epsilon,
                    "score plateau detected, stopping early"
                );
                return Ok(TerminalState::ExhaustedIterations);
            }

            if self.cancelled() {
                return Ok(TerminalState::Cancelled);
            }

            // Refinement sees only this iteration's outcomes.
            current = match self
                .refine(
                    &current,
                    &test_outcome,
                    &analysis_outcome,
                    options.target_quality_score,
                )
                .await
            {
                Phase::Continue(implementation) => implementation,
                Phase::Terminal(state) => return Ok(state),
            };
        }

        // The loop always returns from the deciding step.
        Ok(TerminalState::ExhaustedIterations)
    }

    async fn generate(&self, specification: &Specification) -> Phase {
        match self.client.generate(specification).await {
            Ok(implementation) if implementation.has_usable_content() => {
                Phase::Continue(implementation)
            }
            Ok(_) => Phase::Terminal(TerminalState::FatalError {
                message: "initial generation returned no usable source files".to_string(),
            }),
            Err(failure) => Phase::Terminal(TerminalState::FatalError {
                message: format!("initial generation failed: {failure}"),
            }),
        }
    }

    async fn refine(
        &self,
        current: &Implementation,
        test_outcome: &TestOutcome,
        analysis_outcome: &AnalysisOutcome,
        target: f64,
    ) -> Phase {
        match self
            .client
            .refine(current, test_outcome, analysis_outcome, target)
            .await
        {
            Ok(implementation) if implementation.has_usable_content() => {
                Phase::Continue(implementation)
            }
            Ok(_) => Phase::Terminal(TerminalState::FatalError {
                message: "refinement returned no usable source files".to_string(),
            }),
            Err(failure) => Phase::Terminal(TerminalState::FatalError {
                message: format!("refinement failed: {failure}"),
            }),
        }
    }

    async fn test(&self, implementation: &Implementation) -> TestOutcome {
        match self.client.test(implementation).await {
            Ok(outcome) => outcome,
            Err(failure) => {
                warn!(failure = %failure, "tester unavailable, recording failed outcome");
                TestOutcome::from_infrastructure_failure(failure.message)
            }
        }
    }

    async fn analyze(&self, implementation: &Implementation) -> AnalysisOutcome {
        match self.client.analyze(implementation).await {
            Ok(outcome) => outcome,
            Err(failure) => {
                warn!(failure = %failure, "analyzer unavailable, recording failed outcome");
                AnalysisOutcome::from_infrastructure_failure(failure.message)
            }
        }
    }

    /// Packaging is best effort: a failure is logged and the run keeps its
    /// successful terminal state.
    async fn package_best(&self, run: &DevelopmentRun) {
        let Some(implementation) = &run.final_implementation else {
            return;
        };
        match self.client.package(implementation).await {
            Ok(build_spec) => info!(
                kind = build_spec
                    .get("kind")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("unknown"),
                "build spec produced"
            ),
            Err(failure) => warn!(failure = %failure, "packaging failed"),
        }
    }
}
