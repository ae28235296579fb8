//! Deterministic scripted providers.
//!
//! Each provider replays a fixed sequence of responses, one per call, and
//! fails once its script is exhausted. Used by the integration tests and the
//! offline demo path; no network, no clocks, fully reproducible runs.

use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::domain::models::{AnalysisOutcome, Implementation, Specification, TestOutcome};
use crate::domain::ports::{Analyzer, Generator, Packager, Tester};

fn pop<T>(script: &Mutex<VecDeque<T>>, role: &str) -> Result<T> {
    let mut guard = script
        .lock()
        .map_err(|_| anyhow!("{role} script lock poisoned"))?;
    guard
        .pop_front()
        .ok_or_else(|| anyhow!("{role} script exhausted"))
}

/// Generator replaying a fixed sequence of implementations.
///
/// The first script entry answers `generate`; every later entry answers the
/// successive `refine` calls.
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<Implementation, String>>>,
}

impl ScriptedGenerator {
    pub fn new(implementations: Vec<Implementation>) -> Self {
        Self {
            script: Mutex::new(implementations.into_iter().map(Ok).collect()),
        }
    }

    /// A generator whose every call fails with the given message.
    pub fn failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            script: Mutex::new(VecDeque::from([Err(message)])),
        }
    }

    /// Script a mix of successes and failures, in call order.
    pub fn from_steps(steps: Vec<Result<Implementation, String>>) -> Self {
        Self {
            script: Mutex::new(steps.into()),
        }
    }

    fn next(&self, role: &str) -> Result<Implementation> {
        match pop(&self.script, role) {
            Ok(Ok(implementation)) => Ok(implementation),
            Ok(Err(message)) => bail!("{message}"),
            // A failing generator keeps failing rather than flipping to
            // "script exhausted" after its first scripted error.
            Err(_) => bail!("{role} script exhausted"),
        }
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, _specification: &Specification) -> Result<Implementation> {
        self.next("generator")
    }

    async fn refine(
        &self,
        _current: &Implementation,
        _test_outcome: &TestOutcome,
        _analysis_outcome: &AnalysisOutcome,
        _target_quality_score: f64,
    ) -> Result<Implementation> {
        self.next("refiner")
    }
}

/// Tester replaying a fixed sequence of outcomes.
pub struct ScriptedTester {
    script: Mutex<VecDeque<TestOutcome>>,
    fail_always: Option<String>,
}

impl ScriptedTester {
    pub fn new(outcomes: Vec<TestOutcome>) -> Self {
        Self {
            script: Mutex::new(outcomes.into()),
            fail_always: None,
        }
    }

    /// A tester whose every call raises an infrastructure error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fail_always: Some(message.into()),
        }
    }
}

#[async_trait]
impl Tester for ScriptedTester {
    async fn run(&self, _implementation: &Implementation) -> Result<TestOutcome> {
        if let Some(message) = &self.fail_always {
            bail!("{message}");
        }
        pop(&self.script, "tester")
    }
}

/// Analyzer replaying a fixed sequence of outcomes.
pub struct ScriptedAnalyzer {
    script: Mutex<VecDeque<AnalysisOutcome>>,
    fail_always: Option<String>,
}

impl ScriptedAnalyzer {
    pub fn new(outcomes: Vec<AnalysisOutcome>) -> Self {
        Self {
            script: Mutex::new(outcomes.into()),
            fail_always: None,
        }
    }

    /// An analyzer whose every call raises an infrastructure error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fail_always: Some(message.into()),
        }
    }
}

#[async_trait]
impl Analyzer for ScriptedAnalyzer {
    async fn analyze(&self, _implementation: &Implementation) -> Result<AnalysisOutcome> {
        if let Some(message) = &self.fail_always {
            bail!("{message}");
        }
        pop(&self.script, "analyzer")
    }
}

/// Packager returning a static build-spec stub.
#[derive(Debug, Default)]
pub struct ScriptedPackager;

impl ScriptedPackager {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Packager for ScriptedPackager {
    async fn package(&self, implementation: &Implementation) -> Result<Value> {
        Ok(json!({
            "kind": "container_build_spec",
            "files": implementation.source_files.keys().collect::<Vec<_>>(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_generator_replays_in_order() {
        let generator = ScriptedGenerator::new(vec![
            Implementation::new("fastapi").with_file("main.py", "v1"),
            Implementation::new("fastapi").with_file("main.py", "v2"),
        ]);

        let first = generator.generate(&Specification::default()).await.unwrap();
        assert_eq!(first.source_files["main.py"], "v1");

        let second = generator
            .refine(
                &first,
                &TestOutcome::passing(1),
                &AnalysisOutcome::new(0.5, 0.5, 0.5),
                80.0,
            )
            .await
            .unwrap();
        assert_eq!(second.source_files["main.py"], "v2");

        // Script exhausted.
        assert!(generator.generate(&Specification::default()).await.is_err());
    }

    #[test]
    fn test_failing_tester_raises() {
        let tester = ScriptedTester::failing("sandbox down");
        let err = tokio_test::block_on(tester.run(&Implementation::new("fastapi"))).unwrap_err();
        assert!(err.to_string().contains("sandbox down"));
    }
}
