//! Behavioral specification input model.
//!
//! A **Specification** is the immutable input to a development run: an ordered
//! sequence of Given/When/Then scenarios plus non-functional constraints
//! grouped by category. It is produced by the spec-loading shim and read-only
//! for the core loop.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

/// A single Given/When/Then behavioral description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Short name identifying the scenario.
    pub name: String,

    /// Precondition free text.
    pub given: String,

    /// Action free text.
    pub when: String,

    /// Expected outcome free text.
    pub then: String,
}

impl Scenario {
    /// Create a new scenario.
    pub fn new(
        name: impl Into<String>,
        given: impl Into<String>,
        when: impl Into<String>,
        then: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            given: given.into(),
            when: when.into(),
            then: then.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Constraints
// ---------------------------------------------------------------------------

/// Category a non-functional constraint belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintCategory {
    Performance,
    Security,
    Scalability,
    Reliability,
}

impl ConstraintCategory {
    /// Stable lowercase name used in config files and report output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Performance => "performance",
            Self::Security => "security",
            Self::Scalability => "scalability",
            Self::Reliability => "reliability",
        }
    }
}

impl std::fmt::Display for ConstraintCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named non-functional requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    /// Short identifier, e.g. `response_time`.
    pub name: String,

    /// Requirement free text, e.g. "p99 latency under 200ms".
    pub requirement: String,
}

impl Constraint {
    /// Create a new constraint.
    pub fn new(name: impl Into<String>, requirement: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requirement: requirement.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Specification
// ---------------------------------------------------------------------------

/// The immutable input to a development run.
///
/// Scenario order is preserved as given by the loader; constraints keep a
/// deterministic category order via `BTreeMap`, with each category holding
/// its requirements in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Specification {
    /// Ordered behavioral scenarios.
    #[serde(default)]
    pub scenarios: Vec<Scenario>,

    /// Non-functional constraints grouped by category.
    #[serde(default)]
    pub constraints: BTreeMap<ConstraintCategory, Vec<Constraint>>,
}

impl Specification {
    /// Create a specification from scenarios only.
    pub fn from_scenarios(scenarios: Vec<Scenario>) -> Self {
        Self {
            scenarios,
            constraints: BTreeMap::new(),
        }
    }

    /// Total number of named constraints across all categories.
    pub fn constraint_count(&self) -> usize {
        self.constraints.values().map(Vec::len).sum()
    }

    /// Whether the specification carries no scenarios at all.
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}
