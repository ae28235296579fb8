//! YAML specification loading.
//!
//! Thin shim from the on-disk YAML shape to the domain [`Specification`].
//! The scenario key accepts both `name:` and the legacy `scenario:` spelling.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::domain::models::{Constraint, ConstraintCategory, Scenario, Specification};

#[derive(Debug, Deserialize)]
struct RawSpecification {
    #[serde(default)]
    scenarios: Vec<RawScenario>,
    #[serde(default)]
    constraints: BTreeMap<ConstraintCategory, Vec<RawConstraint>>,
}

#[derive(Debug, Deserialize)]
struct RawScenario {
    #[serde(alias = "scenario")]
    name: String,
    given: String,
    when: String,
    then: String,
}

#[derive(Debug, Deserialize)]
struct RawConstraint {
    name: String,
    requirement: String,
}

/// Load a specification from a YAML file.
pub fn load_specification(path: impl AsRef<Path>) -> Result<Specification> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read specification file {}", path.display()))?;
    parse_specification(&content)
        .with_context(|| format!("failed to parse specification file {}", path.display()))
}

/// Parse a specification from YAML text.
pub fn parse_specification(content: &str) -> Result<Specification> {
    let raw: RawSpecification =
        serde_yaml::from_str(content).context("specification YAML is malformed")?;

    if raw.scenarios.is_empty() {
        bail!("specification must contain at least one scenario");
    }

    let scenarios = raw
        .scenarios
        .into_iter()
        .map(|s| Scenario::new(s.name, s.given, s.when, s.then))
        .collect();

    let constraints = raw
        .constraints
        .into_iter()
        .map(|(category, entries)| {
            let entries = entries
                .into_iter()
                .map(|c| Constraint::new(c.name, c.requirement))
                .collect();
            (category, entries)
        })
        .collect();

    Ok(Specification {
        scenarios,
        constraints,
    })
}
