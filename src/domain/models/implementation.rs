//! The implementation artifact under iteration.
//!
//! An `Implementation` is owned exclusively by the iteration that produced
//! it. Refinement supersedes it with a new value rather than editing in
//! place, so every prior iteration's artifact stays inspectable in the
//! ledger.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// A generated implementation: source files, declared dependencies, and the
/// framework it targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Implementation {
    /// Filename -> file content. `BTreeMap` keeps report output deterministic.
    pub source_files: BTreeMap<String, String>,

    /// Package names the implementation declares.
    pub dependencies: BTreeSet<String>,

    /// Framework tag, e.g. `fastapi` or `axum`.
    pub framework: String,
}

impl Implementation {
    /// Create an empty implementation for the given framework.
    pub fn new(framework: impl Into<String>) -> Self {
        Self {
            source_files: BTreeMap::new(),
            dependencies: BTreeSet::new(),
            framework: framework.into(),
        }
    }

    /// Add a source file, returning `self` for chained construction.
    pub fn with_file(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.source_files.insert(name.into(), content.into());
        self
    }

    /// Add a dependency, returning `self` for chained construction.
    pub fn with_dependency(mut self, package: impl Into<String>) -> Self {
        self.dependencies.insert(package.into());
        self
    }

    /// Whether the implementation carries at least one non-empty source file.
    ///
    /// The generator contract treats an implementation without usable content
    /// as a failed call, so the orchestrator checks this after every
    /// generate/refine dispatch.
    pub fn has_usable_content(&self) -> bool {
        self.source_files
            .values()
            .any(|content| !content.trim().is_empty())
    }

    /// Total size of all source files in bytes.
    pub fn total_source_bytes(&self) -> usize {
        self.source_files.values().map(String::len).sum()
    }
}
