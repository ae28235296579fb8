//! Append-only iteration ledger with trend queries.
//!
//! The ledger is exclusively owned and mutated by its run. `append` enforces
//! the index invariant (`iteration_index == len()`); a violation indicates an
//! orchestrator bug and is never recovered from.

use serde::{Deserialize, Serialize};

use super::run::IterationRecord;
use crate::domain::errors::LedgerError;

/// Ordered, append-only record of every iteration in a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IterationLedger {
    records: Vec<IterationRecord>,
}

impl IterationLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record.
    ///
    /// Fails with [`LedgerError::OutOfOrder`] unless the record's
    /// `iteration_index` is exactly the current length.
    pub fn append(&mut self, record: IterationRecord) -> Result<(), LedgerError> {
        let expected = self.records.len() as u32;
        if record.iteration_index != expected {
            return Err(LedgerError::OutOfOrder {
                expected,
                actual: record.iteration_index,
            });
        }
        self.records.push(record);
        Ok(())
    }

    /// Number of recorded iterations.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no iteration has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Read-only view of the records in iteration order.
    pub fn records(&self) -> &[IterationRecord] {
        &self.records
    }

    /// The most recent record, if any.
    pub fn last(&self) -> Option<&IterationRecord> {
        self.records.last()
    }

    /// The record with the maximum quality score, ties broken by earliest
    /// iteration index (prefer the earlier, simpler solution).
    pub fn best_so_far(&self) -> Option<&IterationRecord> {
        self.records.iter().fold(None, |best, candidate| match best {
            Some(current) if candidate.quality_score > current.quality_score => Some(candidate),
            None => Some(candidate),
            other => other,
        })
    }

    /// Whether the most recent `window` records all have quality scores
    /// within `epsilon` of each other.
    ///
    /// An early-stop signal distinct from reaching the target score. Returns
    /// `false` when fewer than `window` records exist or `window` is zero,
    /// since that is not enough evidence to claim a plateau.
    pub fn has_plateaued(&self, window: usize, epsilon: f64) -> bool {
        if window == 0 || self.records.len() < window {
            return false;
        }
        let recent = &self.records[self.records.len() - window..];
        let min = recent
            .iter()
            .map(|r| r.quality_score)
            .fold(f64::INFINITY, f64::min);
        let max = recent
            .iter()
            .map(|r| r.quality_score)
            .fold(f64::NEG_INFINITY, f64::max);
        (max - min) <= epsilon
    }
}
