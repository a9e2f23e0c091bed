//! Per-label activation counts and the frequency classifier built on them.
//!
//! During learning, every fired column increments its count under the ground-truth label.
//! During inference, each label scores the sum of the counts of the columns that fired now,
//! and the label with the highest score is the best guess.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::inhibition::ActiveColumns;

/// Number of class labels (digits 0-9).
pub const LABEL_COUNT: usize = 10;

/// Activation counts indexed as `[label][column]`. Zero means "never fired for this label".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityTable {
    counts: Vec<Vec<u32>>,
}

impl ProbabilityTable {
    /// Creates an all-zero table for `column_count` columns.
    pub fn new(column_count: usize) -> Self {
        Self {
            counts: vec![vec![0; column_count]; LABEL_COUNT],
        }
    }

    /// Records that `column` fired while `label` was the ground truth. Counts saturate at
    /// `u32::MAX`.
    #[inline]
    pub fn record(&mut self, label: usize, column: usize) {
        let count = &mut self.counts[label][column];
        *count = count.saturating_add(1);
    }

    /// How often `column` fired for `label`.
    #[inline]
    pub fn count(&self, label: usize, column: usize) -> u32 {
        self.counts[label][column]
    }

    /// The per-column counts of one label.
    pub fn label_counts(&self, label: usize) -> &[u32] {
        &self.counts[label]
    }

    /// Number of columns tracked per label.
    pub fn column_count(&self) -> usize {
        self.counts.first().map_or(0, Vec::len)
    }
}

/// Scores every label by summing its counts over the currently fired columns.
///
/// Only columns with a nonzero count contribute. Labels without any contributing column are
/// absent from the result rather than present with a score of zero. Labels iterate in ascending
/// order.
pub fn best_guesses(active: &ActiveColumns, probabilities: &ProbabilityTable) -> BTreeMap<usize, u64> {
    let mut scores = BTreeMap::new();

    for (label, counts) in probabilities.counts.iter().enumerate() {
        for col in active.fired() {
            match counts.get(col) {
                Some(&count) if count > 0 => {
                    *scores.entry(label).or_insert(0) += count as u64;
                }
                _ => {}
            }
        }
    }

    scores
}

/// Picks the label with the highest score, or `None` when there are no scores.
///
/// Uses a strict greater-than scan in ascending label order, so the lowest label wins ties.
pub fn best_guess(scores: &BTreeMap<usize, u64>) -> Option<usize> {
    let mut best = None;
    let mut best_score = 0;

    for (&label, &score) in scores {
        if score > best_score {
            best = Some(label);
            best_score = score;
        }
    }

    best
}
