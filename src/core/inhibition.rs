//! Overlap scoring and global inhibition.
//!
//! Every column scores how many of its connections coincide with active input dimensions.
//! Columns are then ranked by score and only the top fraction fires. Ranking is a total order:
//! score descending, then column index ascending, so equal scores always resolve the same way
//! and inference is reproducible for a given layer state.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::{column::Column, synapses::Synapse};

/// The per-column outcome of one inhibition round.
///
/// `values[i]` is `0.0` when column `i` fired and the column's potential otherwise. `fired[i]`
/// carries the same information explicitly, so a losing column whose potential has collapsed to
/// exactly zero is never mistaken for a winner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveColumns {
    values: Vec<f64>,
    fired: Vec<bool>,
}

impl ActiveColumns {
    /// Number of columns covered.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The marker array: `0.0` for fired columns, the column potential for the rest.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Whether column `col` fired this round.
    #[inline]
    pub fn is_fired(&self, col: usize) -> bool {
        self.fired.get(col).copied().unwrap_or(false)
    }

    /// Indices of the fired columns, ascending.
    pub fn fired(&self) -> impl Iterator<Item = usize> + '_ {
        self.fired
            .iter()
            .enumerate()
            .filter_map(|(col, &fired)| fired.then_some(col))
    }

    /// Number of fired columns.
    pub fn fired_count(&self) -> usize {
        self.fired.iter().filter(|&&fired| fired).count()
    }
}

impl From<Vec<f64>> for ActiveColumns {
    /// Reads a plain marker array, treating every `0.0` entry as fired.
    fn from(values: Vec<f64>) -> Self {
        let fired = values.iter().map(|&v| v == 0.0).collect();
        Self { values, fired }
    }
}

/// Counts the input dimensions where the column is connected, its potential-scaled permanence is
/// nonzero, and the input value exceeds `sensitivity`.
///
/// Potential only gates the score: any nonzero potential leaves a nonzero permanence counting,
/// a potential of exactly zero silences the column.
#[inline]
pub fn overlap_score(synapses: &[Synapse], potential: f64, input: &[f32], sensitivity: f32) -> usize {
    synapses
        .iter()
        .filter(|syn| {
            let connection = syn.permanence as f64 * potential;
            connection != 0.0 && input.get(syn.index).is_some_and(|&x| x > sensitivity)
        })
        .count()
}

/// How many columns fire per round: `ceil(column_count * ratio)`, at most `column_count`.
#[inline]
pub fn winner_count(column_count: usize, ratio: f64) -> usize {
    ((column_count as f64 * ratio).ceil() as usize).min(column_count)
}

/// Implements global inhibition:
/// - Scores every column against `input`.
/// - Sorts columns by score descending, breaking ties by column index ascending.
/// - Marks the first `winner_count` columns fired, all others with their potential.
///
/// Reads column state only.
pub fn select_active(columns: &[Column], ratio: f64, input: &[f32], sensitivity: f32) -> ActiveColumns {
    let scores: Vec<usize> = columns
        .iter()
        .map(|column| overlap_score(column.synapses(), column.potential(), input, sensitivity))
        .collect();

    let mut candidates: Vec<usize> = (0..columns.len()).collect();
    candidates.sort_unstable_by(|&a, &b| rank(&scores, a, b));

    let mut values: Vec<f64> = columns.iter().map(Column::potential).collect();
    let mut fired = vec![false; columns.len()];

    for &col in &candidates[..winner_count(columns.len(), ratio)] {
        values[col] = 0.0;
        fired[col] = true;
    }

    ActiveColumns { values, fired }
}

#[inline]
fn rank(scores: &[usize], a: usize, b: usize) -> Ordering {
    scores[b].cmp(&scores[a]).then(a.cmp(&b))
}
