//! A `Column` represents one feature detector in the layer.
//!
//! Each column receives input from a random subset of the input space (its synapses), computes
//! an overlap score with the current input, and competes with all other columns to fire.
//! Columns that fire adapt their permanences towards the input and lose potential, so a column
//! that has just fired is less eligible for a while. Columns that lose regain potential.

use super::{synapses::Synapse, utilities};

/// Represents a competitive column with its connections and homeostatic potential.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Connections into the input space, ordered by input index.
    synapses: Vec<Synapse>,

    /// Eligibility in `[0, 1]`: 1.0 has not fired recently, 0.0 has just fired.
    potential: f64,
}

impl Column {
    /// Creates a fully eligible column from its synapses.
    pub fn new(synapses: Vec<Synapse>) -> Self {
        Self {
            synapses,
            potential: 1.0,
        }
    }

    /// Creates a column from a dense permanence view, where `None` means no connection.
    pub fn from_permanences(permanences: &[Option<f32>], potential: f64) -> Self {
        let synapses = permanences
            .iter()
            .enumerate()
            .filter_map(|(index, permanence)| {
                permanence.map(|p| Synapse {
                    index,
                    permanence: utilities::clamp(p, 0.0, 1.0),
                })
            })
            .collect();

        Self {
            synapses,
            potential: clamp_potential(potential),
        }
    }

    pub fn synapses(&self) -> &[Synapse] {
        &self.synapses
    }

    pub fn synapses_mut(&mut self) -> &mut [Synapse] {
        &mut self.synapses
    }

    pub fn potential(&self) -> f64 {
        self.potential
    }

    /// Sets the potential, clamped to `[0, 1]`.
    pub fn set_potential(&mut self, potential: f64) {
        self.potential = clamp_potential(potential);
    }

    /// Number of input dimensions this column is connected to.
    pub fn connection_count(&self) -> usize {
        self.synapses.len()
    }

    /// The dense permanence view of length `input_space`, `None` where there is no connection.
    pub fn permanence_values(&self, input_space: usize) -> Vec<Option<f32>> {
        let mut values = vec![None; input_space];
        for syn in &self.synapses {
            if let Some(slot) = values.get_mut(syn.index) {
                *slot = Some(syn.permanence);
            }
        }
        values
    }
}

#[inline]
fn clamp_potential(potential: f64) -> f64 {
    potential.min(1.0).max(0.0)
}
