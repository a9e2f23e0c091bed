//! Hebbian learning over one layer.
//!
//! One learning step:
//! - Decodes the ground-truth label from the one-hot output. Nothing is mutated if that fails.
//! - Runs inhibition to find the fired columns.
//! - For each fired column: adapts its synapses towards the input, counts it under the label,
//!   and multiplies its potential by `depotentialization`.
//! - For every other column: multiplies its potential by `repotentialization`.
//! - Clamps every potential into `[0, 1]` and back-projects the fired columns.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    error::{LayerError, Result},
    inhibition::ActiveColumns,
    layer::Layer,
    probabilities::LABEL_COUNT,
    synapses::{adapt_synapses, SynapsePermanenceOptions},
};

/// What one learning step produced, for the caller to forward to observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Learning {
    pub active_columns: ActiveColumns,
    pub back_projection: Vec<f32>,
}

/// Returns the index of the single `1.0` entry of a one-hot vector of length [`LABEL_COUNT`].
pub fn decode_label(output: &[f32]) -> Result<usize> {
    if output.len() != LABEL_COUNT {
        return Err(LayerError::length_mismatch("output", LABEL_COUNT, output.len()));
    }

    let mut hot = output
        .iter()
        .enumerate()
        .filter(|(_, &v)| v == 1.0)
        .map(|(label, _)| label);

    match (hot.next(), hot.next()) {
        (Some(label), None) => Ok(label),
        (None, _) => Err(LayerError::invalid_input("output has no label set")),
        (Some(_), Some(_)) => Err(LayerError::invalid_input("output has more than one label set")),
    }
}

/// Trains `layer` on one labeled example. See the module docs for the steps.
pub fn learn(layer: &mut Layer, input: &[f32], output: &[f32]) -> Result<Learning> {
    let label = decode_label(output)?;
    let active_columns = layer.select_active(input)?;

    let options = SynapsePermanenceOptions::from(&layer.settings);
    let depotentialization = layer.settings.depotentialization;
    let repotentialization = layer.settings.repotentialization;

    for (col, column) in layer.columns.iter_mut().enumerate() {
        let potential = if active_columns.is_fired(col) {
            adapt_synapses(column.synapses_mut(), input, &options);
            layer.probabilities.record(label, col);
            column.potential() * depotentialization
        } else {
            column.potential() * repotentialization
        };
        column.set_potential(potential);
    }

    let back_projection = layer.back_project(&active_columns)?;

    debug!(
        layer_id = %layer.id,
        label,
        winners = active_columns.fired_count(),
        "learned"
    );

    Ok(Learning {
        active_columns,
        back_projection,
    })
}

impl Layer {
    /// Trains this layer on one labeled example.
    ///
    /// `output` is a one-hot vector of length 10. Fails with [`LayerError::InvalidInput`] before
    /// touching any state when `output` or `input` is malformed.
    pub fn learn(&mut self, input: &[f32], output: &[f32]) -> Result<Learning> {
        learn(self, input, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{layer::LayerId, settings::Settings};

    fn one_hot(label: usize) -> Vec<f32> {
        let mut output = vec![0.0; LABEL_COUNT];
        output[label] = 1.0;
        output
    }

    fn layer() -> Layer {
        let settings = Settings {
            column_sqrt_count: 2,
            input_space: 4,
            potential_percent: 1.0,
            active_column_ratio_per_inhibition_area: 0.25,
            input_sensitivity: 0.5,
            seed: Some(5),
            ..Default::default()
        };
        Layer::new(LayerId::new(), settings).unwrap()
    }

    #[test]
    fn test_decode_label() {
        assert_eq!(decode_label(&one_hot(7)).unwrap(), 7);
    }

    #[test]
    fn test_decode_label_rejects_malformed_outputs() {
        let mut two = one_hot(1);
        two[2] = 1.0;

        for output in [vec![0.0; LABEL_COUNT], two, vec![1.0; 3]] {
            assert!(matches!(
                decode_label(&output),
                Err(LayerError::InvalidInput { .. })
            ));
        }
    }

    #[test]
    fn test_failed_decode_leaves_layer_untouched() {
        let mut layer = layer();
        let before = layer.clone();

        assert!(layer.learn(&[1.0; 4], &[0.0; LABEL_COUNT]).is_err());
        assert_eq!(layer.columns(), before.columns());
        assert_eq!(layer.probabilities(), before.probabilities());
    }

    #[test]
    fn test_learn_updates_fired_column() {
        let mut layer = layer();
        let before = layer.columns().to_vec();
        let input = [1.0, 0.0, 1.0, 0.0];

        let learning = layer.learn(&input, &one_hot(3)).unwrap();
        let winners: Vec<usize> = learning.active_columns.fired().collect();
        assert_eq!(winners.len(), 1);

        let winner = winners[0];
        assert_eq!(layer.probabilities().count(3, winner), 1);
        assert!((layer.columns()[winner].potential() - 0.2).abs() < 1e-6);

        for (after, prior) in layer.columns()[winner]
            .synapses()
            .iter()
            .zip(before[winner].synapses())
        {
            let expected = if input[after.index] != 0.0 {
                (prior.permanence + 0.05).min(1.0)
            } else {
                (prior.permanence - 0.1).max(0.0)
            };
            assert!((after.permanence - expected).abs() < 1e-6);
        }

        for col in (0..4).filter(|&c| c != winner) {
            assert_eq!(layer.columns()[col].potential(), 1.0);
            assert_eq!(layer.columns()[col].synapses(), before[col].synapses());
        }
    }

    #[test]
    fn test_potential_gates_but_does_not_exclude() {
        let mut layer = layer();
        let input = [1.0, 1.0, 1.0, 1.0];

        // Every column connects to every dimension, so all scores tie and column 0 keeps winning
        // while its potential shrinks without reaching zero.
        for _ in 0..6 {
            let learning = layer.learn(&input, &one_hot(0)).unwrap();
            assert_eq!(learning.active_columns.fired().collect::<Vec<_>>(), vec![0]);
        }

        let potential = layer.columns()[0].potential();
        assert!(potential > 0.0 && potential < 0.001);
        for col in 1..4 {
            assert_eq!(layer.columns()[col].potential(), 1.0);
        }
        assert_eq!(layer.probabilities().count(0, 0), 6);
    }

    #[test]
    fn test_repeated_winner_keeps_firing() {
        let mut layer = layer();
        let input = [1.0, 1.0, 1.0, 1.0];

        // 0.2^150 is far below the smallest f32 but still a nonzero potential.
        for _ in 0..150 {
            let learning = layer.learn(&input, &one_hot(1)).unwrap();
            assert_eq!(learning.active_columns.fired().collect::<Vec<_>>(), vec![0]);
        }

        assert!(layer.columns()[0].potential() > 0.0);
        assert_eq!(layer.probabilities().count(1, 0), 150);
    }
}
