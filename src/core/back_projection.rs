//! Reconstructs an input-space pattern from the receptive fields of the fired columns.

use super::{
    column::Column,
    error::{LayerError, Result},
    inhibition::ActiveColumns,
};

/// Averages the permanences of every fired column per input dimension.
///
/// Dimensions a column is not connected to contribute zero. The result has length `input_space`.
/// Fails with [`LayerError::InvalidInput`] when `active` does not cover exactly `columns`, and with
/// [`LayerError::EmptyActivation`] when no column fired.
pub fn back_project(columns: &[Column], active: &ActiveColumns, input_space: usize) -> Result<Vec<f32>> {
    if active.len() != columns.len() {
        return Err(LayerError::length_mismatch("activeColumns", columns.len(), active.len()));
    }

    let mut projection = vec![0.0f32; input_space];
    let mut count = 0usize;

    for col in active.fired() {
        for syn in columns[col].synapses() {
            if let Some(sum) = projection.get_mut(syn.index) {
                *sum += syn.permanence;
            }
        }
        count += 1;
    }

    if count == 0 {
        return Err(LayerError::EmptyActivation);
    }

    let count = count as f32;
    projection.iter_mut().for_each(|sum| *sum /= count);

    Ok(projection)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_averages_fired_columns() {
        let columns = vec![
            Column::from_permanences(&[Some(0.4), None, Some(1.0)], 1.0),
            Column::from_permanences(&[Some(0.2), Some(0.6), None], 1.0),
            Column::from_permanences(&[Some(1.0), Some(1.0), Some(1.0)], 1.0),
        ];
        let active = ActiveColumns::from(vec![0.0, 0.0, 0.7]);

        let projection = back_project(&columns, &active, 3).unwrap();

        let expected = [0.3, 0.3, 0.5];
        assert_eq!(projection.len(), 3);
        for (got, want) in projection.iter().zip(expected) {
            assert!((got - want).abs() < 1e-6, "{got} != {want}");
        }
    }

    #[test]
    fn test_no_fired_columns_is_an_error() {
        let columns = vec![Column::from_permanences(&[Some(0.4)], 1.0)];
        let active = ActiveColumns::from(vec![1.0]);

        assert!(matches!(
            back_project(&columns, &active, 1),
            Err(LayerError::EmptyActivation)
        ));
    }

    #[test]
    fn test_activation_of_wrong_length_is_rejected() {
        let columns = vec![
            Column::from_permanences(&[Some(0.4)], 1.0),
            Column::from_permanences(&[Some(0.8)], 1.0),
        ];

        for values in [vec![0.0], vec![0.0, 1.0, 0.0]] {
            assert!(matches!(
                back_project(&columns, &ActiveColumns::from(values), 1),
                Err(LayerError::InvalidInput { .. })
            ));
        }
    }
}
