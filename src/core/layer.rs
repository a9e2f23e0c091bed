//! The `Layer` holds one sheet of columns together with its classifier state and settings.
//!
//! A layer is built once by [`Layer::new`]:
//! - A potential-connectivity mask with exactly `floor(input_space * potential_percent)` ones is
//!   shuffled independently for every column, so each column gets its own receptive field.
//! - Every masked-in dimension gets a synapse with a permanence drawn by the bias sampler around
//!   `connection_threshold`. Masked-out dimensions have no connection.
//! - Every column starts fully eligible (potential 1.0) and all probability counts start at zero.
//!
//! After that, the layer is mutated in place by every call to [`Layer::learn`], while
//! [`Layer::infer`] only reads it.

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    back_projection::back_project,
    column::Column,
    error::{LayerError, Result},
    inhibition::{select_active, ActiveColumns},
    probabilities::{best_guess, best_guesses, ProbabilityTable},
    settings::Settings,
    synapses::{init_synapses, potential_mask},
};

/// Opaque unique identifier of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub Uuid);

impl LayerId {
    /// A fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The result of running a layer on one input without learning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inference {
    pub active_columns: ActiveColumns,
    pub back_projection: Vec<f32>,
    /// Score per label, ascending by label. Labels no fired column has seen are absent.
    pub best_guesses: BTreeMap<usize, u64>,
    pub best_guess: Option<usize>,
}

/// A layer of competing columns.
#[derive(Debug, Clone)]
pub struct Layer {
    pub(crate) id: LayerId,
    pub(crate) columns: Vec<Column>,
    pub(crate) probabilities: ProbabilityTable,
    pub(crate) settings: Settings,
}

impl Layer {
    /// Creates a layer, seeding column initialization from `settings.seed` when present.
    ///
    /// Fails with [`LayerError::Configuration`] if the settings are invalid.
    pub fn new(id: LayerId, settings: Settings) -> Result<Self> {
        let mut rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::with_rng(id, settings, &mut rng)
    }

    /// Creates a layer, drawing every random choice from `rng`.
    pub fn with_rng<R: Rng>(id: LayerId, settings: Settings, rng: &mut R) -> Result<Self> {
        settings.validate()?;

        let column_count = settings.column_count();
        let pool_size = settings.potential_pool_size();
        let mut mask = potential_mask(settings.input_space, pool_size);

        let columns = (0..column_count)
            .map(|_| Column::new(init_synapses(&mut mask, settings.connection_threshold, rng)))
            .collect();

        info!(
            layer_id = %id,
            columns = column_count,
            connections_per_column = pool_size,
            "layer created"
        );

        Ok(Self {
            id,
            columns,
            probabilities: ProbabilityTable::new(column_count),
            settings,
        })
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn probabilities(&self) -> &ProbabilityTable {
        &self.probabilities
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Checks that `input` has exactly `input_space` entries.
    pub fn check_input(&self, input: &[f32]) -> Result<()> {
        if input.len() != self.settings.input_space {
            return Err(LayerError::length_mismatch(
                "input",
                self.settings.input_space,
                input.len(),
            ));
        }
        Ok(())
    }

    /// Runs inhibition on `input` with this layer's ratio and sensitivity.
    pub fn select_active(&self, input: &[f32]) -> Result<ActiveColumns> {
        self.check_input(input)?;
        Ok(select_active(
            &self.columns,
            self.settings.active_column_ratio_per_inhibition_area,
            input,
            self.settings.input_sensitivity,
        ))
    }

    /// Back-projects the fired columns of `active` into the input space.
    pub fn back_project(&self, active: &ActiveColumns) -> Result<Vec<f32>> {
        back_project(&self.columns, active, self.settings.input_space)
    }

    /// Classifies `input` without changing any learned state.
    pub fn infer(&self, input: &[f32]) -> Result<Inference> {
        let active_columns = self.select_active(input)?;
        let back_projection = self.back_project(&active_columns)?;
        let best_guesses = best_guesses(&active_columns, &self.probabilities);
        let best_guess = best_guess(&best_guesses);

        debug!(
            layer_id = %self.id,
            winners = active_columns.fired_count(),
            best_guess = ?best_guess,
            "inference"
        );

        Ok(Inference {
            active_columns,
            back_projection,
            best_guesses,
            best_guess,
        })
    }

    /// Replaces the settings and rebuilds every column, discarding learned state.
    pub(crate) fn reinitialize(&mut self, settings: Settings) -> Result<()> {
        *self = Self::new(self.id, settings)?;
        Ok(())
    }
}
