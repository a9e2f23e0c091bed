//! Hyperparameters of one layer.
//!
//! Settings are read once when a layer is created and stay fixed for that layer's columns, except
//! through an explicit [`SettingUpdate`]. They serialize with the camelCase names used by the
//! transport layer (`columnSqrtCount`, `inputSpace`, ...), and every field falls back to its
//! default when absent, so a partial JSON document is a valid configuration.

use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use super::error::{LayerError, Result};

/// Configuration of a single layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Columns are laid out as a square sheet of `column_sqrt_count²` columns.
    pub column_sqrt_count: usize,

    /// Length of every input vector.
    pub input_space: usize,

    /// Fraction of input dimensions each column may connect to.
    pub potential_percent: f64,

    /// Center of the initial permanence distribution.
    pub connection_threshold: f32,

    /// Permanence increase for a fired column's connection to an active input.
    pub active_increment: f32,

    /// Permanence decrease for a fired column's connection to an inactive input.
    pub inactive_decrement: f32,

    /// Fraction of all columns allowed to fire per input (global inhibition).
    pub active_column_ratio_per_inhibition_area: f64,

    /// An input value must exceed this to count towards a column's overlap.
    pub input_sensitivity: f32,

    /// Multiplier applied to the potential of columns that did not fire.
    pub repotentialization: f64,

    /// Multiplier applied to the potential of columns that fired.
    pub depotentialization: f64,

    /// Seed for column initialization. `None` draws a seed from the OS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            column_sqrt_count: 28,
            input_space: 28 * 28,
            potential_percent: 0.55,
            connection_threshold: 0.2,
            active_increment: 0.05,
            inactive_decrement: 0.1,
            active_column_ratio_per_inhibition_area: 0.01,
            input_sensitivity: 0.7,
            repotentialization: 1.05,
            depotentialization: 0.2,
            seed: None,
        }
    }
}

impl Settings {
    /// Parses settings from a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads settings from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// The number of columns in a layer built from these settings, saturating at `usize::MAX`.
    #[inline]
    pub fn column_count(&self) -> usize {
        self.column_sqrt_count.saturating_mul(self.column_sqrt_count)
    }

    /// The number of input dimensions each column may connect to: `floor(input_space * potential_percent)`.
    #[inline]
    pub fn potential_pool_size(&self) -> usize {
        let size = (self.input_space as f64 * self.potential_percent).floor() as usize;
        size.min(self.input_space)
    }

    /// Checks that a layer can be built from these settings.
    pub fn validate(&self) -> Result<()> {
        if self.column_sqrt_count == 0 {
            return Err(LayerError::configuration("columnSqrtCount must be positive"));
        }
        if self.column_sqrt_count.checked_mul(self.column_sqrt_count).is_none() {
            return Err(LayerError::configuration(format!(
                "columnSqrtCount {} gives more columns than fit in memory",
                self.column_sqrt_count
            )));
        }
        if self.input_space == 0 {
            return Err(LayerError::configuration("inputSpace must be positive"));
        }

        check_fraction("potentialPercent", self.potential_percent)?;
        check_fraction("connectionThreshold", self.connection_threshold as f64)?;
        check_fraction("inputSensitivity", self.input_sensitivity as f64)?;

        let ratio = self.active_column_ratio_per_inhibition_area;
        if !ratio.is_finite() || ratio <= 0.0 || ratio > 1.0 {
            return Err(LayerError::configuration(format!(
                "activeColumnRatioPerInhibitionArea must be in (0, 1], got {ratio}"
            )));
        }

        for (name, value) in [
            ("activeIncrement", self.active_increment as f64),
            ("inactiveDecrement", self.inactive_decrement as f64),
            ("repotentialization", self.repotentialization),
            ("depotentialization", self.depotentialization),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(LayerError::configuration(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }

        Ok(())
    }

    /// Returns a copy with `update` applied, validated as a whole.
    pub fn with_update(&self, update: SettingUpdate) -> Result<Self> {
        let mut next = self.clone();

        match update {
            SettingUpdate::ColumnSqrtCount(v) => next.column_sqrt_count = v,
            SettingUpdate::InputSpace(v) => next.input_space = v,
            SettingUpdate::PotentialPercent(v) => next.potential_percent = v,
            SettingUpdate::ConnectionThreshold(v) => next.connection_threshold = v,
            SettingUpdate::ActiveIncrement(v) => next.active_increment = v,
            SettingUpdate::InactiveDecrement(v) => next.inactive_decrement = v,
            SettingUpdate::ActiveColumnRatioPerInhibitionArea(v) => {
                next.active_column_ratio_per_inhibition_area = v
            }
            SettingUpdate::InputSensitivity(v) => next.input_sensitivity = v,
            SettingUpdate::Repotentialization(v) => next.repotentialization = v,
            SettingUpdate::Depotentialization(v) => next.depotentialization = v,
            SettingUpdate::Seed(v) => next.seed = v,
        }

        next.validate()?;
        Ok(next)
    }
}

fn check_fraction(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(LayerError::configuration(format!(
            "{name} must be in [0, 1], got {value}"
        )));
    }
    Ok(())
}

/// A change to one named setting of a live layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "key", content = "value", rename_all = "camelCase")]
pub enum SettingUpdate {
    ColumnSqrtCount(usize),
    InputSpace(usize),
    PotentialPercent(f64),
    ConnectionThreshold(f32),
    ActiveIncrement(f32),
    InactiveDecrement(f32),
    ActiveColumnRatioPerInhibitionArea(f64),
    InputSensitivity(f32),
    Repotentialization(f64),
    Depotentialization(f64),
    Seed(Option<u64>),
}

impl SettingUpdate {
    /// Whether the layer's columns must be rebuilt for this update to take effect.
    ///
    /// Changing the grid size, the input length or the connection pool changes the shape of every
    /// column, so learned permanences and probability counts are discarded.
    pub fn reshapes_layer(&self) -> bool {
        matches!(
            self,
            Self::ColumnSqrtCount(_) | Self::InputSpace(_) | Self::PotentialPercent(_)
        )
    }
}
