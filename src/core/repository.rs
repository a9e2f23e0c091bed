//! An explicit registry of live layers keyed by id.
//!
//! Each layer sits behind its own `RwLock`: learning takes the write lock for the whole step, so
//! at most one mutating call runs per layer, while inference calls share read locks and may run
//! concurrently with each other. The map itself has a separate lock that is only held long enough
//! to look up, insert or remove an entry.

use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

use super::{
    error::{LayerError, Result},
    layer::{Inference, Layer, LayerId},
    learning::Learning,
    settings::{SettingUpdate, Settings},
};

/// A layer shared between request handlers.
pub type SharedLayer = Arc<RwLock<Layer>>;

/// The externally visible description of a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerSummary {
    pub id: LayerId,
    pub settings: Settings,
}

/// Layers in working memory. Nothing here outlives the process.
#[derive(Debug, Default)]
pub struct LayerRepository {
    layers: RwLock<FxHashMap<LayerId, SharedLayer>>,
}

impl LayerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a new layer under a fresh id and registers it.
    pub fn create(&self, settings: Settings) -> Result<LayerId> {
        let layer = Layer::new(LayerId::new(), settings)?;
        Ok(self.insert(layer))
    }

    /// Registers an existing layer, replacing any layer with the same id.
    pub fn insert(&self, layer: Layer) -> LayerId {
        let id = layer.id();
        self.layers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(RwLock::new(layer)));
        id
    }

    /// Looks up a layer.
    pub fn get(&self, id: LayerId) -> Result<SharedLayer> {
        self.layers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or(LayerError::NotFound(id))
    }

    /// Removes a layer. In-flight calls holding the layer finish on their own copy of the handle.
    pub fn remove(&self, id: LayerId) -> Result<()> {
        self.layers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .ok_or(LayerError::NotFound(id))?;

        info!(layer_id = %id, "layer deleted");
        Ok(())
    }

    /// Ids of all registered layers, ascending.
    pub fn ids(&self) -> Vec<LayerId> {
        let mut ids: Vec<LayerId> = self
            .layers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.layers.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Summaries of all registered layers, ascending by id.
    pub fn summaries(&self) -> Vec<LayerSummary> {
        self.ids()
            .into_iter()
            .filter_map(|id| self.summary(id).ok())
            .collect()
    }

    /// Summary of one layer.
    pub fn summary(&self, id: LayerId) -> Result<LayerSummary> {
        let layer = self.get(id)?;
        let layer = layer.read().unwrap_or_else(PoisonError::into_inner);
        Ok(LayerSummary {
            id,
            settings: layer.settings().clone(),
        })
    }

    /// Trains one layer while holding its write lock.
    pub fn learn(&self, id: LayerId, input: &[f32], output: &[f32]) -> Result<Learning> {
        let layer = self.get(id)?;
        let mut layer = layer.write().unwrap_or_else(PoisonError::into_inner);
        layer.learn(input, output)
    }

    /// Runs inference on one layer while holding a read lock.
    pub fn infer(&self, id: LayerId, input: &[f32]) -> Result<Inference> {
        let layer = self.get(id)?;
        let layer = layer.read().unwrap_or_else(PoisonError::into_inner);
        layer.infer(input)
    }

    /// Changes one setting of a live layer and returns the new settings.
    ///
    /// Updates that change the shape of the columns rebuild the layer, discarding learned
    /// permanences, potentials and probability counts. Other updates take effect on the next call.
    pub fn update_setting(&self, id: LayerId, update: SettingUpdate) -> Result<Settings> {
        let layer = self.get(id)?;
        let mut layer = layer.write().unwrap_or_else(PoisonError::into_inner);
        let settings = layer.settings().with_update(update)?;

        if update.reshapes_layer() {
            layer.reinitialize(settings.clone())?;
        } else {
            layer.settings = settings.clone();
        }

        info!(layer_id = %id, ?update, rebuilt = update.reshapes_layer(), "setting updated");
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::probabilities::LABEL_COUNT;
    use std::thread;

    fn settings() -> Settings {
        Settings {
            column_sqrt_count: 3,
            input_space: 16,
            potential_percent: 0.5,
            active_column_ratio_per_inhibition_area: 0.2,
            input_sensitivity: 0.5,
            seed: Some(3),
            ..Default::default()
        }
    }

    fn one_hot(label: usize) -> Vec<f32> {
        let mut output = vec![0.0; LABEL_COUNT];
        output[label] = 1.0;
        output
    }

    #[test]
    fn test_create_get_remove() {
        let repository = LayerRepository::new();
        let id = repository.create(settings()).unwrap();

        assert_eq!(repository.ids(), vec![id]);
        assert!(repository.get(id).is_ok());

        repository.remove(id).unwrap();
        assert!(repository.is_empty());
        assert!(matches!(repository.get(id), Err(LayerError::NotFound(missing)) if missing == id));
        assert!(matches!(repository.remove(id), Err(LayerError::NotFound(_))));
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let repository = LayerRepository::new();
        let id = LayerId::new();

        assert!(matches!(repository.learn(id, &[0.0; 16], &one_hot(0)), Err(LayerError::NotFound(_))));
        assert!(matches!(repository.infer(id, &[0.0; 16]), Err(LayerError::NotFound(_))));
        assert!(matches!(
            repository.update_setting(id, SettingUpdate::ActiveIncrement(0.1)),
            Err(LayerError::NotFound(_))
        ));
    }

    #[test]
    fn test_update_setting_in_place() {
        let repository = LayerRepository::new();
        let id = repository.create(settings()).unwrap();
        repository.learn(id, &[1.0; 16], &one_hot(2)).unwrap();

        let updated = repository
            .update_setting(id, SettingUpdate::InputSensitivity(0.1))
            .unwrap();
        assert_eq!(updated.input_sensitivity, 0.1);

        let layer = repository.get(id).unwrap();
        let layer = layer.read().unwrap();
        assert_eq!(layer.settings().input_sensitivity, 0.1);
        assert_eq!(layer.probabilities().label_counts(2).iter().sum::<u32>(), 2);
    }

    #[test]
    fn test_reshaping_update_rebuilds_layer() {
        let repository = LayerRepository::new();
        let id = repository.create(settings()).unwrap();
        repository.learn(id, &[1.0; 16], &one_hot(2)).unwrap();

        repository
            .update_setting(id, SettingUpdate::ColumnSqrtCount(4))
            .unwrap();

        let layer = repository.get(id).unwrap();
        let layer = layer.read().unwrap();
        assert_eq!(layer.id(), id);
        assert_eq!(layer.columns().len(), 16);
        assert_eq!(layer.probabilities().column_count(), 16);
        assert_eq!(layer.probabilities().label_counts(2).iter().sum::<u32>(), 0);
    }

    #[test]
    fn test_invalid_update_keeps_settings() {
        let repository = LayerRepository::new();
        let id = repository.create(settings()).unwrap();

        assert!(repository
            .update_setting(id, SettingUpdate::ColumnSqrtCount(0))
            .is_err());
        assert_eq!(repository.summary(id).unwrap().settings, settings());
    }

    #[test]
    fn test_concurrent_learning_is_serialized() {
        let repository = Arc::new(LayerRepository::new());
        let id = repository.create(settings()).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let repository = Arc::clone(&repository);
                thread::spawn(move || {
                    for _ in 0..25 {
                        repository.learn(id, &[1.0; 16], &one_hot(t)).unwrap();
                        repository.infer(id, &[1.0; 16]).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let layer = repository.get(id).unwrap();
        let layer = layer.read().unwrap();
        // ceil(9 * 0.2) = 2 winners per step, 100 steps in total.
        let total: u32 = (0..4)
            .map(|label| layer.probabilities().label_counts(label).iter().sum::<u32>())
            .sum();
        assert_eq!(total, 200);
    }
}
