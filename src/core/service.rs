//! Request/response messages for the transport that drives layers, and their dispatcher.
//!
//! The transport (sockets, dataset lookup, rendering) lives outside this crate. It decodes its
//! messages into [`Request`], hands them to [`LayerService::handle`] and forwards the
//! [`Response`] to whoever is observing. All payloads are plain numeric structures.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use super::{
    error::Result,
    layer::{Inference, LayerId},
    learning::{decode_label, Learning},
    repository::{LayerRepository, LayerSummary},
    settings::{SettingUpdate, Settings},
};

/// A command addressed to the layer service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Request {
    /// Create a layer, with the service defaults when `settings` is absent.
    #[serde(rename_all = "camelCase")]
    CreateLayer { settings: Option<Settings> },

    /// List all live layers.
    ListLayers,

    /// Train a layer on one labeled example.
    #[serde(rename_all = "camelCase")]
    Train {
        layer_id: LayerId,
        input: Vec<f32>,
        output: Vec<f32>,
    },

    /// Run a layer on one example without learning. With `output`, the guess is graded.
    #[serde(rename_all = "camelCase")]
    Test {
        layer_id: LayerId,
        input: Vec<f32>,
        output: Option<Vec<f32>>,
    },

    /// Change one setting of a layer.
    #[serde(rename_all = "camelCase")]
    UpdateSetting {
        layer_id: LayerId,
        update: SettingUpdate,
    },

    /// Delete a layer.
    #[serde(rename_all = "camelCase")]
    DeleteLayer { layer_id: LayerId },
}

/// The outcome of a [`Request`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Response {
    #[serde(rename_all = "camelCase")]
    LayerCreated { layer_id: LayerId },

    Layers { layers: Vec<LayerSummary> },

    #[serde(rename_all = "camelCase")]
    Trained {
        layer_id: LayerId,
        learning: Learning,
    },

    #[serde(rename_all = "camelCase")]
    Guess {
        layer_id: LayerId,
        inference: Inference,
        /// The ground-truth label, when the request carried one.
        expected: Option<usize>,
        /// Whether the best guess matched `expected`.
        correct: Option<bool>,
    },

    #[serde(rename_all = "camelCase")]
    SettingUpdated {
        layer_id: LayerId,
        settings: Settings,
    },

    #[serde(rename_all = "camelCase")]
    LayerDeleted { layer_id: LayerId },
}

/// Dispatches requests to the layers of one repository.
#[derive(Debug, Clone)]
pub struct LayerService {
    repository: Arc<LayerRepository>,
    defaults: Settings,
}

impl LayerService {
    /// Creates a service over `repository`, using `defaults` for layers created without settings.
    pub fn new(repository: Arc<LayerRepository>, defaults: Settings) -> Self {
        Self {
            repository,
            defaults,
        }
    }

    pub fn repository(&self) -> &Arc<LayerRepository> {
        &self.repository
    }

    /// Handles one request. Errors are returned to the caller, never retried.
    pub fn handle(&self, request: Request) -> Result<Response> {
        match request {
            Request::CreateLayer { settings } => {
                let settings = settings.unwrap_or_else(|| self.defaults.clone());
                let layer_id = self.repository.create(settings)?;
                Ok(Response::LayerCreated { layer_id })
            }
            Request::ListLayers => Ok(Response::Layers {
                layers: self.repository.summaries(),
            }),
            Request::Train {
                layer_id,
                input,
                output,
            } => {
                let learning = self.repository.learn(layer_id, &input, &output)?;
                Ok(Response::Trained { layer_id, learning })
            }
            Request::Test {
                layer_id,
                input,
                output,
            } => {
                let expected = output.as_deref().map(decode_label).transpose()?;
                let inference = self.repository.infer(layer_id, &input)?;
                let correct = expected.map(|label| inference.best_guess == Some(label));

                debug!(%layer_id, ?expected, best_guess = ?inference.best_guess, "tested");

                Ok(Response::Guess {
                    layer_id,
                    inference,
                    expected,
                    correct,
                })
            }
            Request::UpdateSetting { layer_id, update } => {
                let settings = self.repository.update_setting(layer_id, update)?;
                Ok(Response::SettingUpdated { layer_id, settings })
            }
            Request::DeleteLayer { layer_id } => {
                self.repository.remove(layer_id)?;
                info!(%layer_id, remaining = self.repository.len(), "delete handled");
                Ok(Response::LayerDeleted { layer_id })
            }
        }
    }
}
