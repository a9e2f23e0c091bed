pub mod back_projection;
pub mod column;
pub mod error;
pub mod inhibition;
pub mod layer;
pub mod learning;
pub mod probabilities;
pub mod repository;
pub mod service;
pub mod settings;
pub mod synapses;
pub mod utilities;

pub use column::Column;
pub use error::{LayerError, Result};
pub use inhibition::ActiveColumns;
pub use layer::{Inference, Layer, LayerId};
pub use learning::Learning;
pub use settings::{SettingUpdate, Settings};
