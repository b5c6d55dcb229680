//! Engine configuration (`wikivars.toml`)

pub mod consts;
mod model;

pub use model::{EngineConfig, FeaturesConfig, StoreConfig};
