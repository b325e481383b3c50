//! Weekly fishing-hotspot pipeline: synthetic ocean fields, weekly features,
//! hotspot labels and distance-penalized ranking of coastal grid cells.

pub mod config;
pub mod coords;
pub mod environment;
pub mod error;
pub mod export;
pub mod features;
pub mod grid;
pub mod labels;
pub mod mask;
pub mod model;
pub mod pipeline;
pub mod ports;
pub mod scorer;
pub mod store;
pub mod week;

pub use error::{HotspotError, Result};
