//! Prediction
//!
//! Score history against the live state, pool the closest pitches and estimate
//! the pitch mix.

pub mod estimate;
pub mod inference;
pub mod neighbors;
pub mod scoring;

pub use inference::Predictor;
pub use scoring::{Feature, FeatureWeights};
