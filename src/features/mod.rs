//! Feature preparation
//!
//! Normalizes the live game state and a pitcher's history into comparable records.

pub mod history;
pub mod state;

pub use history::{filter_history, label_at_bats, RawPitchRow};
pub use state::RawGameSnapshot;
