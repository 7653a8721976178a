//! Data retrieval
//!
//! Remote clients for live game state, schedules and pitch history, plus the
//! date bookkeeping that decides which history to ask for.

pub mod calendar;
pub mod scrapers;

pub use calendar::{Calendar, DateWindow};
pub use scrapers::savant::SavantClient;
pub use scrapers::statsapi::StatsApiClient;
