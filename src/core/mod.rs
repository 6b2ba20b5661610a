//! Core business logic abstractions

pub mod calculator;
pub mod config;
pub mod error;
pub mod history;
pub mod log;
pub mod observation;
pub mod source;

// Re-export main types for cleaner imports
pub use calculator::{TROY_OUNCE_GRAMS, compute_price_per_gram};
pub use error::{DivisionError, FetchError, PersistenceError, RefreshError};
pub use history::HistoryStore;
pub use observation::{ExchangeRateObservation, GoldPriceObservation};
pub use source::{ExchangeRateSource, MetalRateSource};
