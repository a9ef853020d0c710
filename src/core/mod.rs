//! Core data model, configuration and formatting

pub mod config;
pub mod format;
pub mod history;
pub mod log;
pub mod rates;

// Re-export main types for cleaner imports
pub use rates::{CurrencyMap, HistoryPoint, RateProvider, RatesSnapshot, TimeSeries, UpstreamError};
