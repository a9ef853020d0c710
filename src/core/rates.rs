//! Exchange-rate data model and the upstream rate source abstraction

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// ISO currency code -> display name, e.g. `"EUR" -> "Euro"`.
pub type CurrencyMap = BTreeMap<String, String>;

/// Latest rates for every currency relative to a single base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatesSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    pub base: String,
    pub date: NaiveDate,
    pub rates: BTreeMap<String, f64>,
}

/// Daily rates between `start_date` and `end_date`, keyed by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    pub base: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub rates: BTreeMap<NaiveDate, BTreeMap<String, f64>>,
}

/// A single sample of the history chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub rate: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("HTTP error: {status} from {endpoint}")]
    Status {
        status: reqwest::StatusCode,
        endpoint: String,
    },

    #[error("No rate returned for {from} -> {to}")]
    EmptyRates { from: String, to: String },

    #[error("Request error for {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to parse response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid upstream URL: {0}")]
    Url(String),
}

/// Read-only access to an exchange-rate service.
#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn list_currencies(&self) -> Result<CurrencyMap, UpstreamError>;

    async fn latest_rates(&self, base: &str) -> Result<RatesSnapshot, UpstreamError>;

    /// Converts `amount` of `from` into `to` using the latest rate.
    async fn convert(&self, amount: f64, from: &str, to: &str) -> Result<f64, UpstreamError>;

    /// Daily rates of `base` against each of `targets` over an inclusive date range.
    async fn time_series(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        base: &str,
        targets: &[&str],
    ) -> Result<TimeSeries, UpstreamError>;
}
