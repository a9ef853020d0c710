//! In-memory rate provider for view tests.

use crate::core::{CurrencyMap, RateProvider, RatesSnapshot, TimeSeries, UpstreamError};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Default)]
pub struct StubProvider {
    latest: Mutex<HashMap<String, RatesSnapshot>>,
    pair_rates: Mutex<HashMap<(String, String), f64>>,
    series: Mutex<HashMap<(String, String), TimeSeries>>,
    delay: Mutex<Duration>,
    failure: Mutex<Option<fn() -> UpstreamError>>,
    latest_calls: AtomicUsize,
    convert_calls: AtomicUsize,
    series_calls: AtomicUsize,
}

impl StubProvider {
    pub fn set_latest(&self, base: &str, snapshot: RatesSnapshot) {
        self.latest.lock().unwrap().insert(base.to_string(), snapshot);
    }

    pub fn set_rate(&self, from: &str, to: &str, rate: f64) {
        self.pair_rates
            .lock()
            .unwrap()
            .insert((from.to_string(), to.to_string()), rate);
    }

    pub fn set_series(&self, from: &str, to: &str, series: TimeSeries) {
        self.series
            .lock()
            .unwrap()
            .insert((from.to_string(), to.to_string()), series);
    }

    /// Every call sleeps this long before answering.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn fail_with(&self, failure: fn() -> UpstreamError) {
        *self.failure.lock().unwrap() = Some(failure);
    }

    pub fn latest_calls(&self) -> usize {
        self.latest_calls.load(Ordering::SeqCst)
    }

    pub fn convert_calls(&self) -> usize {
        self.convert_calls.load(Ordering::SeqCst)
    }

    pub fn series_calls(&self) -> usize {
        self.series_calls.load(Ordering::SeqCst)
    }

    async fn respond(&self) -> Result<(), UpstreamError> {
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match *self.failure.lock().unwrap() {
            Some(failure) => Err(failure()),
            None => Ok(()),
        }
    }

    fn missing(from: &str, to: &str) -> UpstreamError {
        UpstreamError::EmptyRates {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

#[async_trait]
impl RateProvider for StubProvider {
    async fn list_currencies(&self) -> Result<CurrencyMap, UpstreamError> {
        self.respond().await?;
        Ok(CurrencyMap::new())
    }

    async fn latest_rates(&self, base: &str) -> Result<RatesSnapshot, UpstreamError> {
        self.latest_calls.fetch_add(1, Ordering::SeqCst);
        self.respond().await?;
        self.latest
            .lock()
            .unwrap()
            .get(base)
            .cloned()
            .ok_or_else(|| Self::missing(base, "*"))
    }

    async fn convert(&self, amount: f64, from: &str, to: &str) -> Result<f64, UpstreamError> {
        self.convert_calls.fetch_add(1, Ordering::SeqCst);
        self.respond().await?;
        let rate = self
            .pair_rates
            .lock()
            .unwrap()
            .get(&(from.to_string(), to.to_string()))
            .copied()
            .ok_or_else(|| Self::missing(from, to))?;
        Ok(amount * rate)
    }

    async fn time_series(
        &self,
        _start: NaiveDate,
        _end: NaiveDate,
        base: &str,
        targets: &[&str],
    ) -> Result<TimeSeries, UpstreamError> {
        self.series_calls.fetch_add(1, Ordering::SeqCst);
        self.respond().await?;
        let to = targets.join(",");
        self.series
            .lock()
            .unwrap()
            .get(&(base.to_string(), to.clone()))
            .cloned()
            .ok_or_else(|| Self::missing(base, &to))
    }
}
