//! Currency converter: debounced conversion plus the history series for the
//! selected pair.
//!
//! Conversion and history run in separate [`DebouncedTask`]s. The first is
//! keyed on amount and pair and waits for input to settle, the second is
//! keyed on the pair alone and starts at once.

use super::task::{DebouncedTask, Ticket};
use crate::core::config::{ConverterConfig, DefaultsConfig, HistoryConfig};
use crate::core::history::{flat_history, history_points, trailing_window};
use crate::core::{HistoryPoint, RateProvider};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub const CONVERT_ERROR_MESSAGE: &str = "Failed to convert currency. Please try again later.";
pub const HISTORY_ERROR_MESSAGE: &str =
    "Failed to fetch historical rates. Please try again later.";

/// Everything the converter widget renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConverterState {
    pub result: Option<f64>,
    pub loading: bool,
    pub error: Option<String>,
    pub history: Option<Vec<HistoryPoint>>,
    pub history_loading: bool,
    pub history_error: Option<String>,
}

pub struct ConverterView {
    provider: Arc<dyn RateProvider>,
    history_days: u32,
    amount: f64,
    from: String,
    to: String,
    state: Arc<Mutex<ConverterState>>,
    conversion: DebouncedTask,
    history: DebouncedTask,
}

impl ConverterView {
    /// Starts with an amount of 1 and kicks off the initial conversion and
    /// history fetch. Must be called inside a Tokio runtime.
    pub fn new(
        provider: Arc<dyn RateProvider>,
        defaults: &DefaultsConfig,
        converter: &ConverterConfig,
        history: &HistoryConfig,
    ) -> Self {
        Self::with_amount(provider, defaults, converter, history, 1.0)
    }

    /// Like [`ConverterView::new`] but starting from `amount`, so exactly one
    /// conversion is scheduled for it.
    pub fn with_amount(
        provider: Arc<dyn RateProvider>,
        defaults: &DefaultsConfig,
        converter: &ConverterConfig,
        history: &HistoryConfig,
        amount: f64,
    ) -> Self {
        let mut view = ConverterView {
            provider,
            history_days: history.days,
            amount,
            from: defaults.base_currency.clone(),
            to: defaults.target_currency.clone(),
            state: Arc::new(Mutex::new(ConverterState::default())),
            conversion: DebouncedTask::new("conversion", converter.debounce()),
            history: DebouncedTask::immediate("history"),
        };
        view.schedule_conversion();
        view.schedule_history();
        view
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn pair(&self) -> (&str, &str) {
        (&self.from, &self.to)
    }

    pub fn set_amount(&mut self, amount: f64) {
        if amount == self.amount {
            return;
        }
        self.amount = amount;
        self.schedule_conversion();
    }

    pub fn set_from(&mut self, from: &str) {
        if from == self.from {
            return;
        }
        self.from = from.to_string();
        self.schedule_conversion();
        self.schedule_history();
    }

    pub fn set_to(&mut self, to: &str) {
        if to == self.to {
            return;
        }
        self.to = to.to_string();
        self.schedule_conversion();
        self.schedule_history();
    }

    pub async fn state(&self) -> ConverterState {
        self.state.lock().await.clone()
    }

    /// Waits until the latest conversion and history jobs have finished.
    pub async fn settle(&mut self) -> ConverterState {
        self.conversion.settle().await;
        self.history.settle().await;
        self.state().await
    }

    fn schedule_conversion(&mut self) {
        let provider = Arc::clone(&self.provider);
        let state = Arc::clone(&self.state);
        let (amount, from, to) = (self.amount, self.from.clone(), self.to.clone());
        self.conversion
            .schedule(move |ticket| run_conversion(provider, state, ticket, amount, from, to));
    }

    fn schedule_history(&mut self) {
        let provider = Arc::clone(&self.provider);
        let state = Arc::clone(&self.state);
        let (from, to, days) = (self.from.clone(), self.to.clone(), self.history_days);
        self.history
            .schedule(move |ticket| run_history(provider, state, ticket, from, to, days));
    }
}

async fn run_conversion(
    provider: Arc<dyn RateProvider>,
    state: Arc<Mutex<ConverterState>>,
    ticket: Ticket,
    amount: f64,
    from: String,
    to: String,
) {
    {
        let mut s = state.lock().await;
        if !ticket.is_current() {
            return;
        }
        if !amount.is_finite() || amount < 0.0 {
            s.result = None;
            return;
        }
        if amount == 0.0 {
            s.result = Some(0.0);
            s.error = None;
            s.loading = false;
            return;
        }
        if from == to {
            s.result = Some(amount);
            s.error = None;
            s.loading = false;
            return;
        }
        s.loading = true;
        s.error = None;
    }

    let outcome = provider.convert(amount, &from, &to).await;

    let mut s = state.lock().await;
    if !ticket.is_current() {
        debug!(amount, from, to, "Discarding stale conversion");
        return;
    }
    match outcome {
        Ok(converted) => s.result = Some(converted),
        Err(e) => {
            warn!(amount, from, to, error = %e, "Conversion failed");
            s.error = Some(CONVERT_ERROR_MESSAGE.to_string());
            s.result = None;
        }
    }
    s.loading = false;
}

async fn run_history(
    provider: Arc<dyn RateProvider>,
    state: Arc<Mutex<ConverterState>>,
    ticket: Ticket,
    from: String,
    to: String,
    days: u32,
) {
    {
        let mut s = state.lock().await;
        if !ticket.is_current() {
            return;
        }
        s.history_loading = true;
        s.history_error = None;
        s.history = None;
    }

    let today = Utc::now().date_naive();
    let outcome = if from == to {
        Ok(flat_history(today, days))
    } else {
        let (start, end) = trailing_window(today, days);
        provider
            .time_series(start, end, &from, &[to.as_str()])
            .await
            .map(|series| history_points(&series, &to))
    };

    let mut s = state.lock().await;
    if !ticket.is_current() {
        debug!(from, to, "Discarding stale history");
        return;
    }
    match outcome {
        Ok(points) => s.history = Some(points),
        Err(e) => {
            warn!(from, to, error = %e, "History fetch failed");
            s.history_error = Some(HISTORY_ERROR_MESSAGE.to_string());
            s.history = None;
        }
    }
    s.history_loading = false;
}
