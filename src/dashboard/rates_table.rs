//! Rates table: which currencies to list for a base, and re-fetching when
//! the base changes.

use crate::core::config::RatesConfig;
use crate::core::format::{format_fixed, format_rates_date};
use crate::core::{CurrencyMap, RateProvider, RatesSnapshot};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::warn;

pub const RATES_ERROR_MESSAGE: &str = "Failed to fetch rates. Please try again later.";

/// Picks the currency codes shown for `base`.
///
/// Major currencies come first, remaining slots are filled alphabetically.
/// If the base itself was picked it is swapped for exactly one replacement,
/// so the table can end up one row short when several slots collide.
pub fn select_display_codes(base: &str, rates: &RatesSnapshot, config: &RatesConfig) -> Vec<String> {
    let available: Vec<&str> = rates.rates.keys().map(String::as_str).collect();

    let mut selected: Vec<String> = config
        .major_currencies
        .iter()
        .filter(|code| available.contains(&code.as_str()))
        .cloned()
        .collect();

    let remainder = |selected: &[String]| -> Vec<String> {
        let mut pool: Vec<String> = available
            .iter()
            .filter(|code| **code != base && !selected.iter().any(|s| s == **code))
            .map(|code| code.to_string())
            .collect();
        pool.sort();
        pool
    };

    let needed = config.display_count.saturating_sub(selected.len());
    if needed > 0 {
        let extras = remainder(&selected);
        selected.extend(extras.into_iter().take(needed));
    }

    if selected.iter().any(|code| code == base) {
        selected.retain(|code| code != base);
        if let Some(replacement) = remainder(&selected).into_iter().next() {
            selected.push(replacement);
        }
    }

    let unique: BTreeSet<String> = selected.into_iter().collect();
    unique.into_iter().take(config.display_count).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateRow {
    pub code: String,
    pub name: String,
    pub rate: f64,
}

impl RateRow {
    pub fn formatted_rate(&self) -> String {
        format_fixed(self.rate, 4)
    }
}

/// Rates table state for one dashboard.
pub struct RatesTableView {
    provider: Arc<dyn RateProvider>,
    config: RatesConfig,
    currencies: CurrencyMap,
    initial_base: String,
    initial_rates: RatesSnapshot,
    pub current_base: String,
    pub rates: RatesSnapshot,
    pub display_codes: Vec<String>,
    pub loading: bool,
    pub error: Option<String>,
}

impl RatesTableView {
    pub fn new(
        provider: Arc<dyn RateProvider>,
        config: RatesConfig,
        currencies: CurrencyMap,
        base: &str,
        initial_rates: RatesSnapshot,
    ) -> Self {
        let display_codes = select_display_codes(base, &initial_rates, &config);
        RatesTableView {
            provider,
            config,
            currencies,
            initial_base: base.to_string(),
            rates: initial_rates.clone(),
            initial_rates,
            current_base: base.to_string(),
            display_codes,
            loading: false,
            error: None,
        }
    }

    /// Codes offered in the base selector, alphabetical.
    pub fn base_options(&self) -> Vec<(&str, &str)> {
        self.currencies
            .iter()
            .map(|(code, name)| (code.as_str(), name.as_str()))
            .collect()
    }

    pub async fn set_base(&mut self, base: &str) {
        self.current_base = base.to_string();

        if base == self.initial_base {
            self.rates = self.initial_rates.clone();
            self.display_codes = select_display_codes(base, &self.rates, &self.config);
            self.error = None;
            return;
        }

        self.loading = true;
        self.error = None;

        match self.provider.latest_rates(base).await {
            Ok(rates) => {
                self.display_codes = select_display_codes(base, &rates, &self.config);
                self.rates = rates;
            }
            Err(e) => {
                warn!(base, error = %e, "Failed to refresh rates table");
                self.error = Some(RATES_ERROR_MESSAGE.to_string());
            }
        }
        self.loading = false;
    }

    /// Rows for the display codes that have a rate in the current snapshot.
    pub fn rows(&self) -> Vec<RateRow> {
        self.display_codes
            .iter()
            .filter_map(|code| {
                let rate = *self.rates.rates.get(code)?;
                Some(RateRow {
                    code: code.clone(),
                    name: self.currencies.get(code).cloned().unwrap_or_default(),
                    rate,
                })
            })
            .collect()
    }

    pub fn date_label(&self) -> String {
        format_rates_date(self.rates.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::UpstreamError;
    use crate::dashboard::testing::StubProvider;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn snapshot(base: &str, codes: &[&str]) -> RatesSnapshot {
        RatesSnapshot {
            amount: Some(1.0),
            base: base.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 12, 13).unwrap(),
            rates: codes
                .iter()
                .enumerate()
                .map(|(i, code)| (code.to_string(), 1.0 + i as f64))
                .collect(),
        }
    }

    const ALL: &[&str] = &[
        "AUD", "BGN", "BRL", "CAD", "CHF", "CNY", "CZK", "DKK", "EUR", "GBP", "HKD", "HUF", "INR",
        "JPY", "NZD", "USD",
    ];

    fn without(code: &str) -> Vec<&'static str> {
        ALL.iter().copied().filter(|c| *c != code).collect()
    }

    #[test]
    fn test_majors_selected_for_eur_base() {
        let rates = snapshot("EUR", &without("EUR"));
        let codes = select_display_codes("EUR", &rates, &RatesConfig::default());

        // EUR is absent from its own snapshot, BGN fills the free slot.
        assert_eq!(
            codes,
            vec!["AUD", "BGN", "CAD", "CHF", "CNY", "GBP", "HKD", "JPY", "NZD", "USD"]
        );
    }

    #[test]
    fn test_base_in_major_list_is_replaced() {
        // Snapshot that (unusually) lists the base too.
        let rates = snapshot("USD", ALL);
        let config = RatesConfig::default();
        let codes = select_display_codes("USD", &rates, &config);

        assert!(!codes.contains(&"USD".to_string()));
        assert_eq!(codes.len(), config.display_count);
        assert!(codes.contains(&"BGN".to_string()));
        assert!(codes.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_fewer_available_than_display_count() {
        let rates = snapshot("EUR", &["USD", "GBP", "ZAR"]);
        let codes = select_display_codes("EUR", &rates, &RatesConfig::default());
        assert_eq!(codes, vec!["GBP", "USD", "ZAR"]);
    }

    #[test]
    fn test_single_replacement_can_underfill() {
        let config = RatesConfig {
            major_currencies: vec!["USD".to_string(), "GBP".to_string()],
            display_count: 2,
        };
        let rates = snapshot("USD", &["USD", "GBP"]);
        let codes = select_display_codes("USD", &rates, &config);
        assert_eq!(codes, vec!["GBP"]);
    }

    #[test]
    fn test_selection_is_idempotent() {
        let rates = snapshot("USD", ALL);
        let config = RatesConfig::default();
        assert_eq!(
            select_display_codes("USD", &rates, &config),
            select_display_codes("USD", &rates, &config)
        );
    }

    fn currencies() -> CurrencyMap {
        BTreeMap::from([
            ("EUR".to_string(), "Euro".to_string()),
            ("GBP".to_string(), "British Pound".to_string()),
            ("USD".to_string(), "United States Dollar".to_string()),
        ])
    }

    #[tokio::test]
    async fn test_set_base_fetches_new_snapshot() {
        let provider = Arc::new(StubProvider::default());
        provider.set_latest("USD", snapshot("USD", &["EUR", "GBP"]));
        let mut view = RatesTableView::new(
            provider.clone(),
            RatesConfig::default(),
            currencies(),
            "EUR",
            snapshot("EUR", &["GBP", "USD"]),
        );

        view.set_base("USD").await;

        assert_eq!(view.current_base, "USD");
        assert_eq!(view.display_codes, vec!["EUR", "GBP"]);
        assert!(view.error.is_none());
        assert!(!view.loading);
        let rows = view.rows();
        assert_eq!(rows[0].name, "Euro");
        assert_eq!(rows[0].formatted_rate(), "1.0000");
        assert_eq!(provider.latest_calls(), 1);
    }

    #[tokio::test]
    async fn test_returning_to_initial_base_skips_network() {
        let provider = Arc::new(StubProvider::default());
        provider.set_latest("USD", snapshot("USD", &["EUR"]));
        let mut view = RatesTableView::new(
            provider.clone(),
            RatesConfig::default(),
            currencies(),
            "EUR",
            snapshot("EUR", &["GBP", "USD"]),
        );

        view.set_base("USD").await;
        view.set_base("EUR").await;

        assert_eq!(view.rates.base, "EUR");
        assert_eq!(view.display_codes, vec!["GBP", "USD"]);
        assert_eq!(provider.latest_calls(), 1);
    }

    #[tokio::test]
    async fn test_upstream_failure_sets_error() {
        let provider = Arc::new(StubProvider::default());
        provider.fail_with(|| UpstreamError::Url("boom".to_string()));
        let mut view = RatesTableView::new(
            provider,
            RatesConfig::default(),
            currencies(),
            "EUR",
            snapshot("EUR", &["GBP", "USD"]),
        );

        view.set_base("GBP").await;

        assert_eq!(view.error.as_deref(), Some(RATES_ERROR_MESSAGE));
        assert!(!view.loading);
        assert_eq!(view.date_label(), "Friday Dec 13, 2024, 23:59 UTC");
    }
}
