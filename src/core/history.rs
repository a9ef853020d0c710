//! Derivation of chart history from upstream time series.

use super::rates::{HistoryPoint, TimeSeries};
use chrono::{Days, NaiveDate};

/// Inclusive `(start, end)` window of `days` days ending on `today`.
pub fn trailing_window(today: NaiveDate, days: u32) -> (NaiveDate, NaiveDate) {
    let back = u64::from(days.saturating_sub(1));
    let start = today.checked_sub_days(Days::new(back)).unwrap_or(NaiveDate::MIN);
    (start, today)
}

/// Flattens a time series into points for `target`, ascending by date.
///
/// Dates without a rate for `target` are skipped; no gap filling happens.
pub fn history_points(series: &TimeSeries, target: &str) -> Vec<HistoryPoint> {
    // BTreeMap keys are already in date order.
    series
        .rates
        .iter()
        .filter_map(|(date, rates)| {
            rates.get(target).map(|rate| HistoryPoint {
                date: *date,
                rate: *rate,
            })
        })
        .collect()
}

/// Constant 1.0 history for a currency paired with itself.
pub fn flat_history(today: NaiveDate, days: u32) -> Vec<HistoryPoint> {
    let (start, _) = trailing_window(today, days);
    start
        .iter_days()
        .take(days as usize)
        .map(|date| HistoryPoint { date, rate: 1.0 })
        .collect()
}
