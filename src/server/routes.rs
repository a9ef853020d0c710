//! JSON pass-through routes to the upstream rate API.

use super::AppState;
use super::error::ApiError;
use crate::core::history::trailing_window;
use crate::core::{CurrencyMap, RatesSnapshot, TimeSeries};
use crate::dashboard::converter::{CONVERT_ERROR_MESSAGE, HISTORY_ERROR_MESSAGE};
use crate::dashboard::rates_table::RATES_ERROR_MESSAGE;
use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use chrono::Utc;
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

const CURRENCIES_ERROR_MESSAGE: &str = "Failed to fetch currencies. Please try again later.";

/// Treats empty query values as absent.
pub(crate) fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Parses a strictly positive, finite amount.
pub(crate) fn parse_amount(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite() && *amount > 0.0)
}

#[derive(Debug, Deserialize)]
pub struct ConvertParams {
    amount: Option<String>,
    from: Option<String>,
    to: Option<String>,
}

/// Writes whole amounts without a fraction, `100` rather than `100.0`.
fn serialize_amount<S: Serializer>(amount: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    if amount.fract() == 0.0 && amount.abs() < MAX_EXACT {
        serializer.serialize_i64(*amount as i64)
    } else {
        serializer.serialize_f64(*amount)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ConvertResponse {
    #[serde(serialize_with = "serialize_amount")]
    pub amount: f64,
    pub from: String,
    pub to: String,
    pub converted: f64,
}

pub async fn convert(
    State(state): State<AppState>,
    params: Result<Query<ConvertParams>, QueryRejection>,
) -> Result<Json<ConvertResponse>, ApiError> {
    let Query(params) = params?;
    let (Some(amount), Some(from), Some(to)) = (
        present(params.amount),
        present(params.from),
        present(params.to),
    ) else {
        return Err(ApiError::Validation(
            "Missing required query params: amount, from, to",
        ));
    };

    let amount = parse_amount(&amount).ok_or(ApiError::Validation(
        "Invalid amount. Must be a number greater than 0.",
    ))?;

    debug!(amount, from, to, "Converting");
    let converted = state
        .provider
        .convert(amount, &from, &to)
        .await
        .map_err(ApiError::upstream("/api/convert", CONVERT_ERROR_MESSAGE))?;

    Ok(Json(ConvertResponse {
        amount,
        from,
        to,
        converted,
    }))
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    from: Option<String>,
    to: Option<String>,
}

pub async fn history(
    State(state): State<AppState>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> Result<Json<TimeSeries>, ApiError> {
    let Query(params) = params?;
    let (Some(from), Some(to)) = (present(params.from), present(params.to)) else {
        return Err(ApiError::Validation(
            "Missing required query params: from, to",
        ));
    };

    let (start, end) = trailing_window(Utc::now().date_naive(), state.config.history.days);
    let series = state
        .provider
        .time_series(start, end, &from, &[to.as_str()])
        .await
        .map_err(ApiError::upstream("/api/history", HISTORY_ERROR_MESSAGE))?;

    Ok(Json(series))
}

#[derive(Debug, Deserialize)]
pub struct RatesParams {
    base: Option<String>,
}

pub async fn rates(
    State(state): State<AppState>,
    params: Result<Query<RatesParams>, QueryRejection>,
) -> Result<Json<RatesSnapshot>, ApiError> {
    let Query(params) = params?;
    let base = present(params.base)
        .ok_or(ApiError::Validation("Missing required query param: base"))?;

    let snapshot = state
        .provider
        .latest_rates(&base)
        .await
        .map_err(ApiError::upstream("/api/rates", RATES_ERROR_MESSAGE))?;

    Ok(Json(snapshot))
}

pub async fn currencies(State(state): State<AppState>) -> Result<Json<CurrencyMap>, ApiError> {
    let currencies = state
        .provider
        .list_currencies()
        .await
        .map_err(ApiError::upstream("/api/currencies", CURRENCIES_ERROR_MESSAGE))?;

    Ok(Json(currencies))
}
