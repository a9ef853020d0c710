use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Url;
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

use crate::core::{CurrencyMap, RateProvider, RatesSnapshot, TimeSeries, UpstreamError};

const USER_AGENT_VALUE: &str = concat!("fxdash/", env!("CARGO_PKG_VERSION"));

/// Only the rates matter for a single-amount conversion.
#[derive(Debug, Deserialize)]
struct ConversionResponse {
    rates: BTreeMap<String, f64>,
}

/// Client for the Frankfurter exchange-rate API.
pub struct FrankfurterProvider {
    base_url: String,
    client: reqwest::Client,
}

impl FrankfurterProvider {
    pub fn new(base_url: &str) -> Self {
        FrankfurterProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, UpstreamError> {
        let raw = format!("{}{}", self.base_url, path);
        let url = if params.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, params)
        };
        url.map_err(|e| UpstreamError::Url(format!("{raw}: {e}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, UpstreamError> {
        let endpoint = url.path().to_string();
        debug!(%url, "Requesting Frankfurter data");

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, USER_AGENT_VALUE)
            .send()
            .await
            .map_err(|source| UpstreamError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status { status, endpoint });
        }

        let text = response
            .text()
            .await
            .map_err(|source| UpstreamError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;

        serde_json::from_str(&text).map_err(|source| UpstreamError::Decode { endpoint, source })
    }
}

#[async_trait]
impl RateProvider for FrankfurterProvider {
    #[instrument(name = "FrankfurterCurrencies", skip(self))]
    async fn list_currencies(&self) -> Result<CurrencyMap, UpstreamError> {
        let url = self.endpoint("/currencies", &[])?;
        self.get_json(url).await
    }

    #[instrument(name = "FrankfurterLatest", skip(self))]
    async fn latest_rates(&self, base: &str) -> Result<RatesSnapshot, UpstreamError> {
        let url = self.endpoint("/latest", &[("from", base)])?;
        self.get_json(url).await
    }

    #[instrument(name = "FrankfurterConvert", skip(self))]
    async fn convert(&self, amount: f64, from: &str, to: &str) -> Result<f64, UpstreamError> {
        // Upstream omits the base from `rates`, so a same-currency request
        // would come back empty.
        if from == to {
            return Ok(amount);
        }
        let amount_param = amount.to_string();
        let url = self.endpoint(
            "/latest",
            &[("amount", &amount_param), ("from", from), ("to", to)],
        )?;
        let response: ConversionResponse = self.get_json(url).await?;

        response
            .rates
            .into_values()
            .next()
            .ok_or_else(|| UpstreamError::EmptyRates {
                from: from.to_string(),
                to: to.to_string(),
            })
    }

    #[instrument(name = "FrankfurterTimeSeries", skip(self, targets), fields(targets = ?targets))]
    async fn time_series(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        base: &str,
        targets: &[&str],
    ) -> Result<TimeSeries, UpstreamError> {
        let joined = targets.join(",");
        let url = self.endpoint(&format!("/{start}..{end}"), &[("from", base), ("to", &joined)])?;
        self.get_json(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_mock_server(request_path: &str, mock_response: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(request_path))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        mock_server
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn test_list_currencies() {
        let mock_response = r#"{"EUR": "Euro", "JPY": "Japanese Yen", "USD": "United States Dollar"}"#;
        let mock_server = create_mock_server("/currencies", mock_response).await;
        let provider = FrankfurterProvider::new(&mock_server.uri());

        let currencies = provider.list_currencies().await.unwrap();
        assert_eq!(currencies.len(), 3);
        assert_eq!(currencies["JPY"], "Japanese Yen");
    }

    #[tokio::test]
    async fn test_latest_rates() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .and(query_param("from", "EUR"))
            .and(header("user-agent", USER_AGENT_VALUE))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"amount": 1.0, "base": "EUR", "date": "2024-12-13",
                    "rates": {"GBP": 0.8286, "JPY": 161.23, "USD": 1.0505}}"#,
            ))
            .mount(&mock_server)
            .await;
        let provider = FrankfurterProvider::new(&format!("{}/", mock_server.uri()));

        let snapshot = provider.latest_rates("EUR").await.unwrap();
        assert_eq!(snapshot.base, "EUR");
        assert_eq!(snapshot.date, date("2024-12-13"));
        assert_eq!(snapshot.rates.len(), 3);
        assert_eq!(snapshot.rates["USD"], 1.0505);
    }

    #[tokio::test]
    async fn test_convert_returns_sole_rate() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .and(query_param("amount", "100"))
            .and(query_param("from", "EUR"))
            .and(query_param("to", "USD"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"amount": 100.0, "base": "EUR", "date": "2024-12-13", "rates": {"USD": 105.05}}"#,
            ))
            .mount(&mock_server)
            .await;
        let provider = FrankfurterProvider::new(&mock_server.uri());

        let converted = provider.convert(100.0, "EUR", "USD").await.unwrap();
        assert_eq!(converted, 105.05);
    }

    #[tokio::test]
    async fn test_convert_empty_rates() {
        let mock_response = r#"{"amount": 1.0, "base": "EUR", "date": "2024-12-13", "rates": {}}"#;
        let mock_server = create_mock_server("/latest", mock_response).await;
        let provider = FrankfurterProvider::new(&mock_server.uri());

        let result = provider.convert(1.0, "EUR", "XXX").await;
        assert!(matches!(result, Err(UpstreamError::EmptyRates { .. })));
        assert_eq!(
            result.unwrap_err().to_string(),
            "No rate returned for EUR -> XXX"
        );
    }

    #[tokio::test]
    async fn test_convert_same_currency_is_identity() {
        let mock_response = r#"{"amount": 5.0, "base": "EUR", "date": "2024-12-13", "rates": {}}"#;
        let mock_server = create_mock_server("/latest", mock_response).await;
        let provider = FrankfurterProvider::new(&mock_server.uri());

        for amount in [5.0, 0.25, 1234.5] {
            assert_eq!(provider.convert(amount, "EUR", "EUR").await.unwrap(), amount);
        }
        let received = mock_server.received_requests().await.unwrap_or_default();
        assert!(received.is_empty());
    }

    #[tokio::test]
    async fn test_time_series_joins_targets() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2024-12-02..2024-12-03"))
            .and(query_param("from", "EUR"))
            .and(query_param("to", "USD,GBP"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"amount": 1.0, "base": "EUR", "start_date": "2024-12-02", "end_date": "2024-12-03",
                    "rates": {"2024-12-02": {"GBP": 0.83, "USD": 1.05},
                              "2024-12-03": {"GBP": 0.82, "USD": 1.06}}}"#,
            ))
            .mount(&mock_server)
            .await;
        let provider = FrankfurterProvider::new(&mock_server.uri());

        let series = provider
            .time_series(date("2024-12-02"), date("2024-12-03"), "EUR", &["USD", "GBP"])
            .await
            .unwrap();
        assert_eq!(series.start_date, date("2024-12-02"));
        assert_eq!(series.rates.len(), 2);
        assert_eq!(series.rates[&date("2024-12-03")]["USD"], 1.06);
    }

    #[tokio::test]
    async fn test_api_error_response() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/currencies"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;
        let provider = FrankfurterProvider::new(&mock_server.uri());

        let result = provider.list_currencies().await;
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error: 500 Internal Server Error from /currencies"
        );
    }

    #[tokio::test]
    async fn test_not_found_is_upstream_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;
        let provider = FrankfurterProvider::new(&mock_server.uri());

        let result = provider.latest_rates("XXX").await;
        assert!(matches!(
            result,
            Err(UpstreamError::Status { status, .. }) if status == reqwest::StatusCode::NOT_FOUND
        ));
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let mock_server = create_mock_server("/latest", r#"{"base": "EUR"}"#).await;
        let provider = FrankfurterProvider::new(&mock_server.uri());

        let result = provider.latest_rates("EUR").await;
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse response from /latest")
        );
    }
}
