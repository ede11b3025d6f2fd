// In crates/api-client/src/lib.rs

use app_config::types::FeedSettings;
use rust_decimal::Decimal;
use serde_json::Value;
use std::time::Duration;

pub mod error;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use types::*;

impl ApiClient {
    /// Constructs a new ApiClient from the feed settings.
    pub fn new(settings: &FeedSettings) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.request_timeout_ms))
            .build()
            .map_err(|e| Error::ClientBuildError(e.to_string()))?;

        Ok(ApiClient {
            http_client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            access_key: settings.access_key.clone().filter(|k| !k.is_empty()),
        })
    }

    /// Fetches the latest exchange rate for `base/quote`.
    ///
    /// This corresponds to the `GET /latest?base=EUR&symbols=USD` endpoint.
    /// Currency codes are upper-cased before the request is built.
    pub async fn fetch_latest_price(&self, base: &str, quote: &str) -> Result<Decimal> {
        let base = base.to_uppercase();
        let quote = quote.to_uppercase();
        let pair = format!("{}/{}", base, quote);

        let url = format!("{}/latest", self.base_url);
        let mut query = vec![("base", base.as_str()), ("symbols", quote.as_str())];
        if let Some(key) = &self.access_key {
            query.push(("access_key", key.as_str()));
        }

        let response = self
            .http_client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(Error::RequestFailed)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus { pair, status: status.as_u16() });
        }

        let text = response.text().await.map_err(Error::RequestFailed)?;
        let body: LatestRatesResponse =
            serde_json::from_str(&text).map_err(Error::DeserializationFailed)?;

        let rate = extract_rate(&body, &quote)?;
        tracing::debug!(pair = %pair, rate = %rate, "Fetched latest rate.");
        Ok(rate)
    }
}

/// Pulls the `quote` rate out of a `/latest` payload.
///
/// The quote key is matched case-insensitively and the value may be a JSON
/// number or a numeric string.
pub fn extract_rate(body: &LatestRatesResponse, quote: &str) -> Result<Decimal> {
    // Providers report failures in-band with a 200 status.
    if body.success == Some(false) {
        let kind = body
            .error
            .as_ref()
            .and_then(|e| e.kind.as_ref())
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        return Err(Error::ApiError { kind });
    }

    let rates = body
        .rates_table()
        .ok_or_else(|| Error::MalformedResponse("missing rates table".into()))?;

    let raw = rates
        .iter()
        .find(|(symbol, _)| symbol.eq_ignore_ascii_case(quote))
        .map(|(_, value)| value)
        .ok_or_else(|| Error::MalformedResponse(format!("no rate for {}", quote)))?;

    let value = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| Error::MalformedResponse(format!("non-numeric rate for {}: {}", quote, raw)))?;

    if value <= 0.0 {
        return Err(Error::MalformedResponse(format!("non-positive rate for {}: {}", quote, raw)));
    }

    core_types::price_from_f64(value).map_err(|e| Error::MalformedResponse(e.to_string()))
}

// Free function to allow api_client::new usage
pub fn new(settings: &FeedSettings) -> Result<ApiClient> {
    ApiClient::new(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::collections::HashMap;

    fn parse(body: Value) -> LatestRatesResponse {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn extracts_numeric_rate() {
        let body = parse(json!({ "base": "EUR", "rates": { "USD": 1.0853 } }));
        assert_eq!(extract_rate(&body, "USD").unwrap(), dec!(1.0853));
    }

    #[test]
    fn extracts_string_rate_with_case_insensitive_key() {
        let body = parse(json!({ "rates": { "usd": "1.085321" } }));
        assert_eq!(extract_rate(&body, "USD").unwrap(), dec!(1.08532));
    }

    #[test]
    fn in_band_failure_reports_error_type() {
        let body = parse(json!({ "success": false, "error": { "type": "missing_access_key" } }));
        match extract_rate(&body, "USD") {
            Err(Error::ApiError { kind }) => assert_eq!(kind, "missing_access_key"),
            other => panic!("unexpected result: {:?}", other),
        }

        let body = parse(json!({ "success": false, "error": { "type": 104 } }));
        match extract_rate(&body, "USD") {
            Err(Error::ApiError { kind }) => assert_eq!(kind, "unknown"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn missing_or_bad_rates_are_malformed() {
        for body in [
            json!({}),
            json!({ "rates": [1.0] }),
            json!({ "rates": { "GBP": 0.85 } }),
            json!({ "rates": { "USD": "n/a" } }),
            json!({ "rates": { "USD": null } }),
            json!({ "rates": { "USD": 0 } }),
        ] {
            let parsed = parse(body.clone());
            assert!(
                matches!(extract_rate(&parsed, "USD"), Err(Error::MalformedResponse(_))),
                "expected malformed for {}",
                body
            );
        }
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client_for(base_url: String) -> ApiClient {
        let settings = FeedSettings {
            base_url,
            ..FeedSettings::default()
        };
        ApiClient::new(&settings).unwrap()
    }

    #[tokio::test]
    async fn fetches_rate_from_server() {
        let router = Router::new().route(
            "/latest",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                // Codes arrive upper-cased.
                assert_eq!(params.get("base").map(String::as_str), Some("EUR"));
                assert_eq!(params.get("symbols").map(String::as_str), Some("USD"));
                Json(json!({ "success": true, "base": "EUR", "rates": { "USD": 1.08612 } }))
            }),
        );
        let client = client_for(serve(router).await);

        let rate = client.fetch_latest_price("eur", "usd").await.unwrap();
        assert_eq!(rate, dec!(1.08612));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let router = Router::new().route(
            "/latest",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
        );
        let client = client_for(serve(router).await);

        match client.fetch_latest_price("EUR", "USD").await {
            Err(Error::HttpStatus { pair, status }) => {
                assert_eq!(pair, "EUR/USD");
                assert_eq!(status, 503);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn non_json_body_is_an_error() {
        let router = Router::new().route("/latest", get(|| async { "<html>oops</html>" }));
        let client = client_for(serve(router).await);

        assert!(matches!(
            client.fetch_latest_price("EUR", "USD").await,
            Err(Error::DeserializationFailed(_))
        ));
    }
}
