// In crates/api-client/src/types.rs

use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};

/// The client for the currency-rate HTTP API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// The persistent HTTP client.
    pub http_client: Client,
    /// The base URL of the rate service, without a trailing slash.
    pub base_url: String,
    /// Optional access key appended to every request.
    pub access_key: Option<String>,
}

/// The body of `GET /latest`.
///
/// Only the fields the client inspects are modelled; `rates` stays a raw map
/// because providers disagree on whether rates are numbers or strings.
#[derive(Debug, Deserialize)]
pub struct LatestRatesResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub error: Option<ApiErrorInfo>,
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub rates: Option<Value>,
}

impl LatestRatesResponse {
    /// Returns the rates table, if the payload carries one as a JSON object.
    pub fn rates_table(&self) -> Option<&Map<String, Value>> {
        self.rates.as_ref().and_then(Value::as_object)
    }
}

/// Error details some providers attach when `success` is false.
#[derive(Debug, Deserialize)]
pub struct ApiErrorInfo {
    #[serde(rename = "type", default)]
    pub kind: Option<Value>,
    #[serde(default)]
    pub info: Option<String>,
}
