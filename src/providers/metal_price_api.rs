use super::util::{build_client, decimal_from_json, get_json, redact};
use crate::core::source::BASE_CURRENCY;
use crate::core::{FetchError, MetalRateSource};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

const SOURCE: &str = "metal price API";

/// Fetches metal units per USD from a metalpriceapi.com v1 compatible endpoint.
pub struct MetalPriceApiProvider {
    base_url: String,
    api_key: String,
    metal: String,
    client: reqwest::Client,
}

impl MetalPriceApiProvider {
    pub fn new(
        base_url: &str,
        api_key: &str,
        metal: &str,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        Ok(MetalPriceApiProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            metal: metal.to_uppercase(),
            client: build_client(timeout)?,
        })
    }
}

#[derive(Deserialize, Debug)]
struct LatestMetalResponse {
    success: Option<bool>,
    error: Option<MetalApiError>,
    rates: Option<HashMap<String, serde_json::Number>>,
}

#[derive(Deserialize, Debug)]
struct MetalApiError {
    #[serde(alias = "statusCode")]
    status_code: Option<u16>,
    message: Option<String>,
}

#[async_trait]
impl MetalRateSource for MetalPriceApiProvider {
    #[instrument(name = "MetalRateFetch", skip(self))]
    async fn fetch_units_per_base(&self) -> Result<Decimal, FetchError> {
        let url = format!(
            "{}/v1/latest?api_key={}&base={}&currencies={}",
            self.base_url, self.api_key, BASE_CURRENCY, self.metal
        );
        let log_url = redact(&url, &self.api_key);

        let data: LatestMetalResponse = get_json(&self.client, &url, &log_url, SOURCE).await?;

        if data.success == Some(false) {
            let (code, message) = data
                .error
                .map(|e| (e.status_code, e.message))
                .unwrap_or_default();
            return Err(FetchError::Payload(format!(
                "{SOURCE} reported failure {}: {}",
                code.map_or("?".to_string(), |c| c.to_string()),
                message.as_deref().unwrap_or("no message")
            )));
        }

        let value = data
            .rates
            .as_ref()
            .and_then(|rates| rates.get(&self.metal))
            .ok_or_else(|| {
                FetchError::Payload(format!("no rate for {} in {SOURCE} response", self.metal))
            })?;

        let units = decimal_from_json(value)?;
        debug!(%units, metal = %self.metal, "Received metal units per {}", BASE_CURRENCY);
        Ok(units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const API_KEY: &str = "metal-key";

    async fn create_mock_server(status: u16, mock_response: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/latest"))
            .and(query_param("api_key", API_KEY))
            .and(query_param("base", "USD"))
            .and(query_param("currencies", "XAU"))
            .respond_with(ResponseTemplate::new(status).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        mock_server
    }

    fn provider(mock_server: &MockServer) -> MetalPriceApiProvider {
        MetalPriceApiProvider::new(&mock_server.uri(), API_KEY, "XAU", Duration::from_secs(5))
            .unwrap()
    }

    #[tokio::test]
    async fn test_successful_metal_fetch() {
        let mock_response = r#"{
            "success": true,
            "base": "USD",
            "timestamp": 1740830400,
            "rates": { "XAU": 0.00038015 }
        }"#;
        let mock_server = create_mock_server(200, mock_response).await;

        let units = provider(&mock_server).fetch_units_per_base().await.unwrap();
        assert_eq!(units, Decimal::from_str("0.00038015").unwrap());
    }

    #[tokio::test]
    async fn test_missing_metal_field() {
        let mock_response = r#"{"success": true, "base": "USD", "rates": {"XAG": 0.031}}"#;
        let mock_server = create_mock_server(200, mock_response).await;

        let result = provider(&mock_server).fetch_units_per_base().await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "invalid payload: no rate for XAU in metal price API response"
        );
    }

    #[tokio::test]
    async fn test_unsuccessful_payload() {
        let mock_response = r#"{
            "success": false,
            "error": { "statusCode": 101, "message": "Invalid API key" }
        }"#;
        let mock_server = create_mock_server(200, mock_response).await;

        let result = provider(&mock_server).fetch_units_per_base().await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "invalid payload: metal price API reported failure 101: Invalid API key"
        );
    }

    #[tokio::test]
    async fn test_api_error_status() {
        let mock_server = create_mock_server(401, r#"{"success": false}"#).await;

        let result = provider(&mock_server).fetch_units_per_base().await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error: 401 from metal price API"
        );
    }
}
