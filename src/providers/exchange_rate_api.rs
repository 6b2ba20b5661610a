use super::util::{build_client, decimal_from_json, get_json, redact};
use crate::core::source::BASE_CURRENCY;
use crate::core::{ExchangeRateSource, FetchError};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

const SOURCE: &str = "exchange rate API";

/// Fetches `USD -> target` rates from an exchangerate-api.com v6 compatible endpoint.
pub struct ExchangeRateApiProvider {
    base_url: String,
    api_key: String,
    target_currency: String,
    client: reqwest::Client,
}

impl ExchangeRateApiProvider {
    pub fn new(
        base_url: &str,
        api_key: &str,
        target_currency: &str,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        Ok(ExchangeRateApiProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            target_currency: target_currency.to_uppercase(),
            client: build_client(timeout)?,
        })
    }
}

#[derive(Deserialize, Debug)]
struct LatestRatesResponse {
    result: Option<String>,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
    conversion_rates: Option<HashMap<String, serde_json::Number>>,
}

#[async_trait]
impl ExchangeRateSource for ExchangeRateApiProvider {
    #[instrument(name = "ExchangeRateFetch", skip(self))]
    async fn fetch_rate(&self) -> Result<Decimal, FetchError> {
        let url = format!(
            "{}/v6/{}/latest/{}",
            self.base_url, self.api_key, BASE_CURRENCY
        );
        let log_url = redact(&url, &self.api_key);

        let data: LatestRatesResponse = get_json(&self.client, &url, &log_url, SOURCE).await?;

        if let Some(result) = data.result.as_deref().filter(|r| *r != "success") {
            return Err(FetchError::Payload(format!(
                "{SOURCE} returned result '{}' ({})",
                result,
                data.error_type.as_deref().unwrap_or("no error type")
            )));
        }

        let value = data
            .conversion_rates
            .as_ref()
            .and_then(|rates| rates.get(&self.target_currency))
            .ok_or_else(|| {
                FetchError::Payload(format!(
                    "no conversion rate for {} in {SOURCE} response",
                    self.target_currency
                ))
            })?;

        let rate = decimal_from_json(value)?;
        debug!(%rate, currency = %self.target_currency, "Received exchange rate");
        Ok(rate)
    }
}
