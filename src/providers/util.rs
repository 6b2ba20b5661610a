use crate::core::FetchError;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("goldwatch/", env!("CARGO_PKG_VERSION"));

/// Builds the HTTP client shared by a provider. Every request is bounded by `timeout`.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, FetchError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| FetchError::Request(e.to_string()))
}

/// Performs a GET and decodes the JSON body.
///
/// `log_url` is what gets logged and reported; callers pass a redacted form
/// of `url` so API keys never reach the logs.
pub async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    log_url: &str,
    source: &'static str,
) -> Result<T, FetchError> {
    debug!("Requesting {} data from {}", source, log_url);

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| FetchError::Request(format!("{source} ({log_url}): {}", e.without_url())))?;

    if !response.status().is_success() {
        return Err(FetchError::Status {
            status: response.status().as_u16(),
            source,
        });
    }

    let text = response
        .text()
        .await
        .map_err(|e| FetchError::Request(format!("{source}: {}", e.without_url())))?;

    serde_json::from_str(&text)
        .map_err(|e| FetchError::Payload(format!("failed to parse {source} response: {e}")))
}

/// Replaces every occurrence of `secret` in `text`.
pub fn redact(text: &str, secret: &str) -> String {
    if secret.is_empty() {
        return text.to_string();
    }
    text.replace(secret, "***")
}

/// Converts a JSON number into a [`Decimal`] through its shortest textual form,
/// so `0.00038015` stays exactly `0.00038015` rather than its binary expansion.
pub fn decimal_from_json(value: &serde_json::Number) -> Result<Decimal, FetchError> {
    let text = value.to_string();
    let parsed = if text.contains(['e', 'E']) {
        Decimal::from_scientific(&text)
    } else {
        Decimal::from_str(&text)
    };
    parsed.map_err(|e| FetchError::Payload(format!("unrepresentable number {text}: {e}")))
}
