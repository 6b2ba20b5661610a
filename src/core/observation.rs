//! Observations recorded by the refresh pipeline

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single USD to target currency rate, as returned by the upstream rate API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRateObservation {
    pub id: u64,
    pub rate: Decimal,
    pub observed_at: DateTime<Utc>,
}

/// Derived price of one gram of gold in the target currency, quantized to 4 decimals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoldPriceObservation {
    pub id: u64,
    pub price_per_gram: Decimal,
    pub observed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    #[test]
    fn test_gold_price_wire_format() {
        let obs = GoldPriceObservation {
            id: 7,
            price_per_gram: Decimal::from_str("4186.4021").unwrap(),
            observed_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 0).unwrap(),
        };

        let json = serde_json::to_value(&obs).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["pricePerGram"], "4186.4021");
        assert_eq!(json["observedAt"], "2025-03-01T12:30:00Z");
    }

    #[test]
    fn test_exchange_rate_wire_format_keeps_precision() {
        let obs = ExchangeRateObservation {
            id: 1,
            rate: Decimal::from_str("49.123456789012345").unwrap(),
            observed_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 0).unwrap(),
        };

        let json = serde_json::to_string(&obs).unwrap();
        assert!(json.contains(r#""rate":"49.123456789012345""#));

        let parsed: ExchangeRateObservation = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, obs);
    }
}
