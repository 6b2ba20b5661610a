//! Upstream market data abstractions

use super::error::FetchError;
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Currency every upstream quote is expressed against.
pub const BASE_CURRENCY: &str = "USD";

/// Provides the current conversion rate from [`BASE_CURRENCY`] to the target currency.
#[async_trait]
pub trait ExchangeRateSource: Send + Sync {
    async fn fetch_rate(&self) -> Result<Decimal, FetchError>;
}

/// Provides how many units of metal (troy ounces) one unit of [`BASE_CURRENCY`] buys.
///
/// This is the inverse of the metal price, e.g. `0.00038` ounces per USD.
#[async_trait]
pub trait MetalRateSource: Send + Sync {
    async fn fetch_units_per_base(&self) -> Result<Decimal, FetchError>;
}
