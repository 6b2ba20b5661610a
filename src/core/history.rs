//! Append-only history of observations

use super::error::PersistenceError;
use super::observation::{ExchangeRateObservation, GoldPriceObservation};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Persistence for both observation series.
///
/// Ids are assigned by the store and increase per series. Listing methods
/// return observations ordered by `observed_at` descending, newest first;
/// `limit` of `None` returns the full series.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append_rate(
        &self,
        rate: Decimal,
        observed_at: DateTime<Utc>,
    ) -> Result<ExchangeRateObservation, PersistenceError>;

    async fn append_gold_price(
        &self,
        price_per_gram: Decimal,
        observed_at: DateTime<Utc>,
    ) -> Result<GoldPriceObservation, PersistenceError>;

    /// Records both observations of one refresh cycle as a single unit: either
    /// both are visible afterwards or neither is.
    async fn append_cycle(
        &self,
        rate: Decimal,
        price_per_gram: Decimal,
        observed_at: DateTime<Utc>,
    ) -> Result<(ExchangeRateObservation, GoldPriceObservation), PersistenceError>;

    async fn latest_gold_price(&self) -> Result<Option<GoldPriceObservation>, PersistenceError>;

    async fn list_rates(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<ExchangeRateObservation>, PersistenceError>;

    async fn list_gold_prices(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<GoldPriceObservation>, PersistenceError>;
}
