use crate::core::{ExchangeRateObservation, GoldPriceObservation, HistoryStore, PersistenceError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::debug;

/// A chronologically ordered series with store-assigned ids.
struct Series<T> {
    entries: Vec<T>,
    next_id: u64,
}

impl<T: Clone> Series<T> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }

    fn take_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Inserts keeping `(observed_at, id)` ascending, so late arrivals with an
    /// older timestamp still land in the right place.
    fn insert(&mut self, entry: T, key: impl Fn(&T) -> (DateTime<Utc>, u64)) {
        let k = key(&entry);
        let pos = self.entries.partition_point(|e| key(e) <= k);
        self.entries.insert(pos, entry);
    }

    fn newest_first(&self, limit: Option<usize>) -> Vec<T> {
        let limit = limit.unwrap_or(usize::MAX);
        self.entries.iter().rev().take(limit).cloned().collect()
    }
}

fn rate_key(o: &ExchangeRateObservation) -> (DateTime<Utc>, u64) {
    (o.observed_at, o.id)
}

fn gold_key(o: &GoldPriceObservation) -> (DateTime<Utc>, u64) {
    (o.observed_at, o.id)
}

struct Inner {
    rates: Series<ExchangeRateObservation>,
    gold: Series<GoldPriceObservation>,
}

/// Volatile history store, used for tests and `storage: memory`.
pub struct MemoryHistoryStore {
    inner: Mutex<Inner>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                rates: Series::new(),
                gold: Series::new(),
            }),
        }
    }
}

impl Default for MemoryHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn append_rate(
        &self,
        rate: Decimal,
        observed_at: DateTime<Utc>,
    ) -> Result<ExchangeRateObservation, PersistenceError> {
        let mut inner = self.inner.lock().await;
        let obs = ExchangeRateObservation {
            id: inner.rates.take_id(),
            rate,
            observed_at,
        };
        inner.rates.insert(obs.clone(), rate_key);
        debug!(id = obs.id, "Stored exchange rate in memory");
        Ok(obs)
    }

    async fn append_gold_price(
        &self,
        price_per_gram: Decimal,
        observed_at: DateTime<Utc>,
    ) -> Result<GoldPriceObservation, PersistenceError> {
        let mut inner = self.inner.lock().await;
        let obs = GoldPriceObservation {
            id: inner.gold.take_id(),
            price_per_gram,
            observed_at,
        };
        inner.gold.insert(obs.clone(), gold_key);
        debug!(id = obs.id, "Stored gold price in memory");
        Ok(obs)
    }

    async fn append_cycle(
        &self,
        rate: Decimal,
        price_per_gram: Decimal,
        observed_at: DateTime<Utc>,
    ) -> Result<(ExchangeRateObservation, GoldPriceObservation), PersistenceError> {
        // a single lock guard makes both inserts visible together
        let mut inner = self.inner.lock().await;
        let rate_obs = ExchangeRateObservation {
            id: inner.rates.take_id(),
            rate,
            observed_at,
        };
        let gold_obs = GoldPriceObservation {
            id: inner.gold.take_id(),
            price_per_gram,
            observed_at,
        };
        inner.rates.insert(rate_obs.clone(), rate_key);
        inner.gold.insert(gold_obs.clone(), gold_key);
        Ok((rate_obs, gold_obs))
    }

    async fn latest_gold_price(&self) -> Result<Option<GoldPriceObservation>, PersistenceError> {
        let inner = self.inner.lock().await;
        Ok(inner.gold.entries.last().cloned())
    }

    async fn list_rates(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<ExchangeRateObservation>, PersistenceError> {
        Ok(self.inner.lock().await.rates.newest_first(limit))
    }

    async fn list_gold_prices(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<GoldPriceObservation>, PersistenceError> {
        Ok(self.inner.lock().await.gold.newest_first(limit))
    }
}
