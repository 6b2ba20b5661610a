use crate::core::{ExchangeRateObservation, GoldPriceObservation, HistoryStore, PersistenceError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

const RATES_PARTITION: &str = "exchange_rates";
const GOLD_PARTITION: &str = "gold_prices";

/// Builds the 16 byte record key: biased big-endian timestamp followed by the
/// big-endian id. Byte order of keys equals `(observed_at, id)` order.
fn record_key(observed_at: DateTime<Utc>, id: u64) -> Vec<u8> {
    let biased = (observed_at.timestamp_micros() as u64) ^ (1 << 63);
    let mut key = Vec::with_capacity(16);
    key.extend_from_slice(&biased.to_be_bytes());
    key.extend_from_slice(&id.to_be_bytes());
    key
}

fn id_from_key(key: &[u8]) -> Option<u64> {
    key.get(8..16)
        .and_then(|bytes| bytes.try_into().ok())
        .map(u64::from_be_bytes)
}

/// Highest id present in a partition, so numbering continues after a restart.
fn max_id(partition: &PartitionHandle) -> Result<u64, PersistenceError> {
    let mut max = 0;
    for item in partition.iter() {
        let (key, _) = item?;
        if let Some(id) = id_from_key(&key) {
            max = max.max(id);
        }
    }
    Ok(max)
}

/// History store persisted in an fjall keyspace, one partition per series.
pub struct FjallHistoryStore {
    keyspace: Keyspace,
    rates: PartitionHandle,
    gold: PartitionHandle,
    next_rate_id: AtomicU64,
    next_gold_id: AtomicU64,
}

impl FjallHistoryStore {
    pub fn open(path: &Path) -> Result<Self, PersistenceError> {
        std::fs::create_dir_all(path)
            .map_err(|e| PersistenceError(format!("{}: {e}", path.display())))?;

        let keyspace = Config::new(path).open()?;
        let rates = keyspace.open_partition(RATES_PARTITION, PartitionCreateOptions::default())?;
        let gold = keyspace.open_partition(GOLD_PARTITION, PartitionCreateOptions::default())?;

        let next_rate_id = AtomicU64::new(max_id(&rates)? + 1);
        let next_gold_id = AtomicU64::new(max_id(&gold)? + 1);
        debug!(path = %path.display(), "Opened history keyspace");

        Ok(Self {
            keyspace,
            rates,
            gold,
            next_rate_id,
            next_gold_id,
        })
    }

    fn sync(&self) -> Result<(), PersistenceError> {
        self.keyspace.persist(PersistMode::SyncAll)?;
        Ok(())
    }

    fn list<T: DeserializeOwned>(
        partition: &PartitionHandle,
        limit: Option<usize>,
    ) -> Result<Vec<T>, PersistenceError> {
        partition
            .iter()
            .rev()
            .take(limit.unwrap_or(usize::MAX))
            .map(|item| {
                let (_, value) = item?;
                Ok(serde_json::from_slice(&value)?)
            })
            .collect()
    }
}

#[async_trait]
impl HistoryStore for FjallHistoryStore {
    async fn append_rate(
        &self,
        rate: Decimal,
        observed_at: DateTime<Utc>,
    ) -> Result<ExchangeRateObservation, PersistenceError> {
        let obs = ExchangeRateObservation {
            id: self.next_rate_id.fetch_add(1, Ordering::SeqCst),
            rate,
            observed_at,
        };
        self.rates
            .insert(record_key(observed_at, obs.id), serde_json::to_vec(&obs)?)?;
        self.sync()?;
        debug!(id = obs.id, "Stored exchange rate");
        Ok(obs)
    }

    async fn append_gold_price(
        &self,
        price_per_gram: Decimal,
        observed_at: DateTime<Utc>,
    ) -> Result<GoldPriceObservation, PersistenceError> {
        let obs = GoldPriceObservation {
            id: self.next_gold_id.fetch_add(1, Ordering::SeqCst),
            price_per_gram,
            observed_at,
        };
        self.gold
            .insert(record_key(observed_at, obs.id), serde_json::to_vec(&obs)?)?;
        self.sync()?;
        debug!(id = obs.id, "Stored gold price");
        Ok(obs)
    }

    async fn append_cycle(
        &self,
        rate: Decimal,
        price_per_gram: Decimal,
        observed_at: DateTime<Utc>,
    ) -> Result<(ExchangeRateObservation, GoldPriceObservation), PersistenceError> {
        let rate_obs = ExchangeRateObservation {
            id: self.next_rate_id.fetch_add(1, Ordering::SeqCst),
            rate,
            observed_at,
        };
        let gold_obs = GoldPriceObservation {
            id: self.next_gold_id.fetch_add(1, Ordering::SeqCst),
            price_per_gram,
            observed_at,
        };

        let mut batch = self.keyspace.batch();
        batch.insert(
            &self.rates,
            record_key(observed_at, rate_obs.id),
            serde_json::to_vec(&rate_obs)?,
        );
        batch.insert(
            &self.gold,
            record_key(observed_at, gold_obs.id),
            serde_json::to_vec(&gold_obs)?,
        );
        batch.commit()?;
        self.sync()?;
        debug!(
            rate_id = rate_obs.id,
            gold_id = gold_obs.id,
            "Stored refresh cycle"
        );
        Ok((rate_obs, gold_obs))
    }

    async fn latest_gold_price(&self) -> Result<Option<GoldPriceObservation>, PersistenceError> {
        match self.gold.last_key_value()? {
            Some((_, value)) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    async fn list_rates(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<ExchangeRateObservation>, PersistenceError> {
        Self::list(&self.rates, limit)
    }

    async fn list_gold_prices(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<GoldPriceObservation>, PersistenceError> {
        Self::list(&self.gold, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;
    use tempfile::tempdir;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, minute, 0).unwrap()
    }

    #[test]
    fn test_record_key_orders_by_time_then_id() {
        let before_epoch = Utc.with_ymd_and_hms(1965, 1, 1, 0, 0, 0).unwrap();
        assert!(record_key(before_epoch, 9) < record_key(at(0), 1));
        assert!(record_key(at(0), 1) < record_key(at(0), 2));
        assert!(record_key(at(0), 99) < record_key(at(1), 1));
        assert_eq!(id_from_key(&record_key(at(0), 42)), Some(42));
    }

    #[tokio::test]
    async fn test_fjall_store_append_and_list() {
        let dir = tempdir().unwrap();
        let store = FjallHistoryStore::open(dir.path()).unwrap();

        assert!(store.latest_gold_price().await.unwrap().is_none());

        let price = Decimal::from_str("4186.4021").unwrap();
        store.append_gold_price(price, at(0)).await.unwrap();
        store
            .append_gold_price(Decimal::from_str("4190.0000").unwrap(), at(10))
            .await
            .unwrap();

        let latest = store.latest_gold_price().await.unwrap().unwrap();
        assert_eq!(latest.observed_at, at(10));
        assert_eq!(latest.id, 2);

        let listed = store.list_gold_prices(None).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[1].price_per_gram.to_string(), "4186.4021");

        let limited = store.list_gold_prices(Some(1)).await.unwrap();
        assert_eq!(limited, vec![latest]);
    }

    #[tokio::test]
    async fn test_fjall_store_append_cycle() {
        let dir = tempdir().unwrap();
        let store = FjallHistoryStore::open(dir.path()).unwrap();

        let (rate, gold) = store
            .append_cycle(Decimal::from(49), Decimal::from(4000), at(3))
            .await
            .unwrap();

        assert_eq!(store.list_rates(None).await.unwrap(), vec![rate]);
        assert_eq!(store.list_gold_prices(None).await.unwrap(), vec![gold]);
    }

    #[tokio::test]
    async fn test_fjall_store_ids_continue_after_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = FjallHistoryStore::open(dir.path()).unwrap();
            store.append_rate(Decimal::from(48), at(0)).await.unwrap();
            store.append_rate(Decimal::from(49), at(5)).await.unwrap();
        }

        let store = FjallHistoryStore::open(dir.path()).unwrap();
        let obs = store.append_rate(Decimal::from(50), at(10)).await.unwrap();
        assert_eq!(obs.id, 3);

        let rates = store.list_rates(None).await.unwrap();
        let ids: Vec<_> = rates.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }
}
