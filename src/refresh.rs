//! Staleness-triggered refresh of both observation series
//!
//! A refresh cycle fetches the exchange rate, fetches the metal rate, derives
//! the gram price and records both observations with the same timestamp.
//! Cycles are serialized: a caller that finds the data stale while another
//! cycle is in flight waits for it and shares its outcome, success or failure,
//! instead of fetching again.

use crate::core::{
    ExchangeRateSource, GoldPriceObservation, HistoryStore, MetalRateSource, PersistenceError,
    RefreshError, compute_price_per_gram,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Age after which the latest gold price is considered stale.
pub const STALENESS_WINDOW_SECS: i64 = 300;

/// How the two observations of a cycle are written.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceMode {
    /// Fetch and compute first, then write both observations in one batch.
    #[default]
    Atomic,
    /// Write the rate right after it is fetched; a later failure leaves it
    /// without a matching gold price.
    Sequential,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Latest gold price is within the staleness window; nothing fetched.
    Fresh,
    /// A cycle ran and stored this gold price.
    Refreshed(GoldPriceObservation),
    /// The cycle failed and was logged; existing history is untouched
    /// except for a rate written in [`PersistenceMode::Sequential`].
    Failed,
}

pub struct RefreshCoordinator {
    rate_source: Arc<dyn ExchangeRateSource>,
    metal_source: Arc<dyn MetalRateSource>,
    store: Arc<dyn HistoryStore>,
    mode: PersistenceMode,
    /// Outcome of the last completed cycle, held for the length of a cycle.
    in_flight: Mutex<Option<RefreshOutcome>>,
    /// Completed cycles. Bumped while `in_flight` is held.
    cycles: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new(
        rate_source: Arc<dyn ExchangeRateSource>,
        metal_source: Arc<dyn MetalRateSource>,
        store: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            rate_source,
            metal_source,
            store,
            mode: PersistenceMode::default(),
            in_flight: Mutex::new(None),
            cycles: AtomicU64::new(0),
        }
    }

    pub fn with_persistence_mode(mut self, mode: PersistenceMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn store(&self) -> &Arc<dyn HistoryStore> {
        &self.store
    }

    /// Runs a refresh cycle when the latest gold price is older than
    /// [`STALENESS_WINDOW_SECS`] relative to `now`, or when none exists.
    ///
    /// Never fails: errors are logged and reported as [`RefreshOutcome::Failed`].
    pub async fn refresh_if_stale(&self, now: DateTime<Utc>) -> RefreshOutcome {
        match self.is_stale(now).await {
            Ok(false) => return RefreshOutcome::Fresh,
            Ok(true) => {}
            Err(e) => {
                warn!(error = %e, "Could not read latest gold price, skipping refresh");
                return RefreshOutcome::Failed;
            }
        }

        let seen = self.cycles.load(Ordering::SeqCst);
        let mut last = self.in_flight.lock().await;

        // a cycle completed while we waited, share its outcome
        if self.cycles.load(Ordering::SeqCst) != seen {
            debug!("Joined a concurrent refresh");
            return last.clone().unwrap_or(RefreshOutcome::Failed);
        }

        match self.is_stale(now).await {
            Ok(false) => RefreshOutcome::Fresh,
            Ok(true) => {
                let outcome = self.run_cycle(now).await;
                self.record(&mut last, &outcome);
                outcome
            }
            Err(e) => {
                warn!(error = %e, "Could not read latest gold price, skipping refresh");
                RefreshOutcome::Failed
            }
        }
    }

    /// Runs a refresh cycle regardless of staleness.
    pub async fn refresh(&self, now: DateTime<Utc>) -> RefreshOutcome {
        let mut last = self.in_flight.lock().await;
        let outcome = self.run_cycle(now).await;
        self.record(&mut last, &outcome);
        outcome
    }

    fn record(&self, last: &mut Option<RefreshOutcome>, outcome: &RefreshOutcome) {
        *last = Some(outcome.clone());
        self.cycles.fetch_add(1, Ordering::SeqCst);
    }

    async fn is_stale(&self, now: DateTime<Utc>) -> Result<bool, PersistenceError> {
        let stale = match self.store.latest_gold_price().await? {
            None => true,
            Some(latest) => {
                now.signed_duration_since(latest.observed_at)
                    > Duration::seconds(STALENESS_WINDOW_SECS)
            }
        };
        debug!(stale, "Checked gold price staleness");
        Ok(stale)
    }

    async fn run_cycle(&self, now: DateTime<Utc>) -> RefreshOutcome {
        info!(mode = ?self.mode, "Market data is stale, refreshing");
        match self.fetch_and_persist(now).await {
            Ok(gold) => {
                info!(
                    id = gold.id,
                    price_per_gram = %gold.price_per_gram,
                    "Saved gold price"
                );
                RefreshOutcome::Refreshed(gold)
            }
            Err(e) => {
                warn!(error = %e, "Refresh failed, serving existing history");
                RefreshOutcome::Failed
            }
        }
    }

    async fn fetch_and_persist(
        &self,
        now: DateTime<Utc>,
    ) -> Result<GoldPriceObservation, RefreshError> {
        let rate = self.rate_source.fetch_rate().await?;

        match self.mode {
            PersistenceMode::Sequential => {
                let rate_obs = self.store.append_rate(rate, now).await?;
                info!(id = rate_obs.id, rate = %rate_obs.rate, "Saved exchange rate");

                let units = self.metal_source.fetch_units_per_base().await?;
                let price = compute_price_per_gram(rate, units)?;
                Ok(self.store.append_gold_price(price, now).await?)
            }
            PersistenceMode::Atomic => {
                let units = self.metal_source.fetch_units_per_base().await?;
                let price = compute_price_per_gram(rate, units)?;
                let (rate_obs, gold_obs) = self.store.append_cycle(rate, price, now).await?;
                info!(id = rate_obs.id, rate = %rate_obs.rate, "Saved exchange rate");
                Ok(gold_obs)
            }
        }
    }
}
