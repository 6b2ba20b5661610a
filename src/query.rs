//! Read side: history queries that refresh stale data first

use crate::core::{ExchangeRateObservation, GoldPriceObservation, PersistenceError};
use crate::refresh::RefreshCoordinator;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Source of the current time for staleness checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub struct QueryService {
    coordinator: Arc<RefreshCoordinator>,
    clock: Arc<dyn Clock>,
}

impl QueryService {
    pub fn new(coordinator: Arc<RefreshCoordinator>) -> Self {
        Self::with_clock(coordinator, Arc::new(SystemClock))
    }

    pub fn with_clock(coordinator: Arc<RefreshCoordinator>, clock: Arc<dyn Clock>) -> Self {
        Self { coordinator, clock }
    }

    /// Gold prices newest first, after refreshing if stale. A failed refresh
    /// is not an error here; whatever history exists is returned.
    pub async fn gold_history(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<GoldPriceObservation>, PersistenceError> {
        self.coordinator.refresh_if_stale(self.clock.now()).await;
        self.coordinator.store().list_gold_prices(limit).await
    }

    /// Exchange rates newest first, after refreshing if stale.
    pub async fn rate_history(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<ExchangeRateObservation>, PersistenceError> {
        self.coordinator.refresh_if_stale(self.clock.now()).await;
        self.coordinator.store().list_rates(limit).await
    }
}
