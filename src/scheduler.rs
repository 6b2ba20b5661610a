//! Periodic refresh trigger, the out-of-band counterpart of on-demand reads

use crate::refresh::{RefreshCoordinator, RefreshOutcome};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Spawns a task that runs the staleness-checked refresh every `period`,
/// starting immediately. Abort the returned handle to stop it.
pub fn spawn(coordinator: Arc<RefreshCoordinator>, period: Duration) -> JoinHandle<()> {
    info!(?period, "Starting scheduled refresh");
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let outcome = coordinator.refresh_if_stale(Utc::now()).await;
            if outcome != RefreshOutcome::Fresh {
                debug!(?outcome, "Scheduled refresh ran");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::HistoryStore;
    use crate::refresh::tests::MockSource;
    use crate::store::memory::MemoryHistoryStore;

    #[tokio::test]
    async fn test_scheduler_refreshes_then_respects_window() {
        let rate = MockSource::ok("49.5");
        let metal = MockSource::ok("0.00038015");
        let store = Arc::new(MemoryHistoryStore::new());
        let coordinator = Arc::new(RefreshCoordinator::new(
            rate.clone(),
            metal.clone(),
            store.clone(),
        ));

        let handle = spawn(coordinator, Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(150)).await;
        handle.abort();

        // first tick fills the empty history, later ticks find it fresh
        assert_eq!(rate.count(), 1);
        assert_eq!(metal.count(), 1);
        assert_eq!(store.list_gold_prices(None).await.unwrap().len(), 1);
    }
}
