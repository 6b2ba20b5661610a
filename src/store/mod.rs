pub mod disk;
pub mod memory;

use crate::core::HistoryStore;
use crate::core::config::{AppConfig, StorageKind};
use anyhow::{Context, Result};
use disk::FjallHistoryStore;
use memory::MemoryHistoryStore;
use std::sync::Arc;
use tracing::info;

/// Opens the history store selected by `config.storage`.
pub fn open_history_store(config: &AppConfig) -> Result<Arc<dyn HistoryStore>> {
    match config.storage {
        StorageKind::Memory => {
            info!("Using in-memory history store");
            Ok(Arc::new(MemoryHistoryStore::new()))
        }
        StorageKind::Disk => {
            let path = config.default_data_path()?.join("history");
            let store = FjallHistoryStore::open(&path)
                .with_context(|| format!("Failed to open history store at {}", path.display()))?;
            info!("Using history store at {}", path.display());
            Ok(Arc::new(store))
        }
    }
}
