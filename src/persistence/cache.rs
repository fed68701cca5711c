//! Write-through of vendor places into the local index and the record store

use super::store::PlaceStore;
use crate::metrics::Metrics;
use crate::place::Place;
use crate::providers::PersistentProvider;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Result of one persistence target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteStatus {
    /// Written; carries the record id when the target assigns one
    Written(Option<String>),
    /// Target not configured, or nothing to do
    Skipped,
    Failed(String),
}

impl WriteStatus {
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistOutcome {
    pub index: WriteStatus,
    pub store: WriteStatus,
}

/// Copies places resolved by a vendor into local storage.
///
/// Both targets are optional and written independently: a failure of one
/// never prevents or rolls back the other.
#[derive(Clone, Default)]
pub struct PersistenceCache {
    index: Option<Arc<dyn PersistentProvider>>,
    store: Option<Arc<dyn PlaceStore>>,
    metrics: Option<Arc<Metrics>>,
}

impl PersistenceCache {
    pub fn new(
        index: Option<Arc<dyn PersistentProvider>>,
        store: Option<Arc<dyn PlaceStore>>,
    ) -> Self {
        Self {
            index,
            store,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }

    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    /// Write `place` to every configured target
    pub async fn persist(&self, place: &Place) -> PersistOutcome {
        if place.source.is_local() {
            debug!("Place {} already comes from the local index", place.place_id);
            return PersistOutcome {
                index: WriteStatus::Skipped,
                store: WriteStatus::Skipped,
            };
        }

        let (index, store) = tokio::join!(self.write_index(place), self.write_store(place));

        if let Some(ref metrics) = self.metrics {
            for status in [&index, &store] {
                match status {
                    WriteStatus::Written(_) => metrics.record_persisted(true),
                    WriteStatus::Failed(_) => metrics.record_persisted(false),
                    WriteStatus::Skipped => {}
                }
            }
        }

        PersistOutcome { index, store }
    }

    /// Persist on a background task; the caller does not wait for it
    pub fn spawn(&self, place: Place) -> JoinHandle<PersistOutcome> {
        let cache = self.clone();
        tokio::spawn(async move { cache.persist(&place).await })
    }

    async fn write_index(&self, place: &Place) -> WriteStatus {
        let Some(ref index) = self.index else {
            return WriteStatus::Skipped;
        };

        match index.save_place(place).await {
            Ok(()) => {
                info!("Saved place to local search index: {}", place.name);
                WriteStatus::Written(None)
            }
            Err(e) => {
                error!("Error saving place to local search index: {}", e);
                WriteStatus::Failed(e.to_string())
            }
        }
    }

    async fn write_store(&self, place: &Place) -> WriteStatus {
        let Some(ref store) = self.store else {
            return WriteStatus::Skipped;
        };

        match store.save_place(place).await {
            Ok(id) => {
                info!("Saved place to database: {} ({})", place.name, id);
                WriteStatus::Written(Some(id))
            }
            Err(e) => {
                error!("Error saving place to database: {}", e);
                WriteStatus::Failed(e.to_string())
            }
        }
    }
}
