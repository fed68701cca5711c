//! In-memory provider for tests

use super::traits::*;
use crate::place::{Place, PlaceSource};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;

/// Provider returning canned places, optionally slow or failing
pub struct MockProvider {
    source: PlaceSource,
    results: Vec<Place>,
    error: Option<ProviderError>,
    delay: Duration,
    timeout: Duration,
    fail_writes: bool,
    saved: RwLock<Vec<Place>>,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(source: PlaceSource) -> Self {
        Self {
            source,
            results: Vec::new(),
            error: None,
            delay: Duration::ZERO,
            timeout: Duration::from_secs(5),
            fail_writes: false,
            saved: RwLock::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Places named after `ids`, tagged with this provider's source
    pub fn with_ids(mut self, ids: &[&str]) -> Self {
        self.results = ids
            .iter()
            .map(|id| {
                Place::new(*id, format!("Place {}", id), self.source)
                    .unwrap()
                    .with_address(format!("{} Test Street", id))
            })
            .collect();
        self
    }

    pub fn with_places(mut self, places: Vec<Place>) -> Self {
        self.results = places;
        self
    }

    pub fn failing(mut self, error: ProviderError) -> Self {
        self.error = Some(error);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn saved(&self) -> Vec<Place> {
        self.saved.read().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for MockProvider {
    fn source(&self) -> PlaceSource {
        self.source
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn search(&self, params: &RequestParams) -> Result<Vec<Place>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(ref e) = self.error {
            return Err(e.clone());
        }

        let saved = self.saved.read().unwrap().clone();
        Ok(self
            .results
            .iter()
            .cloned()
            .chain(saved)
            .take(params.limit)
            .collect())
    }

    async fn get_place_details(&self, place_id: &str) -> Result<Place, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(ref e) = self.error {
            return Err(e.clone());
        }

        let saved = self.saved.read().unwrap().clone();
        self.results
            .iter()
            .cloned()
            .chain(saved)
            .find(|p| p.place_id == place_id)
            .ok_or_else(|| ProviderError::NotFound(place_id.to_string()))
    }
}

#[async_trait]
impl PersistentProvider for MockProvider {
    async fn save_place(&self, place: &Place) -> Result<(), ProviderError> {
        if self.fail_writes {
            return Err(ProviderError::Unavailable("index is read-only".to_string()));
        }
        self.saved.write().unwrap().push(place.clone());
        Ok(())
    }
}
