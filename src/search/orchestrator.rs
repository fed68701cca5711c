//! Fan-out search across every configured provider

use crate::metrics::{CallOutcome, Metrics};
use crate::place::{Place, PlaceContainer};
use crate::providers::{ProviderError, ProviderSet, RequestParams, SearchProvider};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Queries providers concurrently and merges their answers in priority order
pub struct SearchOrchestrator {
    /// Providers in priority order
    providers: Vec<Arc<dyn SearchProvider>>,
    metrics: Option<Arc<Metrics>>,
    max_results: usize,
}

impl SearchOrchestrator {
    /// Create an orchestrator over providers already in priority order
    pub fn new(providers: Vec<Arc<dyn SearchProvider>>) -> Self {
        Self {
            providers,
            metrics: None,
            max_results: crate::MAX_SUGGESTIONS,
        }
    }

    pub fn from_set(set: &ProviderSet) -> Self {
        Self::new(set.ordered())
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Merged, deduplicated places; failing providers contribute nothing
    pub async fn search(&self, params: &RequestParams) -> Vec<Place> {
        self.execute(params).await.into_places()
    }

    /// Run the search and keep the per-provider failures alongside the places
    pub async fn execute(&self, params: &RequestParams) -> PlaceContainer {
        let limit = params.limit.clamp(1, self.max_results);
        let mut container = PlaceContainer::new(limit);

        if params.query.trim().is_empty() || self.providers.is_empty() {
            return container;
        }

        let params = RequestParams {
            limit,
            ..params.clone()
        };

        info!(
            "Executing search '{}' on {} providers",
            params.query,
            self.providers.len()
        );

        // join_all yields in input order, so the merge below is priority order
        // whatever order the calls complete in
        let outcomes = join_all(
            self.providers
                .iter()
                .map(|provider| timed_search(provider.as_ref(), &params, self.metrics.as_deref())),
        )
        .await;

        for (provider, outcome) in self.providers.iter().zip(outcomes) {
            match outcome {
                Ok(places) => container.extend(places),
                Err(e) => {
                    warn!("Error from {} search provider: {}", provider.name(), e);
                    container.add_unresponsive(provider.source(), e);
                }
            }
        }

        debug!(
            "Merged {} places ({} duplicates, {} unresponsive)",
            container.len(),
            container.duplicates(),
            container.unresponsive().len()
        );

        container
    }
}

/// Search one provider, bounded by its timeout and truncated to the limit
pub(crate) async fn timed_search(
    provider: &dyn SearchProvider,
    params: &RequestParams,
    metrics: Option<&Metrics>,
) -> Result<Vec<Place>, ProviderError> {
    let start = Instant::now();
    let provider_timeout = provider.timeout();

    let (result, outcome) = match timeout(provider_timeout, provider.search(params)).await {
        Ok(Ok(mut places)) => {
            places.truncate(params.limit);
            (Ok(places), CallOutcome::Success)
        }
        Ok(Err(e)) => (Err(e), CallOutcome::Error),
        Err(_) => (
            Err(ProviderError::timed_out(provider_timeout)),
            CallOutcome::Timeout,
        ),
    };

    if let Some(metrics) = metrics {
        metrics.record_call(provider.source(), start.elapsed(), outcome);
    }
    result
}

/// Resolve one place, bounded by the provider's timeout
pub(crate) async fn timed_details(
    provider: &dyn SearchProvider,
    place_id: &str,
    metrics: Option<&Metrics>,
) -> Result<Place, ProviderError> {
    let start = Instant::now();
    let provider_timeout = provider.timeout();

    let (result, outcome) =
        match timeout(provider_timeout, provider.get_place_details(place_id)).await {
            Ok(Ok(place)) => (Ok(place), CallOutcome::Success),
            // a miss is an answer, not a provider failure
            Ok(Err(e @ ProviderError::NotFound(_))) => (Err(e), CallOutcome::Success),
            Ok(Err(e)) => (Err(e), CallOutcome::Error),
            Err(_) => (
                Err(ProviderError::timed_out(provider_timeout)),
                CallOutcome::Timeout,
            ),
        };

    if let Some(metrics) = metrics {
        metrics.record_call(provider.source(), start.elapsed(), outcome);
    }
    result
}
