//! Suggestion and place-details operations

use super::models::{
    DetailsRequest, PlaceDetails, PlaceLookup, PlaceQuery, SearchTarget, Suggestion,
    SuggestionRequest,
};
use super::orchestrator::{timed_details, timed_search, SearchOrchestrator};
use crate::config::SearchSettings;
use crate::error::{Error, Result};
use crate::metrics::Metrics;
use crate::persistence::{PersistOutcome, PersistenceCache};
use crate::place::Place;
use crate::providers::ProviderSet;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Entry point for the two caller-facing operations
pub struct PlaceService {
    providers: ProviderSet,
    orchestrator: SearchOrchestrator,
    persistence: PersistenceCache,
    metrics: Arc<Metrics>,
    default_limit: usize,
    max_limit: usize,
}

impl PlaceService {
    pub fn new(providers: ProviderSet, persistence: PersistenceCache) -> Self {
        Self::with_metrics(providers, persistence, Arc::new(Metrics::new()))
    }

    pub fn with_metrics(
        providers: ProviderSet,
        persistence: PersistenceCache,
        metrics: Arc<Metrics>,
    ) -> Self {
        let orchestrator = SearchOrchestrator::from_set(&providers).with_metrics(metrics.clone());
        let defaults = SearchSettings::default();

        Self {
            providers,
            orchestrator,
            persistence: persistence.with_metrics(metrics.clone()),
            metrics,
            default_limit: defaults.default_limit,
            max_limit: defaults.max_limit,
        }
    }

    /// Apply configured limits; the cap never exceeds the suggestion maximum
    pub fn with_limits(mut self, search: &SearchSettings) -> Self {
        self.max_limit = search.max_limit.clamp(1, crate::MAX_SUGGESTIONS);
        self.default_limit = search.default_limit.clamp(1, self.max_limit);
        self
    }

    pub fn providers(&self) -> &ProviderSet {
        &self.providers
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Validate a raw suggestion request and run it
    pub async fn suggest(&self, request: &SuggestionRequest) -> Result<Vec<Suggestion>> {
        let query = request.validate(self.default_limit, self.max_limit)?;
        let places = self.search(&query).await?;
        Ok(places.into_iter().map(Suggestion::from).collect())
    }

    /// Search one named provider directly, or all of them through the orchestrator
    pub async fn search(&self, query: &PlaceQuery) -> Result<Vec<Place>> {
        self.metrics.inc_suggestions();
        let params = query.params();

        match query.target {
            SearchTarget::All => Ok(self.orchestrator.search(&params).await),
            SearchTarget::Provider(source) => {
                let provider = self.providers.get(source)?;
                debug!("Searching {} directly for '{}'", provider.name(), params.query);
                timed_search(provider.as_ref(), &params, Some(&self.metrics))
                    .await
                    .map_err(|e| Error::from_provider(source, e))
            }
        }
    }

    /// Validate a raw details request and resolve it
    pub async fn place_details(&self, request: &DetailsRequest) -> Result<PlaceDetails> {
        let lookup = request.validate()?;
        let (place, _) = self.resolve(&lookup).await?;
        Ok(PlaceDetails::from(place))
    }

    /// Resolve one place through the provider matching its source.
    ///
    /// A place resolved by a vendor is handed to the persistence cache on a
    /// detached task; the handle is returned for callers that want to wait.
    pub async fn resolve(
        &self,
        lookup: &PlaceLookup,
    ) -> Result<(Place, Option<JoinHandle<PersistOutcome>>)> {
        self.metrics.inc_details();
        let provider = self.providers.get(lookup.source)?;

        let place = timed_details(provider.as_ref(), &lookup.place_id, Some(&self.metrics))
            .await
            .map_err(|e| Error::from_provider(lookup.source, e))?;

        let persisting = if lookup.source.is_local() {
            None
        } else if self.persistence.has_index() || self.persistence.has_store() {
            info!("Persisting {} place {}", lookup.source, place.place_id);
            Some(self.persistence.spawn(place.clone()))
        } else {
            None
        };

        Ok((place, persisting))
    }
}
