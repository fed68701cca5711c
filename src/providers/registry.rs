//! Presence-checked set of configured providers

use super::traits::{PersistentProvider, SearchProvider};
use crate::error::Error;
use crate::place::PlaceSource;
use std::sync::Arc;

/// The local index seen through both of its capabilities
#[derive(Clone)]
struct LocalSlot {
    search: Arc<dyn SearchProvider>,
    writer: Arc<dyn PersistentProvider>,
}

/// Providers that were successfully constructed at startup.
///
/// A slot left `None` means the provider is absent for the lifetime of the
/// process. Lookups go through [`ProviderSet::get`], the single place where
/// absence turns into [`Error::ProviderUnavailable`].
#[derive(Clone)]
pub struct ProviderSet {
    local: Option<LocalSlot>,
    mapbox: Option<Arc<dyn SearchProvider>>,
    google: Option<Arc<dyn SearchProvider>>,
    vendor_order: Vec<PlaceSource>,
}

impl ProviderSet {
    /// Create an empty set with the default vendor order
    pub fn new() -> Self {
        Self {
            local: None,
            mapbox: None,
            google: None,
            vendor_order: vec![PlaceSource::Mapbox, PlaceSource::Google],
        }
    }

    pub fn with_local<P>(mut self, provider: Arc<P>) -> Self
    where
        P: SearchProvider + PersistentProvider + 'static,
    {
        self.local = Some(LocalSlot {
            search: provider.clone(),
            writer: provider,
        });
        self
    }

    pub fn with_mapbox(mut self, provider: Arc<dyn SearchProvider>) -> Self {
        self.mapbox = Some(provider);
        self
    }

    pub fn with_google(mut self, provider: Arc<dyn SearchProvider>) -> Self {
        self.google = Some(provider);
        self
    }

    /// Set the vendor priority; unknown or repeated entries are dropped and
    /// vendors left out are appended in default order
    pub fn with_vendor_order(mut self, order: Vec<PlaceSource>) -> Self {
        let mut vendor_order = Vec::with_capacity(2);
        for source in order
            .into_iter()
            .chain([PlaceSource::Mapbox, PlaceSource::Google])
        {
            if !source.is_local() && !vendor_order.contains(&source) {
                vendor_order.push(source);
            }
        }
        self.vendor_order = vendor_order;
        self
    }

    fn slot(&self, source: PlaceSource) -> Option<&Arc<dyn SearchProvider>> {
        match source {
            PlaceSource::Local => self.local.as_ref().map(|slot| &slot.search),
            PlaceSource::Mapbox => self.mapbox.as_ref(),
            PlaceSource::Google => self.google.as_ref(),
        }
    }

    /// Get a configured provider by source
    pub fn get(&self, source: PlaceSource) -> Result<Arc<dyn SearchProvider>, Error> {
        self.slot(source)
            .cloned()
            .ok_or(Error::ProviderUnavailable(source))
    }

    /// Write handle into the local index, if it is configured
    pub fn local_writer(&self) -> Option<Arc<dyn PersistentProvider>> {
        self.local.as_ref().map(|slot| slot.writer.clone())
    }

    /// Present providers in priority order: local first, then vendors
    pub fn ordered(&self) -> Vec<Arc<dyn SearchProvider>> {
        std::iter::once(PlaceSource::Local)
            .chain(self.vendor_order.iter().copied())
            .filter_map(|source| self.slot(source).cloned())
            .collect()
    }

    /// Sources of every present provider, in priority order
    pub fn configured(&self) -> Vec<PlaceSource> {
        self.ordered().iter().map(|p| p.source()).collect()
    }

    pub fn vendor_order(&self) -> &[PlaceSource] {
        &self.vendor_order
    }

    pub fn len(&self) -> usize {
        self.ordered().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ProviderSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock::MockProvider;

    #[test]
    fn test_absent_slot_is_unavailable() {
        let set = ProviderSet::new().with_google(Arc::new(MockProvider::new(PlaceSource::Google)));

        assert!(set.get(PlaceSource::Google).is_ok());
        assert!(matches!(
            set.get(PlaceSource::Mapbox),
            Err(Error::ProviderUnavailable(PlaceSource::Mapbox))
        ));
        assert!(set.local_writer().is_none());
    }

    #[test]
    fn test_priority_order() {
        let set = ProviderSet::new()
            .with_google(Arc::new(MockProvider::new(PlaceSource::Google)))
            .with_mapbox(Arc::new(MockProvider::new(PlaceSource::Mapbox)))
            .with_local(Arc::new(MockProvider::new(PlaceSource::Local)));
        assert_eq!(
            set.configured(),
            vec![PlaceSource::Local, PlaceSource::Mapbox, PlaceSource::Google]
        );

        let set = set.with_vendor_order(vec![PlaceSource::Google]);
        assert_eq!(
            set.configured(),
            vec![PlaceSource::Local, PlaceSource::Google, PlaceSource::Mapbox]
        );
    }

    #[test]
    fn test_vendor_order_sanitized() {
        let set = ProviderSet::new().with_vendor_order(vec![
            PlaceSource::Local,
            PlaceSource::Google,
            PlaceSource::Google,
        ]);
        assert_eq!(set.vendor_order(), &[PlaceSource::Google, PlaceSource::Mapbox]);
        assert!(set.is_empty());
    }
}
