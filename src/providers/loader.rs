//! Provider loader for initializing providers from configuration

use super::google::GooglePlaces;
use super::local::LocalIndexProvider;
use super::mapbox::Mapbox;
use super::registry::ProviderSet;
use crate::config::Settings;
use crate::network::HttpClient;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Builds every provider slot independently from settings
pub struct ProviderLoader;

impl ProviderLoader {
    /// Load all providers; a provider that fails to construct is left absent
    pub fn load(settings: &Settings, client: &HttpClient) -> ProviderSet {
        let providers = &settings.providers;
        let mut set = ProviderSet::new().with_vendor_order(providers.vendor_order.clone());

        if providers.local.disabled {
            info!("Skipping disabled provider: local");
        } else {
            match LocalIndexProvider::open(&settings.index.dir, settings.index.writer_memory) {
                Ok(local) => {
                    info!("Local search provider initialized successfully");
                    let local = local.with_timeout(Duration::from_secs_f64(providers.local.timeout));
                    set = set.with_local(Arc::new(local));
                }
                Err(e) => error!("Error initializing local search provider: {:#}", e),
            }
        }

        if providers.mapbox.disabled {
            info!("Skipping disabled provider: mapbox");
        } else {
            match Mapbox::new(client.clone(), &providers.mapbox) {
                Ok(mapbox) => {
                    info!("Mapbox search provider initialized successfully");
                    set = set.with_mapbox(Arc::new(mapbox));
                }
                Err(e) => error!("Error initializing Mapbox search provider: {:#}", e),
            }
        }

        if providers.google.disabled {
            info!("Skipping disabled provider: google");
        } else {
            match GooglePlaces::new(client.clone(), &providers.google) {
                Ok(google) => {
                    info!("Google Places search provider initialized successfully");
                    set = set.with_google(Arc::new(google));
                }
                Err(e) => error!("Error initializing Google Places search provider: {:#}", e),
            }
        }

        info!("Loaded {} search providers: {:?}", set.len(), set.configured());
        set
    }
}
