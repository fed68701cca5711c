//! place-search server entry point

use anyhow::Result;
use place_search::{
    config,
    network::HttpClient,
    persistence::{PersistenceCache, PlaceStore, SqlitePlaceStore},
    providers::ProviderLoader,
    search::PlaceService,
    web::{create_router, AppState},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("Starting place-search v{}", place_search::VERSION);

    let settings = config::load()?;

    // Initialize HTTP client
    let client = HttpClient::with_settings(&settings.outgoing)?;
    info!("HTTP client initialized");

    let providers = ProviderLoader::load(&settings, &client);

    // A missing store only disables the durable copy
    let store: Option<Arc<dyn PlaceStore>> = match settings.store.database_url {
        Some(ref url) => match SqlitePlaceStore::connect(url, settings.store.max_connections).await {
            Ok(store) => {
                info!("Connected to place store at {}", url);
                Some(Arc::new(store))
            }
            Err(e) => {
                error!("Error connecting to place store: {}", e);
                None
            }
        },
        None => {
            info!("No database configured, places will not be stored");
            None
        }
    };

    let persistence = PersistenceCache::new(providers.local_writer(), store);
    let service = PlaceService::new(providers, persistence);
    let state = AppState::new(&settings, service);

    let app = create_router(state);

    let addr = SocketAddr::new(settings.server.bind_address.parse()?, settings.server.port);
    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
