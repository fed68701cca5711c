//! place-search: location search aggregation
//!
//! Answers free-text place queries from a local full-text index and from
//! place-search vendors, merging their answers into one bounded suggestion
//! list. Places resolved through a vendor are copied into local storage so
//! later queries can be answered locally.

pub mod config;
pub mod error;
pub mod metrics;
pub mod network;
pub mod persistence;
pub mod place;
pub mod providers;
pub mod search;
pub mod web;

pub use config::Settings;
pub use error::{Error, Result};
pub use place::{Place, PlaceSource};
pub use providers::SearchProvider;
pub use search::{PlaceService, SearchOrchestrator};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default timeout for provider calls in seconds
pub const DEFAULT_TIMEOUT: u64 = 5;

/// Hard cap on suggestions returned by any query
pub const MAX_SUGGESTIONS: usize = 5;
