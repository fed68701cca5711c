//! Persistence of vendor places
//!
//! Places resolved through a vendor are copied into the local search index
//! and a durable record store, so later searches can answer them locally.

mod cache;
mod store;

pub use cache::{PersistOutcome, PersistenceCache, WriteStatus};
pub use store::{PlaceStore, SqlitePlaceStore, StoreError, StoredPlace};
