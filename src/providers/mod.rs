//! Search provider module
//!
//! Defines the SearchProvider trait, the three provider implementations and
//! the presence-checked set the rest of the crate dispatches through.

mod loader;
mod registry;
mod traits;

// Provider implementations
pub mod google;
pub mod local;
pub mod mapbox;

#[cfg(test)]
pub(crate) mod mock;

pub use loader::ProviderLoader;
pub use registry::ProviderSet;
pub use traits::*;
