//! Place data model
//!
//! The normalized record every provider produces, plus the container used
//! to merge provider output into one bounded sequence.

mod container;
mod types;

pub use container::{PlaceContainer, UnresponsiveProvider};
pub use types::*;
