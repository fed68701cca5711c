//! Web server module
//!
//! Provides the HTTP API over the suggestion and place-details operations.

mod error;
mod handlers;
mod routes;
mod state;

pub use error::{ApiError, ErrorCode};
pub use routes::create_router;
pub use state::AppState;
