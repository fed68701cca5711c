//! Search orchestration module
//!
//! Validates suggestion and details requests, fans suggestion queries out
//! to every configured provider and merges their answers.

mod models;
mod orchestrator;
mod service;

pub use models::*;
pub use orchestrator::SearchOrchestrator;
pub use service::PlaceService;
