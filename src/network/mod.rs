//! HTTP networking module
//!
//! Provides the HTTP client used by the vendor providers.

mod client;

pub use client::HttpClient;
