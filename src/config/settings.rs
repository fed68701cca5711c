//! Settings structures for place-search configuration

use crate::place::PlaceSource;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main settings structure matching settings.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub search: SearchSettings,
    pub outgoing: OutgoingSettings,
    pub providers: ProvidersSettings,
    pub index: IndexSettings,
    pub store: StoreSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(content)?;
        Ok(settings)
    }

    /// Merge with environment variables
    pub fn merge_env(&mut self) {
        self.merge_vars(|key| std::env::var(key).ok());
    }

    /// Merge overrides from an arbitrary variable lookup
    pub fn merge_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("MAPBOX_ACCESS_TOKEN") {
            self.providers.mapbox.api_key = non_empty(val);
        }
        if let Some(val) = lookup("GOOGLE_PLACES_API_KEY") {
            self.providers.google.api_key = non_empty(val);
        }
        if let Some(val) = lookup("PLACES_INDEX_DIR") {
            self.index.dir = PathBuf::from(val);
        }
        if let Some(val) = lookup("PLACES_DATABASE_URL") {
            self.store.database_url = non_empty(val);
        }
        if let Some(port) = lookup("PORT").and_then(|v| v.parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = lookup("BIND_ADDRESS") {
            self.server.bind_address = val;
        }
    }
}

fn non_empty(val: String) -> Option<String> {
    let trimmed = val.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 5002,
            bind_address: "0.0.0.0".to_string(),
        }
    }
}

/// Search behavior settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Limit used when the caller does not send one
    pub default_limit: usize,
    /// System-wide cap on returned suggestions
    pub max_limit: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_limit: crate::MAX_SUGGESTIONS,
            max_limit: crate::MAX_SUGGESTIONS,
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Default request timeout in seconds
    pub request_timeout: f64,
    /// Pool max size
    pub pool_maxsize: usize,
    /// User agent sent to vendors
    pub user_agent: String,
    /// Proxy for all outgoing requests
    pub proxy: Option<String>,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: crate::DEFAULT_TIMEOUT as f64,
            pool_maxsize: 20,
            user_agent: format!("place-search/{}", crate::VERSION),
            proxy: None,
        }
    }
}

/// Per-provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersSettings {
    pub local: LocalProviderSettings,
    pub mapbox: VendorSettings,
    pub google: VendorSettings,
    /// Priority of the vendor providers after the local index
    pub vendor_order: Vec<PlaceSource>,
}

impl Default for ProvidersSettings {
    fn default() -> Self {
        Self {
            local: LocalProviderSettings::default(),
            mapbox: VendorSettings::new("https://api.mapbox.com"),
            google: VendorSettings::new("https://maps.googleapis.com"),
            vendor_order: vec![PlaceSource::Mapbox, PlaceSource::Google],
        }
    }
}

/// Local index provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalProviderSettings {
    pub disabled: bool,
    /// Per-call timeout in seconds
    pub timeout: f64,
}

impl Default for LocalProviderSettings {
    fn default() -> Self {
        Self {
            disabled: false,
            timeout: 2.0,
        }
    }
}

/// Vendor provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VendorSettings {
    pub disabled: bool,
    /// Access token or API key; absence disables the provider
    pub api_key: Option<String>,
    /// API root, overridable for testing and proxies
    pub base_url: String,
    /// Per-call timeout in seconds
    pub timeout: f64,
    /// Radius in meters used with a location bias (Google only)
    pub bias_radius_m: u32,
}

impl VendorSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

impl Default for VendorSettings {
    fn default() -> Self {
        Self {
            disabled: false,
            api_key: None,
            base_url: String::new(),
            timeout: crate::DEFAULT_TIMEOUT as f64,
            bias_radius_m: 50_000,
        }
    }
}

/// Local full-text index settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Directory holding the index files
    pub dir: PathBuf,
    /// Memory budget for the index writer in bytes
    pub writer_memory: usize,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            dir: std::env::temp_dir().join("places_index"),
            writer_memory: 50_000_000,
        }
    }
}

/// Durable record store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Database URL; absence disables the store
    pub database_url: Option<String>,
    pub max_connections: u32,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            database_url: Some("sqlite://places.db?mode=rwc".to_string()),
            max_connections: 5,
        }
    }
}
