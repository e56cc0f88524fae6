//! Application configuration: a TOML file plus environment overrides.
//!
//! ```toml
//! log_level = "info"
//! log_file = "rent-calculator.log"
//! client_info = "rent-calculator-cli"
//!
//! [store]
//! backend = "sqlite"
//! connection_string = "rent-calculator.db"
//!
//! [backend]
//! source = "hosted"        # or "store" to keep leads in the local store
//! url = "https://leads.example.com"
//! key = "..."
//! ```
//!
//! Every key is optional. Environment variables win over the file.

use std::path::{Path, PathBuf};

use rent_core::store::StoreConfig;
use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_PATH_VAR: &str = "RENT_CALC_CONFIG";
pub const STORE_BACKEND_VAR: &str = "RENT_CALC_STORE_BACKEND";
pub const STORE_CONNECTION_VAR: &str = "RENT_CALC_STORE";
pub const BACKEND_URL_VAR: &str = "RENT_CALC_BACKEND_URL";
pub const BACKEND_KEY_VAR: &str = "RENT_CALC_BACKEND_KEY";
pub const LEAD_SOURCE_VAR: &str = "RENT_CALC_LEAD_SOURCE";
pub const LOG_LEVEL_VAR: &str = "RENT_CALC_LOG_LEVEL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub backend: String,
    pub connection_string: String,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: "rent-calculator.db".to_string(),
        }
    }
}

impl From<&StoreSection> for StoreConfig {
    fn from(section: &StoreSection) -> Self {
        StoreConfig {
            backend: section.backend.clone(),
            connection_string: section.connection_string.clone(),
        }
    }
}

/// Where email registrations and saved sessions go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadSource {
    /// The hosted database at `backend.url`. Offline when credentials are
    /// missing.
    #[default]
    Hosted,
    /// The lead tables of the configured store backend.
    Store,
}

impl LeadSource {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hosted" => Some(Self::Hosted),
            "store" => Some(Self::Store),
            _ => None,
        }
    }
}

/// Credentials for the hosted lead database. Opaque to this crate.
#[derive(Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct BackendSection {
    pub source: LeadSource,
    pub url: Option<String>,
    pub key: Option<String>,
}

impl BackendSection {
    /// Both URL and key are present and non-blank.
    pub fn is_configured(&self) -> bool {
        self.credentials().is_some()
    }

    /// `(url, key)` when both are present and non-blank.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        fn filled(v: &Option<String>) -> Option<&str> {
            v.as_deref().filter(|s| !s.trim().is_empty())
        }
        Some((filled(&self.url)?, filled(&self.key)?))
    }
}

impl std::fmt::Debug for BackendSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendSection")
            .field("source", &self.source)
            .field("url", &self.url)
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    /// Sent with lead registrations to identify this host.
    pub client_info: String,
    pub store: StoreSection,
    pub backend: BackendSection,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_file: None,
            client_info: format!("rent-calculator/{}", env!("CARGO_PKG_VERSION")),
            store: StoreSection::default(),
            backend: BackendSection::default(),
        }
    }
}

impl AppConfig {
    /// Loads from `path`, else from `$RENT_CALC_CONFIG`, else defaults, and
    /// then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let from_env = std::env::var_os(CONFIG_PATH_VAR).map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Overrides fields from variables returned by `lookup`. Empty values
    /// are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(STORE_BACKEND_VAR) {
            self.store.backend = v;
        }
        if let Some(v) = get(STORE_CONNECTION_VAR) {
            self.store.connection_string = v;
        }
        if let Some(v) = get(BACKEND_URL_VAR) {
            self.backend.url = Some(v);
        }
        if let Some(v) = get(BACKEND_KEY_VAR) {
            self.backend.key = Some(v);
        }
        if let Some(source) = get(LEAD_SOURCE_VAR).as_deref().and_then(LeadSource::parse) {
            self.backend.source = source;
        }
        if let Some(v) = get(LOG_LEVEL_VAR) {
            self.log_level = v;
        }
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::from(&self.store)
    }
}
