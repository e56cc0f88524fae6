use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::memory::{MemoryLeadRepository, MemoryStore};
use super::repository::{KeyValueStore, LeadRepository, RepositoryError};

/// Backend-agnostic storage configuration.
///
/// `backend` must match the [`StoreFactory::backend_name`] of a registered
/// factory. `connection_string` is forwarded to that factory unchanged.
///
/// | backend  | connection_string examples        |
/// |----------|-----------------------------------|
/// | `memory` | ignored                           |
/// | `sqlite` | `rent-calculator.db`, `:memory:`  |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub backend: String,
    pub connection_string: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: ":memory:".to_string(),
        }
    }
}

/// The two storage seams a backend provides.
#[derive(Clone)]
pub struct StoreHandles {
    pub local: Arc<dyn KeyValueStore>,
    pub leads: Arc<dyn LeadRepository>,
}

impl std::fmt::Debug for StoreHandles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreHandles").finish_non_exhaustive()
    }
}

/// One implementation per storage backend, registered with a
/// [`StoreRegistry`] at startup.
#[async_trait]
pub trait StoreFactory: Send + Sync {
    fn backend_name(&self) -> &'static str;

    /// Open (or create) the backend. Implementations may run migrations here.
    async fn open(&self, config: &StoreConfig) -> Result<StoreHandles, RepositoryError>;
}

/// Factory for the in-process backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryStoreFactory;

#[async_trait]
impl StoreFactory for MemoryStoreFactory {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn open(&self, _config: &StoreConfig) -> Result<StoreHandles, RepositoryError> {
        Ok(StoreHandles {
            local: Arc::new(MemoryStore::new()),
            leads: Arc::new(MemoryLeadRepository::new()),
        })
    }
}

/// Registry of [`StoreFactory`] instances, keyed by backend name.
pub struct StoreRegistry {
    factories: HashMap<&'static str, Box<dyn StoreFactory>>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a backend factory, replacing any with the same name.
    pub fn register(&mut self, factory: Box<dyn StoreFactory>) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Names of every registered backend, sorted alphabetically.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Dispatch to the factory matching `config.backend`.
    ///
    /// # Errors
    /// * [`RepositoryError::Configuration`] when no factory is registered
    ///   under the requested name.
    /// * Any error the chosen factory returns.
    pub async fn open(&self, config: &StoreConfig) -> Result<StoreHandles, RepositoryError> {
        let factory = self
            .factories
            .get(config.backend.as_str())
            .ok_or_else(|| {
                RepositoryError::Configuration(format!(
                    "unknown backend '{}'; available: {:?}",
                    config.backend,
                    self.available_backends()
                ))
            })?;

        tracing::debug!(backend = %config.backend, "opening storage backend");
        factory.open(config).await
    }
}

impl Default for StoreRegistry {
    fn default() -> Self {
        Self::new()
    }
}
