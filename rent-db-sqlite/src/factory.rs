use std::sync::Arc;

use async_trait::async_trait;
use rent_core::store::{RepositoryError, StoreConfig, StoreFactory, StoreHandles};

use crate::repository::SqliteRepository;

/// [`StoreFactory`] for SQLite.
///
/// Register this with a [`rent_core::store::StoreRegistry`] to make the
/// `"sqlite"` backend available:
///
/// ```rust,no_run
/// use rent_core::store::StoreRegistry;
/// use rent_db_sqlite::SqliteStoreFactory;
///
/// let mut registry = StoreRegistry::new();
/// registry.register(Box::new(SqliteStoreFactory));
/// ```
pub struct SqliteStoreFactory;

#[async_trait]
impl StoreFactory for SqliteStoreFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Open the database described by `config.connection_string` and run
    /// migrations.
    ///
    /// Accepted connection strings:
    /// * a file path such as `"rent-calculator.db"`, created if missing;
    /// * a `sqlite:` URL;
    /// * `":memory:"` for an ephemeral database.
    ///
    /// Both handles share one connection pool.
    async fn open(&self, config: &StoreConfig) -> Result<StoreHandles, RepositoryError> {
        let repo = SqliteRepository::open(&config.connection_string)
            .await
            .map_err(|e| RepositoryError::Connection(format!("{e:#}")))?;
        repo.run_migrations()
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;

        tracing::info!(location = %config.connection_string, "sqlite store ready");

        let repo = Arc::new(repo);
        Ok(StoreHandles {
            local: repo.clone(),
            leads: repo,
        })
    }
}
