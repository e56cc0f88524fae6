use async_trait::async_trait;
use thiserror::Error;

use crate::models::{CalculatorSessionRecord, RegistrationResponse, RemoteAck};

/// Failure talking to the lead backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Failure reading or writing local storage.
///
/// Callers log these and carry on with defaults; they never reach the user.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("storage read failed for '{key}': {reason}")]
    Read { key: String, reason: String },

    #[error("storage write failed for '{key}': {reason}")]
    Write { key: String, reason: String },
}

/// Browser-style local storage: string values under string keys,
/// last write wins.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// The hosted database's two procedures for captured leads.
#[async_trait]
pub trait LeadRepository: Send + Sync {
    /// Registers `email` (already trimmed and lower-cased) for access to the
    /// premium content. Registering an address twice succeeds with
    /// `is_existing` set.
    async fn submit_email_for_access(
        &self,
        email: &str,
        client_info: Option<&str>,
    ) -> Result<RegistrationResponse, RepositoryError>;

    /// Records a calculator session against a registered email.
    async fn save_calculator_session(
        &self,
        record: &CalculatorSessionRecord,
    ) -> Result<RemoteAck, RepositoryError>;
}
