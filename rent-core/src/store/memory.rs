//! In-process backends.
//!
//! [`MemoryStore`] and [`MemoryLeadRepository`] back the `"memory"` backend
//! and keep tests free of a database. [`OfflineLeadRepository`] stands in for
//! the hosted database when no credentials are configured.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::repository::{KeyValueStore, LeadRepository, RepositoryError, StoreError};
use crate::models::{CalculatorSessionRecord, RegistrationResponse, RemoteAck};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        lock(&self.entries).remove(key);
        Ok(())
    }
}

/// Lead registry held in memory.
#[derive(Debug, Default)]
pub struct MemoryLeadRepository {
    registrations: Mutex<HashMap<String, u32>>,
    sessions: Mutex<Vec<CalculatorSessionRecord>>,
}

impl MemoryLeadRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Times `email` has been submitted.
    pub fn registration_count(&self, email: &str) -> u32 {
        lock(&self.registrations).get(email).copied().unwrap_or(0)
    }

    pub fn sessions(&self) -> Vec<CalculatorSessionRecord> {
        lock(&self.sessions).clone()
    }
}

#[async_trait]
impl LeadRepository for MemoryLeadRepository {
    async fn submit_email_for_access(
        &self,
        email: &str,
        _client_info: Option<&str>,
    ) -> Result<RegistrationResponse, RepositoryError> {
        let mut registrations = lock(&self.registrations);
        let count = registrations.entry(email.to_string()).or_insert(0);
        *count += 1;

        let is_existing = *count > 1;
        Ok(RegistrationResponse {
            success: true,
            message: if is_existing {
                "Welcome back! Access granted.".to_string()
            } else {
                "Email registered successfully".to_string()
            },
            is_existing,
        })
    }

    async fn save_calculator_session(
        &self,
        record: &CalculatorSessionRecord,
    ) -> Result<RemoteAck, RepositoryError> {
        if !lock(&self.registrations).contains_key(&record.email) {
            return Ok(RemoteAck::failed("Email not registered"));
        }
        lock(&self.sessions).push(record.clone());
        Ok(RemoteAck::ok("Session saved"))
    }
}

/// Lead backend used when no hosted database is configured.
///
/// Every call fails with a configuration error, which the email gate shows
/// as a retryable remote error.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineLeadRepository;

pub const OFFLINE_MESSAGE: &str = "Lead backend not configured (offline mode)";

#[async_trait]
impl LeadRepository for OfflineLeadRepository {
    async fn submit_email_for_access(
        &self,
        _email: &str,
        _client_info: Option<&str>,
    ) -> Result<RegistrationResponse, RepositoryError> {
        Err(RepositoryError::Configuration(OFFLINE_MESSAGE.to_string()))
    }

    async fn save_calculator_session(
        &self,
        _record: &CalculatorSessionRecord,
    ) -> Result<RemoteAck, RepositoryError> {
        Err(RepositoryError::Configuration(OFFLINE_MESSAGE.to_string()))
    }
}
