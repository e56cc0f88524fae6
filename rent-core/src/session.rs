//! Calculator form state with local persistence.
//!
//! [`SessionStateManager`] owns the four form fields and the result derived
//! from them. Every setter recomputes the result before persisting, so
//! [`SessionStateManager::result`] always reflects [`SessionStateManager::fields`].
//! Storage failures are logged and never surface to the caller.

use std::sync::Arc;

use chrono::Utc;

use crate::calculations::{calculate, common::sanitize_amount};
use crate::models::{CalculatorInput, CalculatorResult, FormFields, RentPercentage, StoredSession};
use crate::store::KeyValueStore;

/// Local storage key holding the form snapshot.
pub const SESSION_KEY: &str = "rentCalculatorData";

/// Local storage key holding the unlocked email.
pub const UNLOCK_KEY: &str = "rentCalculatorUnlockedEmail";

pub struct SessionStateManager {
    store: Arc<dyn KeyValueStore>,
    fields: FormFields,
    result: CalculatorResult,
}

impl SessionStateManager {
    /// Loads the saved snapshot, if any.
    ///
    /// Absent, unreadable or malformed data leaves the form at its defaults.
    /// Nothing is written back while restoring.
    pub async fn restore(store: Arc<dyn KeyValueStore>) -> Self {
        let fields = match store.get(SESSION_KEY).await {
            Ok(Some(raw)) => StoredSession::decode(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "discarding malformed saved session");
                FormFields::default()
            }),
            Ok(None) => FormFields::default(),
            Err(e) => {
                tracing::warn!(error = %e, "could not read saved session");
                FormFields::default()
            }
        };

        let result = calculate(&fields.to_input());
        tracing::debug!(restored = !fields.is_default(), "session restored");

        Self {
            store,
            fields,
            result,
        }
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    pub fn input(&self) -> CalculatorInput {
        self.fields.to_input()
    }

    pub fn result(&self) -> &CalculatorResult {
        &self.result
    }

    /// Accepts raw text; everything except ASCII digits is dropped.
    pub async fn set_monthly_income(&mut self, raw: &str) {
        self.fields.monthly_income = sanitize_amount(raw);
        self.commit().await;
    }

    pub async fn set_non_rent_expenses(&mut self, raw: &str) {
        self.fields.non_rent_expenses = sanitize_amount(raw);
        self.commit().await;
    }

    pub async fn set_monthly_debt(&mut self, raw: &str) {
        self.fields.monthly_debt = sanitize_amount(raw);
        self.commit().await;
    }

    /// Clamped into the slider range.
    pub async fn set_rent_percentage(&mut self, pct: i64) {
        self.fields.rent_percentage = RentPercentage::new(pct);
        self.commit().await;
    }

    pub async fn reset(&mut self) {
        self.fields = FormFields::default();
        self.commit().await;
    }

    async fn commit(&mut self) {
        self.result = calculate(&self.fields.to_input());
        tracing::debug!(
            max_rent = %self.result.max_rent,
            disposable = %self.result.disposable_income,
            "recalculated"
        );
        self.persist().await;
    }

    async fn persist(&self) {
        let snapshot = StoredSession::capture(&self.fields, Utc::now());
        let json = match serde_json::to_string(&snapshot) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "could not encode session");
                return;
            }
        };

        if let Err(e) = self.store.set(SESSION_KEY, &json).await {
            tracing::warn!(error = %e, "could not save session");
        }
    }
}

impl std::fmt::Debug for SessionStateManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStateManager")
            .field("fields", &self.fields)
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}
