//! Email gate in front of the premium advice.
//!
//! The gate is a small state machine:
//!
//! | from            | event              | to               |
//! |-----------------|--------------------|------------------|
//! | Locked / Error  | `Submit`           | Submitting       |
//! | Locked / Error  | `Rejected(msg)`    | Error(msg)       |
//! | Submitting      | `Succeeded(email)` | Unlocked(email)  |
//! | Submitting      | `Failed(msg)`      | Error(msg)       |
//!
//! Any other pairing leaves the state unchanged. [`EmailGateController`]
//! drives the machine against local storage and the lead backend.

use std::sync::{Arc, OnceLock};

use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{CalculatorInput, CalculatorResult, CalculatorSessionRecord, RegistrationResponse};
use crate::session::UNLOCK_KEY;
use crate::store::{KeyValueStore, LeadRepository, RepositoryError, SpreadsheetSync};

pub const INVALID_EMAIL_MESSAGE: &str = "Please enter a valid email address";
pub const NETWORK_MESSAGE: &str = "Network error. Please check your connection and try again.";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GateState {
    #[default]
    Locked,
    Submitting,
    Unlocked(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateEvent {
    Submit,
    Rejected(String),
    Succeeded(String),
    Failed(String),
}

impl GateState {
    pub fn transition(self, event: GateEvent) -> Self {
        match (self, event) {
            (Self::Locked | Self::Error(_), GateEvent::Submit) => Self::Submitting,
            (Self::Locked | Self::Error(_), GateEvent::Rejected(msg)) => Self::Error(msg),
            (Self::Submitting, GateEvent::Succeeded(email)) => Self::Unlocked(email),
            (Self::Submitting, GateEvent::Failed(msg)) => Self::Error(msg),
            (state, _) => state,
        }
    }

    pub fn is_unlocked(&self) -> bool {
        matches!(self, Self::Unlocked(_))
    }

    /// A new submission would be accepted.
    pub fn accepts_submit(&self) -> bool {
        matches!(self, Self::Locked | Self::Error(_))
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GateError {
    #[error("{}", INVALID_EMAIL_MESSAGE)]
    Validation,

    #[error("{0}")]
    Remote(String),

    #[error("{}", NETWORK_MESSAGE)]
    Network,

    #[error("a submission is already in progress")]
    InProgress,

    #[error("access is already unlocked")]
    AlreadyUnlocked,
}

fn email_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
}

/// Loose shape check on the trimmed text: something, `@`, something, `.`,
/// something, with no whitespace.
pub fn is_valid_email(raw: &str) -> bool {
    email_pattern().is_some_and(|re| re.is_match(raw.trim()))
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub struct EmailGateController {
    store: Arc<dyn KeyValueStore>,
    leads: Arc<dyn LeadRepository>,
    sync: Arc<dyn SpreadsheetSync>,
    client_info: String,
    state: GateState,
}

impl EmailGateController {
    /// Starts locked; call [`restore`](Self::restore) to pick up a previous
    /// unlock.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        leads: Arc<dyn LeadRepository>,
        sync: Arc<dyn SpreadsheetSync>,
        client_info: impl Into<String>,
    ) -> Self {
        Self {
            store,
            leads,
            sync,
            client_info: client_info.into(),
            state: GateState::Locked,
        }
    }

    /// Unlocks when local storage holds a valid email. Read failures and
    /// invalid values leave the gate locked.
    pub async fn restore(&mut self) {
        match self.store.get(UNLOCK_KEY).await {
            Ok(Some(email)) if is_valid_email(&email) => {
                tracing::debug!("restored unlocked session");
                self.state = GateState::Unlocked(normalize_email(&email));
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "could not read unlocked email"),
        }
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub fn is_unlocked(&self) -> bool {
        self.state.is_unlocked()
    }

    pub fn can_submit(&self) -> bool {
        self.state.accepts_submit()
    }

    pub fn unlocked_email(&self) -> Option<&str> {
        match &self.state {
            GateState::Unlocked(email) => Some(email),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            GateState::Error(msg) => Some(msg),
            _ => None,
        }
    }

    fn apply(&mut self, event: GateEvent) {
        let state = std::mem::take(&mut self.state);
        self.state = state.transition(event);
    }

    /// Registers `raw_email` with the lead backend and unlocks on success.
    ///
    /// An invalid address moves to the error state without contacting the
    /// backend. When `session` is given, a successful unlock also records
    /// the calculator session and queues it for the spreadsheet; failures
    /// there are logged only.
    ///
    /// # Errors
    /// * [`GateError::Validation`] for a malformed address.
    /// * [`GateError::Remote`] when the backend declines or errors.
    /// * [`GateError::Network`] when the backend is unreachable.
    /// * [`GateError::InProgress`] / [`GateError::AlreadyUnlocked`] when the
    ///   gate is not accepting submissions.
    pub async fn submit(
        &mut self,
        raw_email: &str,
        session: Option<(&CalculatorInput, &CalculatorResult)>,
    ) -> Result<RegistrationResponse, GateError> {
        match self.state {
            GateState::Submitting => return Err(GateError::InProgress),
            GateState::Unlocked(_) => return Err(GateError::AlreadyUnlocked),
            GateState::Locked | GateState::Error(_) => {}
        }

        if !is_valid_email(raw_email) {
            self.apply(GateEvent::Rejected(INVALID_EMAIL_MESSAGE.to_string()));
            return Err(GateError::Validation);
        }

        let email = normalize_email(raw_email);
        self.apply(GateEvent::Submit);

        let outcome = self
            .leads
            .submit_email_for_access(&email, Some(&self.client_info))
            .await;

        let response = match outcome {
            Ok(response) if response.success => response,
            Ok(response) => {
                tracing::error!(message = %response.message, "email registration declined");
                self.apply(GateEvent::Failed(response.message.clone()));
                return Err(GateError::Remote(response.message));
            }
            Err(RepositoryError::Connection(reason)) => {
                tracing::error!(%reason, "lead backend unreachable");
                self.apply(GateEvent::Failed(NETWORK_MESSAGE.to_string()));
                return Err(GateError::Network);
            }
            Err(e) => {
                tracing::error!(error = %e, "email registration failed");
                let message = e.to_string();
                self.apply(GateEvent::Failed(message.clone()));
                return Err(GateError::Remote(message));
            }
        };

        if let Err(e) = self.store.set(UNLOCK_KEY, &email).await {
            tracing::warn!(error = %e, "could not persist unlocked email");
        }
        tracing::info!(existing = response.is_existing, "premium content unlocked");
        self.apply(GateEvent::Succeeded(email.clone()));

        if let Some((input, result)) = session {
            self.record_session(&email, input, result).await;
        }

        Ok(response)
    }

    async fn record_session(&self, email: &str, input: &CalculatorInput, result: &CalculatorResult) {
        let record =
            CalculatorSessionRecord::new(email, input, result, Some(&self.client_info), Utc::now());

        match self.leads.save_calculator_session(&record).await {
            Ok(ack) if ack.success => tracing::debug!("calculator session saved"),
            Ok(ack) => tracing::warn!(message = %ack.message, "calculator session not saved"),
            Err(e) => tracing::warn!(error = %e, "calculator session not saved"),
        }

        match self.sync.sync(&record).await {
            Ok(ack) => tracing::debug!(message = %ack.message, "spreadsheet sync requested"),
            Err(e) => tracing::warn!(error = %e, "spreadsheet sync failed"),
        }
    }
}

impl std::fmt::Debug for EmailGateController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailGateController")
            .field("state", &self.state)
            .field("client_info", &self.client_info)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::calculations::calculate;
    use crate::models::{RemoteAck, RentPercentage};
    use crate::store::{MemoryLeadRepository, MemoryStore, OfflineLeadRepository, QueuedSpreadsheetSync};

    /// Scripted lead backend that counts calls.
    struct StubLeads {
        reply: Result<RegistrationResponse, RepositoryError>,
        submits: AtomicUsize,
        seen: Mutex<Vec<(String, Option<String>)>>,
        saved: AtomicUsize,
    }

    impl StubLeads {
        fn replying(reply: Result<RegistrationResponse, RepositoryError>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                submits: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
                saved: AtomicUsize::new(0),
            })
        }

        fn accepting() -> Arc<Self> {
            Self::replying(Ok(RegistrationResponse {
                success: true,
                message: "Email registered successfully".to_string(),
                is_existing: false,
            }))
        }
    }

    #[async_trait]
    impl LeadRepository for StubLeads {
        async fn submit_email_for_access(
            &self,
            email: &str,
            client_info: Option<&str>,
        ) -> Result<RegistrationResponse, RepositoryError> {
            self.submits.fetch_add(1, Ordering::SeqCst);
            self.seen
                .lock()
                .unwrap()
                .push((email.to_string(), client_info.map(str::to_string)));
            self.reply.clone()
        }

        async fn save_calculator_session(
            &self,
            _record: &CalculatorSessionRecord,
        ) -> Result<RemoteAck, RepositoryError> {
            self.saved.fetch_add(1, Ordering::SeqCst);
            Err(RepositoryError::Database("table missing".to_string()))
        }
    }

    fn controller(store: Arc<MemoryStore>, leads: Arc<dyn LeadRepository>) -> EmailGateController {
        EmailGateController::new(store, leads, Arc::new(QueuedSpreadsheetSync), "test-host/1.0")
    }

    // =========================================================================
    // transition table
    // =========================================================================

    #[test]
    fn submit_moves_locked_and_error_to_submitting() {
        assert_eq!(GateState::Locked.transition(GateEvent::Submit), GateState::Submitting);
        assert_eq!(
            GateState::Error("x".to_string()).transition(GateEvent::Submit),
            GateState::Submitting
        );
    }

    #[test]
    fn outcomes_only_apply_while_submitting() {
        assert_eq!(
            GateState::Submitting.transition(GateEvent::Succeeded("a@b.co".to_string())),
            GateState::Unlocked("a@b.co".to_string())
        );
        assert_eq!(
            GateState::Submitting.transition(GateEvent::Failed("nope".to_string())),
            GateState::Error("nope".to_string())
        );
        assert_eq!(
            GateState::Locked.transition(GateEvent::Succeeded("a@b.co".to_string())),
            GateState::Locked
        );
    }

    #[test]
    fn rejection_moves_to_error() {
        assert_eq!(
            GateState::Locked.transition(GateEvent::Rejected("bad".to_string())),
            GateState::Error("bad".to_string())
        );
    }

    #[test]
    fn unlocked_is_terminal() {
        let unlocked = GateState::Unlocked("a@b.co".to_string());

        for event in [
            GateEvent::Submit,
            GateEvent::Rejected("x".to_string()),
            GateEvent::Failed("x".to_string()),
        ] {
            assert_eq!(unlocked.clone().transition(event), unlocked);
        }
    }

    #[test]
    fn submitting_ignores_a_second_submit() {
        assert_eq!(GateState::Submitting.transition(GateEvent::Submit), GateState::Submitting);
    }

    // =========================================================================
    // email validation
    // =========================================================================

    #[test]
    fn email_shape_check() {
        assert!(is_valid_email("renter@example.com"));
        assert!(is_valid_email("  renter@example.co.uk  "));
        assert!(!is_valid_email("foo@bar"));
        assert!(!is_valid_email("foo bar@example.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize_email("  Renter@Example.COM "), "renter@example.com");
    }

    // =========================================================================
    // controller
    // =========================================================================

    #[tokio::test]
    async fn invalid_email_never_reaches_the_backend() {
        let leads = StubLeads::accepting();
        let mut gate = controller(Arc::new(MemoryStore::new()), leads.clone());

        let outcome = gate.submit("foo@bar", None).await;

        assert_eq!(outcome, Err(GateError::Validation));
        assert_eq!(gate.state(), &GateState::Error(INVALID_EMAIL_MESSAGE.to_string()));
        assert_eq!(leads.submits.load(Ordering::SeqCst), 0);
        assert!(gate.can_submit());
    }

    #[tokio::test]
    async fn successful_submit_unlocks_and_persists() {
        let store = Arc::new(MemoryStore::new());
        let leads = StubLeads::accepting();
        let mut gate = controller(store.clone(), leads.clone());

        let response = gate.submit("  Renter@Example.COM ", None).await.unwrap();

        assert!(response.success);
        assert!(gate.is_unlocked());
        assert_eq!(gate.unlocked_email(), Some("renter@example.com"));
        assert_eq!(
            store.get(UNLOCK_KEY).await.unwrap().as_deref(),
            Some("renter@example.com")
        );
        assert_eq!(
            leads.seen.lock().unwrap().as_slice(),
            &[("renter@example.com".to_string(), Some("test-host/1.0".to_string()))]
        );
    }

    #[tokio::test]
    async fn declined_registration_surfaces_backend_message() {
        let leads = StubLeads::replying(Ok(RegistrationResponse::rejected("Rate limited")));
        let mut gate = controller(Arc::new(MemoryStore::new()), leads);

        let outcome = gate.submit("a@b.co", None).await;

        assert_eq!(outcome, Err(GateError::Remote("Rate limited".to_string())));
        assert_eq!(gate.error_message(), Some("Rate limited"));
        assert!(gate.can_submit());
    }

    #[tokio::test]
    async fn connection_failure_is_a_network_error() {
        let leads = StubLeads::replying(Err(RepositoryError::Connection("refused".to_string())));
        let mut gate = controller(Arc::new(MemoryStore::new()), leads);

        assert_eq!(gate.submit("a@b.co", None).await, Err(GateError::Network));
        assert_eq!(gate.error_message(), Some(NETWORK_MESSAGE));
    }

    #[tokio::test]
    async fn offline_backend_is_a_retryable_remote_error() {
        let store = Arc::new(MemoryStore::new());
        let mut gate = controller(store.clone(), Arc::new(OfflineLeadRepository));

        let outcome = gate.submit("a@b.co", None).await;

        assert!(matches!(outcome, Err(GateError::Remote(ref msg)) if msg.contains("offline")));
        assert!(gate.can_submit());
        assert_eq!(store.get(UNLOCK_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn retry_after_error_can_succeed() {
        let leads = StubLeads::accepting();
        let mut gate = controller(Arc::new(MemoryStore::new()), leads.clone());

        assert!(gate.submit("foo@bar", None).await.is_err());
        assert!(gate.submit("foo@bar.com", None).await.is_ok());

        assert!(gate.is_unlocked());
        assert_eq!(leads.submits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unlocked_gate_refuses_further_submissions() {
        let leads = StubLeads::accepting();
        let mut gate = controller(Arc::new(MemoryStore::new()), leads.clone());
        gate.submit("a@b.co", None).await.unwrap();

        assert_eq!(gate.submit("c@d.co", None).await, Err(GateError::AlreadyUnlocked));
        assert_eq!(leads.submits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn restore_unlocks_from_stored_email() {
        let store = Arc::new(MemoryStore::new());
        store.set(UNLOCK_KEY, "renter@example.com").await.unwrap();
        let mut gate = controller(store, StubLeads::accepting());

        gate.restore().await;

        assert_eq!(gate.unlocked_email(), Some("renter@example.com"));
    }

    #[tokio::test]
    async fn restore_ignores_invalid_stored_email() {
        let store = Arc::new(MemoryStore::new());
        store.set(UNLOCK_KEY, "not-an-email").await.unwrap();
        let mut gate = controller(store, StubLeads::accepting());

        gate.restore().await;

        assert_eq!(gate.state(), &GateState::Locked);
    }

    #[tokio::test]
    async fn session_save_failure_does_not_block_unlock() {
        let leads = StubLeads::accepting();
        let mut gate = controller(Arc::new(MemoryStore::new()), leads.clone());
        let input = CalculatorInput {
            monthly_income: dec!(5000),
            non_rent_expenses: dec!(1500),
            monthly_debt: dec!(0),
            rent_percentage: RentPercentage::new(30),
        };
        let result = calculate(&input);

        let outcome = gate.submit("a@b.co", Some((&input, &result))).await;

        assert!(outcome.is_ok());
        assert!(gate.is_unlocked());
        assert_eq!(leads.saved.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn session_is_recorded_with_memory_backend() {
        let leads = Arc::new(MemoryLeadRepository::new());
        let mut gate = controller(Arc::new(MemoryStore::new()), leads.clone());
        let input = CalculatorInput {
            monthly_income: dec!(3000),
            non_rent_expenses: dec!(1200),
            monthly_debt: dec!(500),
            rent_percentage: RentPercentage::new(45),
        };
        let result = calculate(&input);

        gate.submit("A@B.co", Some((&input, &result))).await.unwrap();

        let sessions = leads.sessions();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].email, "a@b.co");
        assert_eq!(sessions[0].calculated_rent, dec!(1350));
        assert_eq!(sessions[0].metadata.client_info.as_deref(), Some("test-host/1.0"));
    }
}
