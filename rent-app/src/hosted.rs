//! Lead repository backed by the hosted database's RPC endpoint.
//!
//! Each procedure is a `POST {url}/rest/v1/rpc/{name}` with the key sent as
//! both `apikey` and a bearer token. Successful replies are row arrays and go
//! through the fail-closed decoders on [`RegistrationResponse`] and
//! [`RemoteAck`]; error statuses surface the backend's `message`. Transport
//! failures become [`RepositoryError::Connection`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use rent_core::models::{CalculatorSessionRecord, RegistrationResponse, RemoteAck};
use rent_core::store::{LeadRepository, RepositoryError};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Value, json};
use tracing::{debug, error};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const REGISTER_PROCEDURE: &str = "submit_email_for_access";
const SAVE_SESSION_PROCEDURE: &str = "save_calculator_session";
const DATABASE_ERROR: &str = "Database error. Please try again.";

enum RpcReply {
    Rows(Value),
    Refused(String),
}

pub struct HostedLeadRepository {
    client: reqwest::Client,
    rpc_base: String,
}

impl HostedLeadRepository {
    pub fn new(url: &str, key: &str) -> Result<Self, RepositoryError> {
        let base = reqwest::Url::parse(url.trim())
            .map_err(|e| RepositoryError::Configuration(format!("invalid backend url: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(auth_headers(key.trim())?)
            .build()
            .map_err(|e| RepositoryError::Configuration(format!("cannot build http client: {e}")))?;

        Ok(Self {
            client,
            rpc_base: format!("{}/rest/v1/rpc", base.as_str().trim_end_matches('/')),
        })
    }

    async fn call(&self, procedure: &str, params: &Value) -> Result<RpcReply, RepositoryError> {
        let url = format!("{}/{procedure}", self.rpc_base);
        let response = self.client.post(&url).json(params).send().await.map_err(|e| {
            error!(procedure, error = %e, "lead backend unreachable");
            RepositoryError::Connection(e.to_string())
        })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| RepositoryError::Connection(format!("read body failed: {e}")))?;
        let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        debug!(procedure, %status, "lead backend replied");

        if status.is_success() {
            return Ok(RpcReply::Rows(payload));
        }
        let message = payload
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or(DATABASE_ERROR)
            .to_string();
        error!(procedure, %status, %message, "lead backend refused the call");
        Ok(RpcReply::Refused(message))
    }
}

fn auth_headers(key: &str) -> Result<HeaderMap, RepositoryError> {
    let invalid = |e: reqwest::header::InvalidHeaderValue| {
        RepositoryError::Configuration(format!("invalid backend key: {e}"))
    };
    let mut headers = HeaderMap::new();
    headers.insert(HeaderName::from_static("apikey"), HeaderValue::from_str(key).map_err(invalid)?);
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {key}")).map_err(invalid)?,
    );
    Ok(headers)
}

fn number(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

#[async_trait]
impl LeadRepository for HostedLeadRepository {
    async fn submit_email_for_access(
        &self,
        email: &str,
        client_info: Option<&str>,
    ) -> Result<RegistrationResponse, RepositoryError> {
        let params = json!({ "user_email": email, "user_agent": client_info });

        Ok(match self.call(REGISTER_PROCEDURE, &params).await? {
            RpcReply::Rows(payload) => RegistrationResponse::from_rpc_payload(&payload),
            RpcReply::Refused(message) => RegistrationResponse::rejected(message),
        })
    }

    async fn save_calculator_session(
        &self,
        record: &CalculatorSessionRecord,
    ) -> Result<RemoteAck, RepositoryError> {
        let metadata = serde_json::to_value(&record.metadata)
            .map_err(|e| RepositoryError::Configuration(format!("cannot encode session metadata: {e}")))?;
        let params = json!({
            "user_email": record.email,
            "monthly_income": number(record.monthly_income),
            "non_rent_expenses": number(record.non_rent_expenses),
            "rent_percentage": record.rent_percentage,
            "calculated_rent": number(record.calculated_rent),
            "disposable_income": number(record.disposable_income),
            "session_data": metadata,
        });

        Ok(match self.call(SAVE_SESSION_PROCEDURE, &params).await? {
            RpcReply::Rows(payload) => RemoteAck::from_rpc_payload(&payload),
            RpcReply::Refused(message) => RemoteAck::failed(message),
        })
    }
}

impl std::fmt::Debug for HostedLeadRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostedLeadRepository")
            .field("rpc_base", &self.rpc_base)
            .finish_non_exhaustive()
    }
}
