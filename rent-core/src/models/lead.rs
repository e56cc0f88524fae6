use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{CalculatorInput, CalculatorResult};

const INVALID_RESPONSE: &str = "Invalid response from server";

/// Outcome of the remote `submit_email_for_access` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationResponse {
    pub success: bool,
    pub message: String,
    /// The address had already been registered before this call.
    pub is_existing: bool,
}

impl RegistrationResponse {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            is_existing: false,
        }
    }

    /// Decodes the row-array payload returned by the hosted procedure.
    ///
    /// Only the first row is read. A missing row, a missing field or a field
    /// of the wrong type yields an unsuccessful response.
    pub fn from_rpc_payload(payload: &serde_json::Value) -> Self {
        #[derive(Deserialize)]
        struct Row {
            success: bool,
            message: String,
            existing: bool,
        }

        let row = payload
            .as_array()
            .and_then(|rows| rows.first())
            .and_then(|row| Row::deserialize(row).ok());

        match row {
            Some(row) => Self {
                success: row.success,
                message: row.message,
                is_existing: row.existing,
            },
            None => Self::rejected(INVALID_RESPONSE),
        }
    }
}

/// Plain success/message acknowledgement from the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAck {
    pub success: bool,
    pub message: String,
}

impl RemoteAck {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    /// Same fail-closed decoding as [`RegistrationResponse::from_rpc_payload`].
    pub fn from_rpc_payload(payload: &serde_json::Value) -> Self {
        payload
            .as_array()
            .and_then(|rows| rows.first())
            .and_then(|row| Self::deserialize(row).ok())
            .unwrap_or_else(|| Self::failed(INVALID_RESPONSE))
    }
}

/// Facts about the session recorded alongside the numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub timestamp: DateTime<Utc>,
    /// Income is at least three times the rent.
    pub meets_three_times_rule: bool,
    pub follows_30_rule: bool,
    /// At least $500 left each month.
    pub has_emergency_buffer: bool,
    pub client_info: Option<String>,
}

/// Payload for the remote `save_calculator_session` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculatorSessionRecord {
    pub email: String,
    pub monthly_income: Decimal,
    pub non_rent_expenses: Decimal,
    pub monthly_debt: Decimal,
    pub rent_percentage: u8,
    pub calculated_rent: Decimal,
    pub disposable_income: Decimal,
    pub metadata: SessionMetadata,
}

impl CalculatorSessionRecord {
    pub fn new(
        email: &str,
        input: &CalculatorInput,
        result: &CalculatorResult,
        client_info: Option<&str>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            email: email.trim().to_lowercase(),
            monthly_income: input.monthly_income,
            non_rent_expenses: input.non_rent_expenses,
            monthly_debt: input.monthly_debt,
            rent_percentage: input.rent_percentage.value(),
            calculated_rent: result.max_rent,
            disposable_income: result.disposable_income,
            metadata: SessionMetadata {
                timestamp,
                meets_three_times_rule: input.monthly_income >= result.max_rent * dec!(3),
                follows_30_rule: input.rent_percentage.value() <= 30,
                has_emergency_buffer: result.disposable_income >= dec!(500),
                client_info: client_info.map(str::to_string),
            },
        }
    }
}
