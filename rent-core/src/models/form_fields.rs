use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CalculatorInput, RentPercentage};
use crate::calculations::common::{parse_amount, sanitize_amount};

/// Raw form state as the user typed it.
///
/// Money fields hold digit-only text (possibly empty); they are parsed into a
/// [`CalculatorInput`] on demand.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormFields {
    pub monthly_income: String,
    pub non_rent_expenses: String,
    pub monthly_debt: String,
    pub rent_percentage: RentPercentage,
}

impl FormFields {
    pub fn to_input(&self) -> CalculatorInput {
        CalculatorInput {
            monthly_income: parse_amount(&self.monthly_income),
            non_rent_expenses: parse_amount(&self.non_rent_expenses),
            monthly_debt: parse_amount(&self.monthly_debt),
            rent_percentage: self.rent_percentage,
        }
    }

    /// True when nothing differs from a fresh form.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Snapshot written to local storage under the calculator inputs key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    pub monthly_income: String,
    pub non_rent_expenses: String,
    pub monthly_debt: String,
    pub rent_percentage: u8,
    pub last_updated: DateTime<Utc>,
}

impl StoredSession {
    pub fn capture(fields: &FormFields, now: DateTime<Utc>) -> Self {
        Self {
            monthly_income: fields.monthly_income.clone(),
            non_rent_expenses: fields.non_rent_expenses.clone(),
            monthly_debt: fields.monthly_debt.clone(),
            rent_percentage: fields.rent_percentage.value(),
            last_updated: now,
        }
    }

    /// Decodes a stored snapshot back into form fields.
    ///
    /// Missing fields fall back to their defaults, a missing or zero
    /// percentage becomes 30, and stored text is re-sanitised. Anything that
    /// is not a JSON object of the expected shape is an error.
    pub fn decode(raw: &str) -> Result<FormFields, serde_json::Error> {
        let stored: StoredSessionRaw = serde_json::from_str(raw)?;

        let rent_percentage = match stored.rent_percentage {
            Some(pct) if pct != 0 => RentPercentage::new(pct),
            _ => RentPercentage::default(),
        };

        Ok(FormFields {
            monthly_income: StoredAmount::digits(stored.monthly_income),
            non_rent_expenses: StoredAmount::digits(stored.non_rent_expenses),
            monthly_debt: StoredAmount::digits(stored.monthly_debt),
            rent_percentage,
        })
    }
}

/// A money field as found in storage: normally text, but older or
/// hand-edited snapshots may hold a bare number.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredAmount {
    Text(String),
    Number(serde_json::Number),
}

impl StoredAmount {
    fn digits(value: Option<Self>) -> String {
        match value {
            None => String::new(),
            Some(Self::Text(text)) => sanitize_amount(&text),
            Some(Self::Number(number)) => match (number.as_u64(), number.as_f64()) {
                (Some(whole), _) => whole.to_string(),
                (None, Some(float)) => sanitize_amount(&format!("{:.0}", float.abs().trunc())),
                (None, None) => String::new(),
            },
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSessionRaw {
    #[serde(default)]
    monthly_income: Option<StoredAmount>,
    #[serde(default)]
    non_rent_expenses: Option<StoredAmount>,
    #[serde(default)]
    monthly_debt: Option<StoredAmount>,
    #[serde(default)]
    rent_percentage: Option<i64>,
}
