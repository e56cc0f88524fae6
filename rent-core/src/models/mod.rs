mod calculator_input;
mod calculator_result;
mod form_fields;
mod lead;
mod tier;

pub use calculator_input::{CalculatorInput, RentPercentage};
pub use calculator_result::CalculatorResult;
pub use form_fields::{FormFields, StoredSession};
pub use lead::{CalculatorSessionRecord, RegistrationResponse, RemoteAck, SessionMetadata};
pub use tier::{ApprovalScore, DisposableTier, RentTier, ScoreBand, StatusColor};
