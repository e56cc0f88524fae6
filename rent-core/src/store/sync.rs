use async_trait::async_trait;

use super::repository::RepositoryError;
use crate::models::{CalculatorSessionRecord, RemoteAck};

/// Pushes captured sessions to an external spreadsheet.
#[async_trait]
pub trait SpreadsheetSync: Send + Sync {
    async fn sync(&self, record: &CalculatorSessionRecord) -> Result<RemoteAck, RepositoryError>;
}

/// Accepts every record without sending it anywhere.
///
/// There is no spreadsheet integration yet; this acknowledges the record so
/// callers can treat sync as fire-and-forget.
#[derive(Debug, Default, Clone, Copy)]
pub struct QueuedSpreadsheetSync;

#[async_trait]
impl SpreadsheetSync for QueuedSpreadsheetSync {
    async fn sync(&self, record: &CalculatorSessionRecord) -> Result<RemoteAck, RepositoryError> {
        tracing::info!(email = %record.email, "session queued for spreadsheet sync");
        Ok(RemoteAck::ok("Queued for spreadsheet sync"))
    }
}
