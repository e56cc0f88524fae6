use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use rent_core::models::{CalculatorSessionRecord, RegistrationResponse, RemoteAck, SessionMetadata};
use rent_core::store::{KeyValueStore, LeadRepository, RepositoryError, StoreError};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use crate::decimal::{decimal_to_f64, get_decimal};

pub const MEMORY: &str = ":memory:";

/// Local storage and the lead procedures on one SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Opens `connection_string`, which is either [`MEMORY`] or a file path.
    /// Files are created when missing.
    pub async fn open(connection_string: &str) -> Result<Self> {
        let pool = if connection_string == MEMORY {
            // Every connection to `sqlite::memory:` is a separate database,
            // so keep exactly one alive.
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect("sqlite::memory:")
                .await
                .context("Failed to open in-memory database")?
        } else {
            let options = SqliteConnectOptions::from_str(connection_string)
                .with_context(|| format!("Invalid SQLite location: {}", connection_string))?
                .create_if_missing(true)
                .foreign_keys(true);
            SqlitePoolOptions::new()
                .connect_with(options)
                .await
                .with_context(|| format!("Failed to connect to database: {}", connection_string))?
        };
        Ok(Self { pool })
    }

    /// Wraps an already-connected pool. Migrations are not run.
    pub fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Sessions recorded for `email`, oldest first.
    pub async fn list_sessions(&self, email: &str) -> Result<Vec<CalculatorSessionRecord>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT l.email, s.monthly_income, s.non_rent_expenses, s.monthly_debt,
                    s.rent_percentage, s.calculated_rent, s.disposable_income, s.metadata
             FROM calculator_sessions s
             JOIN email_leads l ON l.id = s.lead_id
             WHERE l.email = ?
             ORDER BY s.id",
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.iter().map(row_to_session).collect()
    }

    /// How many times `email` has been submitted, if it is registered.
    pub async fn access_count(&self, email: &str) -> Result<i64, RepositoryError> {
        sqlx::query_scalar("SELECT access_count FROM email_leads WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?
            .ok_or(RepositoryError::NotFound)
    }
}

fn row_to_session(row: &sqlx::sqlite::SqliteRow) -> Result<CalculatorSessionRecord, RepositoryError> {
    let metadata: String = row
        .try_get("metadata")
        .map_err(|e| RepositoryError::Database(e.to_string()))?;
    let metadata: SessionMetadata = serde_json::from_str(&metadata)
        .map_err(|e| RepositoryError::Database(format!("Invalid session metadata: {}", e)))?;
    let rent_percentage: i64 = row
        .try_get("rent_percentage")
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

    Ok(CalculatorSessionRecord {
        email: row
            .try_get("email")
            .map_err(|e| RepositoryError::Database(e.to_string()))?,
        monthly_income: get_decimal(row, "monthly_income")?,
        non_rent_expenses: get_decimal(row, "non_rent_expenses")?,
        monthly_debt: get_decimal(row, "monthly_debt")?,
        rent_percentage: u8::try_from(rent_percentage)
            .map_err(|e| RepositoryError::Database(format!("Invalid rent percentage: {}", e)))?,
        calculated_rent: get_decimal(row, "calculated_rent")?,
        disposable_income: get_decimal(row, "disposable_income")?,
        metadata,
    })
}

#[async_trait]
impl KeyValueStore for SqliteRepository {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        sqlx::query_scalar("SELECT value FROM local_storage WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Read {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO local_storage (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Write {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM local_storage WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Write {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }
}

#[async_trait]
impl LeadRepository for SqliteRepository {
    async fn submit_email_for_access(
        &self,
        email: &str,
        client_info: Option<&str>,
    ) -> Result<RegistrationResponse, RepositoryError> {
        let now = Utc::now();

        let access_count: i64 = sqlx::query_scalar(
            "INSERT INTO email_leads (email, client_info, access_count, created_at, last_access_at)
             VALUES (?, ?, 1, ?, ?)
             ON CONFLICT (email) DO UPDATE SET
                 access_count = access_count + 1,
                 client_info = COALESCE(excluded.client_info, client_info),
                 last_access_at = excluded.last_access_at
             RETURNING access_count",
        )
        .bind(email)
        .bind(client_info)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let is_existing = access_count > 1;
        tracing::debug!(is_existing, "lead registered");

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
        let lead_id: Option<i64> = sqlx::query_scalar("SELECT id FROM email_leads WHERE email = ?")
            .bind(&record.email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let Some(lead_id) = lead_id else {
            return Ok(RemoteAck::failed("Email not registered"));
        };

        let metadata = serde_json::to_string(&record.metadata)
            .map_err(|e| RepositoryError::Database(format!("Failed to encode metadata: {}", e)))?;

        sqlx::query(
            "INSERT INTO calculator_sessions (
                lead_id, monthly_income, non_rent_expenses, monthly_debt, rent_percentage,
                calculated_rent, disposable_income, metadata, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(lead_id)
        .bind(decimal_to_f64(record.monthly_income))
        .bind(decimal_to_f64(record.non_rent_expenses))
        .bind(decimal_to_f64(record.monthly_debt))
        .bind(i64::from(record.rent_percentage))
        .bind(decimal_to_f64(record.calculated_rent))
        .bind(decimal_to_f64(record.disposable_income))
        .bind(metadata)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(RemoteAck::ok("Session saved"))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rent_core::calculations::calculate;
    use rent_core::models::{CalculatorInput, RentPercentage};
    use rust_decimal_macros::dec;

    use super::*;

    async fn setup_test_db() -> SqliteRepository {
        let repo = SqliteRepository::open(MEMORY)
            .await
            .expect("Failed to create in-memory database");
        repo.run_migrations()
            .await
            .expect("Failed to run migrations");
        repo
    }

    fn record(email: &str) -> CalculatorSessionRecord {
        let input = CalculatorInput {
            monthly_income: dec!(3000),
            non_rent_expenses: dec!(1200),
            monthly_debt: dec!(500),
            rent_percentage: RentPercentage::new(45),
        };
        CalculatorSessionRecord::new(email, &input, &calculate(&input), Some("test"), Utc::now())
    }

    // local storage

    #[tokio::test]
    async fn test_get_missing_key() {
        let repo = setup_test_db().await;

        assert_eq!(repo.get("rentCalculatorData").await, Ok(None));
    }

    #[tokio::test]
    async fn test_set_overwrites_and_remove_deletes() {
        let repo = setup_test_db().await;

        repo.set("k", "first").await.expect("Should set");
        repo.set("k", "second").await.expect("Should overwrite");
        assert_eq!(repo.get("k").await, Ok(Some("second".to_string())));

        repo.remove("k").await.expect("Should remove");
        assert_eq!(repo.get("k").await, Ok(None));
    }

    #[tokio::test]
    async fn test_repositories_over_one_pool_share_data() {
        let repo = setup_test_db().await;
        let other = SqliteRepository::new_with_pool(repo.pool().clone());

        repo.set("rentCalculatorData", "{}").await.expect("Should set");
        other
            .submit_email_for_access("renter@example.com", None)
            .await
            .expect("Should register");

        assert_eq!(other.get("rentCalculatorData").await, Ok(Some("{}".to_string())));
        assert_eq!(repo.access_count("renter@example.com").await, Ok(1));
    }

    #[tokio::test]
    async fn test_storage_errors_name_the_key() {
        let repo = setup_test_db().await;
        sqlx::query("DROP TABLE local_storage")
            .execute(repo.pool())
            .await
            .expect("Should drop table");

        assert!(matches!(
            repo.get("rentCalculatorData").await,
            Err(StoreError::Read { key, .. }) if key == "rentCalculatorData"
        ));
        assert!(matches!(repo.set("k", "v").await, Err(StoreError::Write { .. })));
    }

    // leads

    #[tokio::test]
    async fn test_first_registration_is_new() {
        let repo = setup_test_db().await;

        let response = repo
            .submit_email_for_access("renter@example.com", Some("host/1.0"))
            .await
            .expect("Should register");

        assert_eq!(
            response,
            RegistrationResponse {
                success: true,
                message: "Email registered successfully".to_string(),
                is_existing: false,
            }
        );
        assert_eq!(repo.access_count("renter@example.com").await, Ok(1));
    }

    #[tokio::test]
    async fn test_repeat_registration_is_existing() {
        let repo = setup_test_db().await;

        repo.submit_email_for_access("renter@example.com", None)
            .await
            .expect("Should register");
        let again = repo
            .submit_email_for_access("renter@example.com", None)
            .await
            .expect("Should register again");

        assert!(again.success);
        assert!(again.is_existing);
        assert_eq!(repo.access_count("renter@example.com").await, Ok(2));
    }

    #[tokio::test]
    async fn test_access_count_not_found() {
        let repo = setup_test_db().await;

        assert_eq!(repo.access_count("nobody@example.com").await, Err(RepositoryError::NotFound));
    }

    // sessions

    #[tokio::test]
    async fn test_save_session_requires_registration() {
        let repo = setup_test_db().await;

        let ack = repo
            .save_calculator_session(&record("renter@example.com"))
            .await
            .expect("Should answer");

        assert_eq!(ack, RemoteAck::failed("Email not registered"));
    }

    #[tokio::test]
    async fn test_save_and_list_sessions() {
        let repo = setup_test_db().await;
        repo.submit_email_for_access("renter@example.com", None)
            .await
            .expect("Should register");
        let saved = record("renter@example.com");

        let ack = repo
            .save_calculator_session(&saved)
            .await
            .expect("Should save");
        let sessions = repo
            .list_sessions("renter@example.com")
            .await
            .expect("Should list");

        assert_eq!(ack, RemoteAck::ok("Session saved"));
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].calculated_rent, dec!(1350));
        assert_eq!(sessions[0].disposable_income, dec!(-50));
        assert_eq!(sessions[0].rent_percentage, 45);
        assert_eq!(sessions[0].metadata, saved.metadata);
    }

    #[tokio::test]
    async fn test_list_sessions_for_unknown_email_is_empty() {
        let repo = setup_test_db().await;

        assert_eq!(repo.list_sessions("nobody@example.com").await, Ok(Vec::new()));
    }
}
