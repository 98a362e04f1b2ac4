//! SQLite counter store - rate windows shared between processes
//!
//! Admission is one `INSERT .. ON CONFLICT DO UPDATE .. WHERE .. RETURNING`
//! statement. SQLite serializes writers, so the reset-or-increment decision
//! and the write happen together. A refused request updates nothing and
//! returns no row.

use std::{path::Path, str::FromStr, time::Duration};

use application::{
    error::ApplicationError,
    ports::{CounterStorePort, IncrementOutcome, IncrementRequest},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::RateWindow;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use tracing::{debug, info, instrument};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS rate_windows (
    key             TEXT PRIMARY KEY NOT NULL,
    window_start_ms INTEGER NOT NULL,
    request_count   INTEGER NOT NULL,
    expires_at_ms   INTEGER NOT NULL
)";

// ?1 key, ?2 now, ?3 expiry of a fresh window, ?4 window length, ?5 max
const CONDITIONAL_INCREMENT: &str = "INSERT INTO rate_windows
    (key, window_start_ms, request_count, expires_at_ms)
VALUES (?1, ?2, 1, ?3)
ON CONFLICT(key) DO UPDATE SET
    window_start_ms = CASE WHEN ?2 - window_start_ms >= ?4 THEN ?2 ELSE window_start_ms END,
    request_count   = CASE WHEN ?2 - window_start_ms >= ?4 THEN 1 ELSE request_count + 1 END,
    expires_at_ms   = CASE WHEN ?2 - window_start_ms >= ?4 THEN ?3 ELSE expires_at_ms END
WHERE ?2 - rate_windows.window_start_ms >= ?4 OR rate_windows.request_count < ?5
RETURNING window_start_ms, request_count, expires_at_ms";

const SELECT_WINDOW: &str =
    "SELECT window_start_ms, request_count, expires_at_ms FROM rate_windows WHERE key = ?1";

type WindowRow = (i64, i64, i64);

/// Counter store backed by a SQLite file
#[derive(Debug, Clone)]
pub struct SqliteCounterStore {
    pool: SqlitePool,
}

fn store_error(e: sqlx::Error) -> ApplicationError {
    ApplicationError::CounterStore(e.to_string())
}

fn millis(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}

fn to_window((start_ms, count, expires_ms): WindowRow) -> Result<RateWindow, ApplicationError> {
    let at = |ms: i64| {
        DateTime::<Utc>::from_timestamp_millis(ms)
            .ok_or_else(|| ApplicationError::CounterStore(format!("invalid timestamp {ms}")))
    };
    Ok(RateWindow {
        window_start: at(start_ms)?,
        count: u32::try_from(count).unwrap_or(u32::MAX),
        expires_at: at(expires_ms)?,
    })
}

impl SqliteCounterStore {
    /// Open (or create) the database file and ensure the schema exists
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self, ApplicationError> {
        let url = format!("sqlite:{}", path.as_ref().display());
        let options = SqliteConnectOptions::from_str(&url)
            .map_err(store_error)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .min_connections(1)
            .connect_with(options)
            .await
            .map_err(store_error)?;

        let store = Self { pool };
        store.ensure_schema().await?;
        info!("SQLite counter store ready");
        Ok(store)
    }

    /// Single-connection in-memory database for tests
    pub async fn in_memory() -> Result<Self, ApplicationError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(store_error)?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(store_error)?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<(), ApplicationError> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    /// Delete records whose retention has lapsed
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, ApplicationError> {
        let purged = sqlx::query("DELETE FROM rate_windows WHERE expires_at_ms <= ?1")
            .bind(now.timestamp_millis())
            .execute(&self.pool)
            .await
            .map_err(store_error)?
            .rows_affected();
        debug!(purged, "Purged expired rate windows");
        Ok(purged)
    }

    /// Check the database answers queries
    pub async fn ping(&self) -> Result<(), ApplicationError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(())
    }
}

#[async_trait]
impl CounterStorePort for SqliteCounterStore {
    #[instrument(skip_all, fields(key = %request.key), level = "debug")]
    async fn conditional_increment(
        &self,
        request: IncrementRequest,
    ) -> Result<IncrementOutcome, ApplicationError> {
        let fresh = RateWindow::open(request.now, request.window, request.grace);

        let updated: Option<WindowRow> = sqlx::query_as(CONDITIONAL_INCREMENT)
            .bind(&request.key)
            .bind(request.now.timestamp_millis())
            .bind(fresh.expires_at.timestamp_millis())
            .bind(millis(request.window))
            .bind(i64::from(request.max))
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        if let Some(row) = updated {
            return Ok(IncrementOutcome::Accepted(to_window(row)?));
        }

        // Refused: the row exists and was left untouched
        let row: WindowRow = sqlx::query_as(SELECT_WINDOW)
            .bind(&request.key)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(IncrementOutcome::Refused(to_window(row)?))
    }

    async fn read(&self, key: &str) -> Result<Option<RateWindow>, ApplicationError> {
        let row: Option<WindowRow> = sqlx::query_as(SELECT_WINDOW)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        row.map(to_window).transpose()
    }
}
