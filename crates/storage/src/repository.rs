//! Repository Implementation

use crate::filter::{ReadingFilter, SortOrder};
use crate::timestamp::Timestamp;
use crate::StorageError;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// One stored reading, exactly as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Reading {
    pub id: i64,
    /// Canonical `YYYY-MM-DD HH:MM:SS`
    pub timestamp: String,
    /// Water height (m)
    pub height: f64,
    /// Flow rate (m³/s)
    pub flow: f64,
}

impl Reading {
    /// Parse the stored timestamp. Failure means the row is corrupt.
    pub fn parsed_timestamp(&self) -> Result<Timestamp, StorageError> {
        Timestamp::parse_canonical(&self.timestamp)
    }
}

/// Result of an insert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InsertOutcome {
    /// A new row was written
    Inserted { id: i64 },
    /// A reading with the same timestamp already exists; nothing was written
    Duplicate,
}

const CREATE_READINGS: &str = r#"
    CREATE TABLE IF NOT EXISTS readings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp TEXT NOT NULL UNIQUE,
        height REAL NOT NULL,
        flow REAL NOT NULL
    )
"#;

/// Repository for the `readings` table
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Open (or create) the SQLite database at `path`
    pub async fn open(path: impl AsRef<Path>, max_connections: u32) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::DatabaseError(format!("Cannot create {}: {}", parent.display(), e))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await
            .map_err(|e| StorageError::DatabaseError(format!("Connection failed: {}", e)))?;

        info!(path = %path.display(), "Opened readings database");
        Ok(Self { pool })
    }

    /// Open a private in-memory database.
    ///
    /// Every connection to `:memory:` is a separate database, so the pool is
    /// pinned to a single connection that is never recycled.
    pub async fn in_memory() -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::new()
            .filename(":memory:")
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::DatabaseError(format!("Connection failed: {}", e)))?;

        debug!("Opened in-memory readings database");
        Ok(Self { pool })
    }

    /// Create the `readings` table if it does not exist
    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        sqlx::query(CREATE_READINGS)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::SchemaError(format!("Create readings failed: {}", e)))?;

        debug!("Schema ready");
        Ok(())
    }

    /// Insert a reading; `timestamp` defaults to now.
    ///
    /// A timestamp that is already stored yields [`InsertOutcome::Duplicate`].
    #[instrument(skip(self))]
    pub async fn insert(
        &self,
        height: f64,
        flow: f64,
        timestamp: Option<Timestamp>,
    ) -> Result<InsertOutcome, StorageError> {
        let timestamp = timestamp.unwrap_or_else(Timestamp::now);

        let result = sqlx::query(
            "INSERT INTO readings (timestamp, height, flow) VALUES (?, ?, ?) \
             ON CONFLICT(timestamp) DO NOTHING",
        )
        .bind(timestamp.canonical())
        .bind(height)
        .bind(flow)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::DatabaseError(format!("Insert failed: {}", e)))?;

        if result.rows_affected() == 0 {
            debug!(%timestamp, "Reading already exists, ignoring");
            return Ok(InsertOutcome::Duplicate);
        }

        let id = result.last_insert_rowid();
        debug!(id, %timestamp, "Inserted reading");
        Ok(InsertOutcome::Inserted { id })
    }

    /// Readings matching `filter` in the filter's default order
    pub async fn query(&self, filter: &ReadingFilter) -> Result<Vec<Reading>, StorageError> {
        self.query_ordered(filter, filter.default_order()).await
    }

    /// Readings matching `filter` in an explicit order
    #[instrument(skip(self))]
    pub async fn query_ordered(
        &self,
        filter: &ReadingFilter,
        order: SortOrder,
    ) -> Result<Vec<Reading>, StorageError> {
        let (sql, binds) = filter.to_sql(order)?;

        let mut query = sqlx::query_as::<_, Reading>(&sql);
        for value in binds {
            query = query.bind(value);
        }

        let readings = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::DatabaseError(format!("Query failed: {}", e)))?;

        if readings.is_empty() {
            debug!("No readings matched");
        }
        Ok(readings)
    }

    /// Total number of stored readings
    pub async fn count(&self) -> Result<i64, StorageError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM readings")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StorageError::DatabaseError(format!("Query failed: {}", e)))
    }

    /// Close the pool, waiting for connections to be returned
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
