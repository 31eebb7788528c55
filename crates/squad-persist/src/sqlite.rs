//! SQLite memory implementation

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

use squad_core::{ConversationTurn, SessionId, Speaker};

use crate::backend::{Memory, SessionSummary, StorageError};

/// SQLite configuration options
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Database URL (e.g., "sqlite:squad.db?mode=rwc" or "sqlite::memory:")
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Enable WAL journal mode for better concurrency
    pub wal_mode: bool,
    /// Busy timeout in seconds
    pub busy_timeout_secs: u32,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:squad.db?mode=rwc".to_string(),
            max_connections: 5,
            wal_mode: true,
            busy_timeout_secs: 30,
        }
    }
}

impl SqliteConfig {
    /// Create config for in-memory database (testing)
    pub fn memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            // every connection would open its own empty database
            max_connections: 1,
            wal_mode: false,
            busy_timeout_secs: 5,
        }
    }

    /// Create config for a database file, created if missing
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self {
            url: format!("sqlite://{}?mode=rwc", path.as_ref().display()),
            ..Default::default()
        }
    }
}

/// SQLite-backed conversation memory
#[derive(Debug)]
pub struct SqliteMemory {
    pool: SqlitePool,
}

impl SqliteMemory {
    /// Open (and migrate) the database described by `config`
    pub async fn open(config: SqliteConfig) -> Result<Self, StorageError> {
        let mut options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        options = options.pragma("busy_timeout", (config.busy_timeout_secs * 1000).to_string());
        if config.wal_mode {
            options = options.pragma("journal_mode", "WAL");
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        info!(
            url = %config.url,
            wal = config.wal_mode,
            "Connected to SQLite"
        );

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StorageError::Internal(format!("Migration failed: {}", e)))?;

        Ok(Self { pool })
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StorageError::Serialization(format!("bad timestamp {:?}: {}", raw, e)))
}

fn to_db_sequence(sequence: u64) -> Result<i64, StorageError> {
    i64::try_from(sequence)
        .map_err(|_| StorageError::Internal(format!("sequence {} out of range", sequence)))
}

fn turn_from_row(row: &SqliteRow) -> Result<ConversationTurn, StorageError> {
    let session: String = row
        .try_get("session_id")
        .map_err(|e| StorageError::Query(e.to_string()))?;
    let sequence: i64 = row
        .try_get("sequence")
        .map_err(|e| StorageError::Query(e.to_string()))?;
    let user_input: String = row
        .try_get("user_input")
        .map_err(|e| StorageError::Query(e.to_string()))?;
    let responses: String = row
        .try_get("responses")
        .map_err(|e| StorageError::Query(e.to_string()))?;
    let created_at: String = row
        .try_get("created_at")
        .map_err(|e| StorageError::Query(e.to_string()))?;

    let responses: BTreeMap<Speaker, String> =
        serde_json::from_str(&responses).map_err(|e| StorageError::Serialization(e.to_string()))?;

    Ok(ConversationTurn {
        session_id: SessionId::new(session),
        sequence: sequence as u64,
        user_input,
        responses,
        timestamp: decode_timestamp(&created_at)?,
    })
}

#[async_trait]
impl Memory for SqliteMemory {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn is_healthy(&self) -> bool {
        !self.pool.is_closed() && sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    async fn append(&self, turn: &ConversationTurn) -> Result<(), StorageError> {
        let responses = serde_json::to_string(&turn.responses)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let sequence = to_db_sequence(turn.sequence)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let last: Option<i64> =
            sqlx::query_scalar("SELECT MAX(sequence) FROM conversation_turns WHERE session_id = ?")
                .bind(turn.session_id.as_str())
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| StorageError::Query(e.to_string()))?;

        if let Some(last) = last {
            if sequence <= last {
                return Err(StorageError::OutOfOrder {
                    session: turn.session_id.clone(),
                    last: last as u64,
                    attempted: turn.sequence,
                });
            }
        }

        sqlx::query(
            "INSERT INTO conversation_turns \
             (session_id, sequence, user_input, responses, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(turn.session_id.as_str())
        .bind(sequence)
        .bind(&turn.user_input)
        .bind(responses)
        .bind(encode_timestamp(&turn.timestamp))
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Query(e.to_string()))?;

        tx.commit().await.map_err(|e| StorageError::Query(e.to_string()))?;

        debug!(session = %turn.session_id, sequence = turn.sequence, "Turn appended");
        Ok(())
    }

    async fn recent_history(
        &self,
        session: &SessionId,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, StorageError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = sqlx::query(
            "SELECT session_id, sequence, user_input, responses, created_at \
             FROM conversation_turns \
             WHERE session_id = ? ORDER BY sequence DESC LIMIT ?",
        )
        .bind(session.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Query(e.to_string()))?;

        let mut turns = rows.iter().map(turn_from_row).collect::<Result<Vec<_>, _>>()?;
        turns.reverse();
        Ok(turns)
    }

    async fn get_turn(
        &self,
        session: &SessionId,
        sequence: u64,
    ) -> Result<ConversationTurn, StorageError> {
        let row = sqlx::query(
            "SELECT session_id, sequence, user_input, responses, created_at \
             FROM conversation_turns \
             WHERE session_id = ? AND sequence = ?",
        )
        .bind(session.as_str())
        .bind(to_db_sequence(sequence)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Query(e.to_string()))?;

        match row {
            Some(row) => turn_from_row(&row),
            None => Err(StorageError::NotFound(format!(
                "turn {} of session {}",
                sequence, session
            ))),
        }
    }

    async fn next_sequence(&self, session: &SessionId) -> Result<u64, StorageError> {
        let last: Option<i64> =
            sqlx::query_scalar("SELECT MAX(sequence) FROM conversation_turns WHERE session_id = ?")
                .bind(session.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| StorageError::Query(e.to_string()))?;

        Ok(last.map_or(0, |s| s as u64) + 1)
    }

    async fn clear_session(&self, session: &SessionId) -> Result<usize, StorageError> {
        let result = sqlx::query("DELETE FROM conversation_turns WHERE session_id = ?")
            .bind(session.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Query(e.to_string()))?;

        info!(session = %session, removed = result.rows_affected(), "Session cleared");
        Ok(result.rows_affected() as usize)
    }

    async fn sessions(&self) -> Result<Vec<SessionSummary>, StorageError> {
        let rows = sqlx::query(
            "SELECT session_id, COUNT(*) AS turns, MAX(sequence) AS last_sequence, \
             MAX(created_at) AS last_activity \
             FROM conversation_turns GROUP BY session_id \
             ORDER BY last_activity DESC, session_id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Query(e.to_string()))?;

        let mut summaries = Vec::with_capacity(rows.len());
        for row in rows {
            let session: String = row
                .try_get("session_id")
                .map_err(|e| StorageError::Query(e.to_string()))?;
            let turns: i64 = row.try_get("turns").map_err(|e| StorageError::Query(e.to_string()))?;
            let last_sequence: i64 = row
                .try_get("last_sequence")
                .map_err(|e| StorageError::Query(e.to_string()))?;
            let last_activity: String = row
                .try_get("last_activity")
                .map_err(|e| StorageError::Query(e.to_string()))?;

            summaries.push(SessionSummary {
                session: SessionId::new(session),
                turns: turns as usize,
                last_sequence: last_sequence as u64,
                last_activity: decode_timestamp(&last_activity)?,
            });
        }
        Ok(summaries)
    }
}
