//! libSQL backend — async `ReplyStore` implementation.
//!
//! Supports remote (Turso / sqld) databases, local files and in-memory
//! databases. Migrations run on open.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, Value, params};
use tracing::{debug, info};

use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::traits::{ReplyRecord, ReplyStore};

/// `rowid` rather than `id`: hand-provisioned `replies` tables have no `id` column.
const REPLY_COLUMNS: &str = "rowid AS id, user, message, created_at";

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open the database named by `url`.
    ///
    /// `libsql://`, `http(s)://` and `ws(s)://` URLs connect remotely with
    /// `auth_token`. `:memory:` opens an in-memory database. Anything else,
    /// optionally prefixed with `file:`, is a local path.
    pub async fn open(url: &str, auth_token: &str) -> Result<Self, DatabaseError> {
        if is_remote_url(url) {
            Self::new_remote(url, auth_token).await
        } else if url == ":memory:" {
            Self::new_memory().await
        } else {
            Self::new_local(Path::new(url.strip_prefix("file:").unwrap_or(url))).await
        }
    }

    /// Connect to a remote libSQL server.
    pub async fn new_remote(url: &str, auth_token: &str) -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_remote(url.to_string(), auth_token.to_string())
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open remote database: {e}")))?;

        let backend = Self::from_database(db).await?;
        info!(url = url, "Remote database connected");
        Ok(backend)
    }

    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let backend = Self::from_database(db).await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        Self::from_database(db).await
    }

    async fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        migrations::run_migrations(&conn).await?;

        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    /// Get the connection.
    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

fn is_remote_url(url: &str) -> bool {
    ["libsql://", "https://", "http://", "wss://", "ws://"]
        .iter()
        .any(|scheme| url.starts_with(scheme))
}

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // SQLite strftime('%f') output with fractional seconds
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(ndt.and_utc());
    }
    // CURRENT_TIMESTAMP / datetime() output without fractional seconds
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(ndt.and_utc());
    }
    None
}

/// Interpret a `created_at` cell of any storage class.
///
/// Integers are Unix seconds, reals are SQLite Julian day numbers.
fn value_to_datetime(value: Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Text(s) => parse_datetime(&s),
        Value::Integer(secs) => DateTime::from_timestamp(secs, 0),
        Value::Real(julian) => {
            let millis = ((julian - JULIAN_UNIX_EPOCH) * 86_400_000.0).round() as i64;
            DateTime::from_timestamp_millis(millis)
        }
        Value::Null | Value::Blob(_) => None,
    }
}

/// Julian day number of 1970-01-01T00:00:00Z.
const JULIAN_UNIX_EPOCH: f64 = 2_440_587.5;

/// Read a text column without failing on NULL or non-text storage.
fn value_to_text(value: Value) -> String {
    match value {
        Value::Text(s) => s,
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Blob(b) => String::from_utf8_lossy(&b).into_owned(),
        Value::Null => String::new(),
    }
}

/// Map a libsql Row to a ReplyRecord.
///
/// Column order matches REPLY_COLUMNS: 0:id, 1:user, 2:message, 3:created_at
fn row_to_reply(row: &libsql::Row) -> Result<ReplyRecord, libsql::Error> {
    Ok(ReplyRecord {
        id: row.get(0)?,
        user: value_to_text(row.get_value(1)?),
        message: value_to_text(row.get_value(2)?),
        created_at: value_to_datetime(row.get_value(3)?),
    })
}

#[async_trait]
impl ReplyStore for LibSqlBackend {
    async fn insert_reply(&self, user: &str, message: &str) -> Result<(), DatabaseError> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO replies (user, message) VALUES (?1, ?2)",
            params![user, message],
        )
        .await
        .map_err(|e| DatabaseError::Query(format!("insert_reply: {e}")))?;

        debug!(user = user, "Reply inserted into DB");
        Ok(())
    }

    async fn list_replies(&self) -> Result<Vec<ReplyRecord>, DatabaseError> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!("SELECT {REPLY_COLUMNS} FROM replies ORDER BY created_at DESC, rowid DESC"),
                (),
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_replies: {e}")))?;

        let mut replies = Vec::new();
        loop {
            match rows.next().await {
                Ok(Some(row)) => {
                    let reply = row_to_reply(&row)
                        .map_err(|e| DatabaseError::Query(format!("list_replies row: {e}")))?;
                    replies.push(reply);
                }
                Ok(None) => break,
                Err(e) => return Err(DatabaseError::Query(format!("list_replies: {e}"))),
            }
        }
        Ok(replies)
    }
}
