//! `ReplyStore` trait — async interface for reply persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::DatabaseError;

/// A persisted inbound reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyRecord {
    pub id: i64,
    /// Sender address as delivered by the provider.
    pub user: String,
    /// Normalized reply body.
    pub message: String,
    /// `None` when the stored value is NULL or not a recognizable timestamp.
    pub created_at: Option<DateTime<Utc>>,
}

/// Append-only store of inbound replies.
#[async_trait]
pub trait ReplyStore: Send + Sync {
    /// Record a reply. `created_at` is assigned by the store.
    async fn insert_reply(&self, user: &str, message: &str) -> Result<(), DatabaseError>;

    /// All replies, most recently created first.
    async fn list_replies(&self) -> Result<Vec<ReplyRecord>, DatabaseError>;
}
