//! Inbound reply handling: persist, classify, acknowledge.

use std::sync::Arc;

use tracing::info;

use crate::classify::{self, Classification};
use crate::error::WebhookError;
use crate::provider::{MessageSender, OutboundMessage};
use crate::store::ReplyStore;

/// What happened to a handled reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyOutcome {
    pub classification: Classification,
    pub acknowledgement: &'static str,
}

/// Records replies and acknowledges them.
pub struct ReplyHandler {
    store: Arc<dyn ReplyStore>,
    sender: Arc<dyn MessageSender>,
    from: String,
}

impl ReplyHandler {
    pub fn new(
        store: Arc<dyn ReplyStore>,
        sender: Arc<dyn MessageSender>,
        from: impl Into<String>,
    ) -> Self {
        Self {
            store,
            sender,
            from: from.into(),
        }
    }

    /// Persist the reply, then send an acknowledgement back to `sender`.
    ///
    /// The record is written before anything else and is kept even when the
    /// acknowledgement fails. A failed write means no acknowledgement is sent.
    pub async fn handle_inbound_reply(
        &self,
        sender: &str,
        body: &str,
    ) -> Result<ReplyOutcome, WebhookError> {
        let normalized = classify::normalize_body(body);
        self.store.insert_reply(sender, &normalized).await?;

        let classification = classify::classify(&normalized);
        let acknowledgement = classification.acknowledgement();
        info!(sender = sender, %classification, "Reply recorded");

        self.sender
            .send(&OutboundMessage {
                from: self.from.clone(),
                to: sender.to_string(),
                body: acknowledgement.to_string(),
            })
            .await?;

        Ok(ReplyOutcome {
            classification,
            acknowledgement,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;

    use super::*;
    use crate::alert::tests::StubSender;
    use crate::config::WHATSAPP_FROM;
    use crate::error::{DatabaseError, ProviderError};
    use crate::store::ReplyRecord;

    /// In-memory store that can be told to fail writes or reads.
    #[derive(Default)]
    pub(crate) struct MemoryStore {
        pub rows: Mutex<Vec<(String, String)>>,
        pub fail_writes: bool,
        pub fail_reads: bool,
    }

    #[async_trait]
    impl ReplyStore for MemoryStore {
        async fn insert_reply(&self, user: &str, message: &str) -> Result<(), DatabaseError> {
            if self.fail_writes {
                return Err(DatabaseError::Query("insert_reply: disk full".into()));
            }
            self.rows
                .lock()
                .unwrap()
                .push((user.to_string(), message.to_string()));
            Ok(())
        }

        async fn list_replies(&self) -> Result<Vec<ReplyRecord>, DatabaseError> {
            if self.fail_reads {
                return Err(DatabaseError::Query("list_replies: connection lost".into()));
            }
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .iter()
                .enumerate()
                .rev()
                .map(|(i, (user, message))| ReplyRecord {
                    id: i as i64 + 1,
                    user: user.clone(),
                    message: message.clone(),
                    created_at: Some(Utc::now()),
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn yes_reply_is_recorded_then_acknowledged() {
        let store = Arc::new(MemoryStore::default());
        let stub = StubSender::ok();
        let handler = ReplyHandler::new(store.clone(), stub.clone(), WHATSAPP_FROM);

        let outcome = handler
            .handle_inbound_reply("+12025550123", "Yes I confirm")
            .await
            .unwrap();
        assert_eq!(outcome.classification, Classification::Yes);

        assert_eq!(
            *store.rows.lock().unwrap(),
            vec![("+12025550123".to_string(), "yes i confirm".to_string())]
        );
        let sent = stub.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "+12025550123");
        assert_eq!(sent[0].from, WHATSAPP_FROM);
        assert_eq!(sent[0].body, "✅ Noted: YES");
    }

    #[tokio::test]
    async fn acknowledgement_follows_classification() {
        let cases = [
            ("  NO  ", "❌ Noted: NO"),
            ("maybe later", "Got it. Thanks!"),
            ("no... yes", "✅ Noted: YES"),
        ];
        for (body, ack) in cases {
            let stub = StubSender::ok();
            let handler =
                ReplyHandler::new(Arc::new(MemoryStore::default()), stub.clone(), WHATSAPP_FROM);
            handler
                .handle_inbound_reply("whatsapp:+447911123456", body)
                .await
                .unwrap();
            assert_eq!(stub.sent()[0].body, ack, "{body:?}");
            assert_eq!(stub.sent()[0].to, "whatsapp:+447911123456");
        }
    }

    #[tokio::test]
    async fn persistence_failure_skips_acknowledgement() {
        let store = Arc::new(MemoryStore {
            fail_writes: true,
            ..Default::default()
        });
        let stub = StubSender::ok();
        let handler = ReplyHandler::new(store, stub.clone(), WHATSAPP_FROM);

        let err = handler
            .handle_inbound_reply("+12025550123", "yes")
            .await
            .unwrap_err();
        assert!(matches!(err, WebhookError::Persistence(_)));
        assert!(stub.sent().is_empty());
    }

    #[tokio::test]
    async fn send_failure_keeps_record() {
        let store = Arc::new(MemoryStore::default());
        let stub = StubSender::failing(ProviderError::transport("connection reset"));
        let handler = ReplyHandler::new(store.clone(), stub.clone(), WHATSAPP_FROM);

        let err = handler
            .handle_inbound_reply("+12025550123", "No")
            .await
            .unwrap_err();
        assert!(matches!(err, WebhookError::Acknowledgement(_)));
        assert_eq!(store.rows.lock().unwrap().len(), 1);
        assert_eq!(stub.sent().len(), 1);
    }
}
