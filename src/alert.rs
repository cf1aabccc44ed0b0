//! Alert dispatch: validate the destination, send once, map the outcome.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{AlertError, ProviderError};
use crate::phone;
use crate::provider::{MessageSender, OutboundMessage};

/// Body sent when the caller does not supply one.
pub const DEFAULT_ALERT_BODY: &str = "⚠️ Alert: Please respond YES or NO";

/// Fallback reason when the provider gives us nothing usable.
pub const GENERIC_DELIVERY_REASON: &str = "Failed to send alert";

/// Provider error codes with a user-facing explanation.
static PROVIDER_ERROR_REASONS: &[(i64, &str)] = &[
    (21211, "Invalid phone number"),
    (63003, "Phone number is not a valid WhatsApp number"),
    (21408, "Permission to send messages to this number is required"),
];

/// Successful alert send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertSent {
    pub status: &'static str,
    /// The normalized number the message actually went to.
    pub to: String,
}

/// Map a provider failure to the reason shown to the caller.
pub fn delivery_reason(err: &ProviderError) -> String {
    if let Some(code) = err.code {
        if let Some((_, reason)) = PROVIDER_ERROR_REASONS.iter().find(|(c, _)| *c == code) {
            return (*reason).to_string();
        }
    }
    match err.message.as_deref() {
        Some(msg) if !msg.is_empty() => msg.to_string(),
        _ => GENERIC_DELIVERY_REASON.to_string(),
    }
}

/// Sends alerts to validated destinations.
pub struct AlertDispatcher {
    sender: Arc<dyn MessageSender>,
    from: String,
}

impl AlertDispatcher {
    pub fn new(sender: Arc<dyn MessageSender>, from: impl Into<String>) -> Self {
        Self {
            sender,
            from: from.into(),
        }
    }

    /// Validate `destination` and send one alert to it.
    ///
    /// A blank `message_body` falls back to [`DEFAULT_ALERT_BODY`].
    pub async fn send_alert(
        &self,
        destination: Option<&str>,
        message_body: Option<&str>,
    ) -> Result<AlertSent, AlertError> {
        let to = phone::validate(destination)
            .into_result()
            .map_err(AlertError::Validation)?;

        let body = message_body
            .filter(|b| !b.trim().is_empty())
            .unwrap_or(DEFAULT_ALERT_BODY);

        let message = OutboundMessage {
            from: self.from.clone(),
            to: to.clone(),
            body: body.to_string(),
        };

        match self.sender.send(&message).await {
            Ok(receipt) => {
                info!(
                    to = %to,
                    sid = %receipt.sid,
                    provider = self.sender.name(),
                    "Alert sent"
                );
                Ok(AlertSent { status: "sent", to })
            }
            Err(e) => {
                warn!(to = %to, code = ?e.code, error = %e, "Error sending alert");
                Err(AlertError::Delivery(delivery_reason(&e)))
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::config::WHATSAPP_FROM;
    use crate::provider::MessageReceipt;

    /// Records every send and answers with a canned result.
    pub(crate) struct StubSender {
        pub sent: Mutex<Vec<OutboundMessage>>,
        pub fail_with: Option<ProviderError>,
    }

    impl StubSender {
        pub(crate) fn ok() -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                fail_with: None,
            })
        }

        pub(crate) fn failing(err: ProviderError) -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                fail_with: Some(err),
            })
        }

        pub(crate) fn sent(&self) -> Vec<OutboundMessage> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MessageSender for StubSender {
        fn name(&self) -> &str {
            "stub"
        }

        async fn send(&self, message: &OutboundMessage) -> Result<MessageReceipt, ProviderError> {
            self.sent.lock().unwrap().push(message.clone());
            match &self.fail_with {
                Some(err) => Err(err.clone()),
                None => Ok(MessageReceipt {
                    sid: "SM0001".into(),
                    status: Some("queued".into()),
                }),
            }
        }
    }

    fn provider_error(code: Option<i64>, message: Option<&str>) -> ProviderError {
        ProviderError {
            code,
            message: message.map(String::from),
            status: Some(400),
        }
    }

    #[tokio::test]
    async fn sends_default_body_to_normalized_number() {
        let stub = StubSender::ok();
        let dispatcher = AlertDispatcher::new(stub.clone(), WHATSAPP_FROM);

        let sent = dispatcher.send_alert(Some("+12025550123"), None).await.unwrap();
        assert_eq!(
            sent,
            AlertSent {
                status: "sent",
                to: "+12025550123".into()
            }
        );

        let messages = stub.sent();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].to, "+12025550123");
        assert_eq!(messages[0].from, WHATSAPP_FROM);
        assert_eq!(messages[0].body, DEFAULT_ALERT_BODY);
    }

    #[tokio::test]
    async fn formatted_number_is_sent_stripped() {
        let stub = StubSender::ok();
        let dispatcher = AlertDispatcher::new(stub.clone(), WHATSAPP_FROM);

        let sent = dispatcher
            .send_alert(Some("+1 (202) 555-0123"), Some("Server down, ack?"))
            .await
            .unwrap();
        assert_eq!(sent.to, "+12025550123");
        assert_eq!(stub.sent()[0].to, "+12025550123");
        assert_eq!(stub.sent()[0].body, "Server down, ack?");
    }

    #[tokio::test]
    async fn blank_custom_body_uses_default() {
        let stub = StubSender::ok();
        let dispatcher = AlertDispatcher::new(stub.clone(), WHATSAPP_FROM);
        dispatcher.send_alert(Some("+12025550123"), Some("  ")).await.unwrap();
        assert_eq!(stub.sent()[0].body, DEFAULT_ALERT_BODY);
    }

    #[tokio::test]
    async fn invalid_number_never_reaches_provider() {
        let stub = StubSender::ok();
        let dispatcher = AlertDispatcher::new(stub.clone(), WHATSAPP_FROM);

        let err = dispatcher.send_alert(Some("12025550123"), None).await.unwrap_err();
        assert_eq!(err, AlertError::Validation(phone::COUNTRY_CODE_REASON.into()));
        assert!(stub.sent().is_empty());

        let err = dispatcher.send_alert(None, None).await.unwrap_err();
        assert_eq!(err, AlertError::Validation(phone::REQUIRED_REASON.into()));
        assert!(stub.sent().is_empty());
    }

    #[tokio::test]
    async fn known_provider_code_is_mapped() {
        let stub = StubSender::failing(provider_error(Some(63003), Some("Channel could not find To")));
        let dispatcher = AlertDispatcher::new(stub.clone(), WHATSAPP_FROM);

        let err = dispatcher.send_alert(Some("+12025550123"), None).await.unwrap_err();
        assert_eq!(
            err,
            AlertError::Delivery("Phone number is not a valid WhatsApp number".into())
        );
        assert_eq!(stub.sent().len(), 1);
    }

    #[test]
    fn delivery_reason_table() {
        assert_eq!(
            delivery_reason(&provider_error(Some(21211), None)),
            "Invalid phone number"
        );
        assert_eq!(
            delivery_reason(&provider_error(Some(21408), Some("ignored"))),
            "Permission to send messages to this number is required"
        );
        assert_eq!(
            delivery_reason(&provider_error(Some(20003), Some("Authenticate"))),
            "Authenticate"
        );
        assert_eq!(
            delivery_reason(&provider_error(None, None)),
            GENERIC_DELIVERY_REASON
        );
        assert_eq!(
            delivery_reason(&provider_error(Some(99999), Some(""))),
            GENERIC_DELIVERY_REASON
        );
    }
}
