//! Twilio Messages API client for WhatsApp.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{MessageReceipt, MessageSender, OutboundMessage};
use crate::config::TwilioConfig;
use crate::error::ProviderError;

const WHATSAPP_PREFIX: &str = "whatsapp:";

/// Error body returned by the Twilio REST API.
#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    code: Option<i64>,
    message: Option<String>,
}

/// Sends WhatsApp messages via `POST /Accounts/{sid}/Messages.json`.
pub struct TwilioClient {
    account_sid: String,
    auth_token: SecretString,
    api_base: String,
    client: reqwest::Client,
}

impl TwilioClient {
    pub fn new(config: &TwilioConfig) -> Self {
        Self {
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, self.account_sid
        )
    }
}

/// Address a number on the WhatsApp channel, leaving already-prefixed input alone.
pub fn whatsapp_address(number: &str) -> String {
    if number.starts_with(WHATSAPP_PREFIX) {
        number.to_string()
    } else {
        format!("{WHATSAPP_PREFIX}{number}")
    }
}

/// Decode a non-success Twilio response body.
fn parse_error(status: u16, body: &str) -> ProviderError {
    match serde_json::from_str::<TwilioErrorBody>(body) {
        Ok(err) => ProviderError {
            code: err.code,
            message: err.message,
            status: Some(status),
        },
        Err(_) => ProviderError {
            code: None,
            message: (!body.trim().is_empty()).then(|| body.trim().to_string()),
            status: Some(status),
        },
    }
}

/// Decode a 2xx response body. An undecodable body still counts as sent.
fn parse_receipt(body: &str) -> MessageReceipt {
    match serde_json::from_str(body) {
        Ok(receipt) => receipt,
        Err(e) => {
            warn!(error = %e, "Twilio accepted message but the receipt could not be decoded");
            MessageReceipt::default()
        }
    }
}

#[async_trait]
impl MessageSender for TwilioClient {
    fn name(&self) -> &str {
        "twilio"
    }

    async fn send(&self, message: &OutboundMessage) -> Result<MessageReceipt, ProviderError> {
        let from = whatsapp_address(&message.from);
        let to = whatsapp_address(&message.to);

        let resp = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .form(&[
                ("From", from.as_str()),
                ("To", to.as_str()),
                ("Body", message.body.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::transport(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ProviderError::transport(e.to_string()))?;

        if !status.is_success() {
            return Err(parse_error(status.as_u16(), &text));
        }

        let receipt = parse_receipt(&text);
        debug!(sid = %receipt.sid, to = %to, "Twilio accepted message");
        Ok(receipt)
    }
}
