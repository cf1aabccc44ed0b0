//! Configuration types.
//!
//! Everything is read from the environment once at startup. A `.env` file in
//! the working directory is loaded first when present.

use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::ConfigError;

/// The WhatsApp-enabled sender number all messages go out from.
pub const WHATSAPP_FROM: &str = "whatsapp:+14155238886";

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 4200;

/// Default Twilio REST API base URL.
pub const DEFAULT_TWILIO_API_BASE: &str = "https://api.twilio.com";

/// Database connection settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `libsql://…`/`https://…` for a remote database, or a local file path.
    pub url: String,
    pub auth_token: SecretString,
}

/// Twilio account settings.
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: SecretString,
    pub api_base: String,
    /// Sending identity, always [`WHATSAPP_FROM`] outside of tests.
    pub from: String,
}

/// Relay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub database: DatabaseConfig,
    pub twilio: TwilioConfig,
    pub port: u16,
    /// Static page served on `GET /`.
    pub index_html: PathBuf,
}

impl RelayConfig {
    /// Build config from environment variables.
    ///
    /// `DB_URL`, `DB_TOKEN`, `TWILIO_SID` and `TWILIO_AUTH_TOKEN` are required.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String, ConfigError> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
        };

        let database = DatabaseConfig {
            url: required("DB_URL")?,
            auth_token: SecretString::from(required("DB_TOKEN")?),
        };

        let twilio = TwilioConfig {
            account_sid: required("TWILIO_SID")?,
            auth_token: SecretString::from(required("TWILIO_AUTH_TOKEN")?),
            api_base: lookup("TWILIO_API_BASE")
                .unwrap_or_else(|| DEFAULT_TWILIO_API_BASE.to_string()),
            from: WHATSAPP_FROM.to_string(),
        };

        let port = match lookup("RELAY_PORT") {
            Some(raw) => raw.parse().map_err(|e| ConfigError::InvalidValue {
                key: "RELAY_PORT".into(),
                message: format!("{e}"),
            })?,
            None => DEFAULT_PORT,
        };

        let index_html = lookup("RELAY_INDEX_HTML")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("index.html"));

        Ok(Self {
            database,
            twilio,
            port,
            index_html,
        })
    }
}
