use std::sync::Arc;

use secrecy::ExposeSecret;

use whatsapp_relay::alert::AlertDispatcher;
use whatsapp_relay::config::RelayConfig;
use whatsapp_relay::error::Result;
use whatsapp_relay::provider::{MessageSender, TwilioClient};
use whatsapp_relay::server::{AppState, relay_routes};
use whatsapp_relay::store::{LibSqlBackend, ReplyStore};
use whatsapp_relay::webhook::ReplyHandler;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // Install rustls crypto provider before any TLS usage
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        tracing::warn!("A rustls crypto provider was already installed; keeping it");
    }

    let config = match RelayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("  Required: DB_URL, DB_TOKEN, TWILIO_SID, TWILIO_AUTH_TOKEN");
            return Err(e.into());
        }
    };

    eprintln!("📨 WhatsApp Relay v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   From: {}", config.twilio.from);
    eprintln!("   Page: {}", config.index_html.display());

    // ── Database ─────────────────────────────────────────────────────────
    let store: Arc<dyn ReplyStore> = Arc::new(
        LibSqlBackend::open(
            &config.database.url,
            config.database.auth_token.expose_secret(),
        )
        .await?,
    );
    eprintln!("   Database: connected");

    // ── Provider ─────────────────────────────────────────────────────────
    let sender: Arc<dyn MessageSender> = Arc::new(TwilioClient::new(&config.twilio));

    let state = AppState {
        alerts: Arc::new(AlertDispatcher::new(
            Arc::clone(&sender),
            config.twilio.from.clone(),
        )),
        replies: Arc::new(ReplyHandler::new(
            Arc::clone(&store),
            Arc::clone(&sender),
            config.twilio.from.clone(),
        )),
        store,
    };
    let app = relay_routes(state, config.index_html.clone());

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    eprintln!("   Server is running on http://localhost:{}\n", config.port);
    tracing::info!(port = config.port, "Relay server started");
    axum::serve(listener, app).await?;

    Ok(())
}
