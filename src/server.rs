//! HTTP routes for alerts, provider webhooks and stored replies.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::{
        State,
        rejection::{FormRejection, JsonRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeFile;
use tracing::{error, warn};

use crate::alert::AlertDispatcher;
use crate::error::{AlertError, WebhookError};
use crate::store::ReplyStore;
use crate::webhook::ReplyHandler;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub alerts: Arc<AlertDispatcher>,
    pub replies: Arc<ReplyHandler>,
    pub store: Arc<dyn ReplyStore>,
}

/// `POST /alert` body.
#[derive(Debug, Deserialize)]
pub struct AlertRequest {
    pub to: Option<String>,
    pub message: Option<String>,
}

/// `POST /whatsapp-webhook` form fields, named as the provider sends them.
#[derive(Debug, Deserialize)]
pub struct WebhookForm {
    #[serde(rename = "From")]
    pub from: Option<String>,
    #[serde(rename = "Body")]
    pub body: Option<String>,
}

/// Build the relay router. `index_html` is served on `GET /`.
pub fn relay_routes(state: AppState, index_html: PathBuf) -> Router {
    Router::new()
        .route_service("/", ServeFile::new(index_html))
        .route("/health", get(health))
        .route("/alert", post(send_alert))
        .route("/whatsapp-webhook", post(whatsapp_webhook))
        .route("/responses", get(list_responses))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn error_body(status: StatusCode, message: &str) -> axum::response::Response {
    (
        status,
        Json(serde_json::json!({
            "status": "error",
            "message": message,
        })),
    )
        .into_response()
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "whatsapp-relay"
    }))
}

// ── Alerts ──────────────────────────────────────────────────────────────

async fn send_alert(
    State(state): State<AppState>,
    payload: Result<Json<AlertRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(rejection) => {
            warn!(error = %rejection, "Rejected alert request body");
            return error_body(StatusCode::BAD_REQUEST, &rejection.body_text());
        }
    };

    match state
        .alerts
        .send_alert(req.to.as_deref(), req.message.as_deref())
        .await
    {
        Ok(sent) => Json(sent).into_response(),
        Err(e @ AlertError::Validation(_)) => error_body(StatusCode::BAD_REQUEST, e.reason()),
        Err(e @ AlertError::Delivery(_)) => {
            error_body(StatusCode::INTERNAL_SERVER_ERROR, e.reason())
        }
    }
}

// ── Webhook ─────────────────────────────────────────────────────────────

/// Always answers `200 ok` so the provider does not redeliver; failures are
/// only visible in the logs.
async fn whatsapp_webhook(
    State(state): State<AppState>,
    payload: Result<Form<WebhookForm>, FormRejection>,
) -> impl IntoResponse {
    let Form(form) = match payload {
        Ok(p) => p,
        Err(rejection) => {
            warn!(error = %rejection, "Rejected webhook callback body");
            return (StatusCode::OK, "ok");
        }
    };
    let Some(from) = form.from.filter(|f| !f.trim().is_empty()) else {
        warn!("Webhook callback without a From field, ignoring");
        return (StatusCode::OK, "ok");
    };
    let body = form.body.unwrap_or_default();

    match state.replies.handle_inbound_reply(&from, &body).await {
        Ok(_) => {}
        Err(WebhookError::Persistence(e)) => {
            error!(sender = %from, error = %e, "Failed to persist inbound reply");
        }
        Err(WebhookError::Acknowledgement(e)) => {
            warn!(sender = %from, code = ?e.code, error = %e, "Reply stored but acknowledgement failed");
        }
    }

    (StatusCode::OK, "ok")
}

// ── Responses ───────────────────────────────────────────────────────────

async fn list_responses(State(state): State<AppState>) -> axum::response::Response {
    match state.store.list_replies().await {
        Ok(replies) => Json(replies).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to list replies");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load responses")
        }
    }
}
