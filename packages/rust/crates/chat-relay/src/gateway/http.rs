//! HTTP gateway: POST /chat → relay turn → JSON response.
//!
//! Request validation (400 for malformed JSON, empty session_id or prompt), 500 on
//! store or completion failure.

use anyhow::Result;
use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::ResponseFormat;
use crate::error::RelayError;
use crate::relay::Relay;
use crate::session::ChatMessage;

/// Request body for POST /chat.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Opaque caller-supplied conversation key.
    pub session_id: String,
    /// User prompt appended to the session.
    pub prompt: String,
}

/// Response body for GET /chat/{session_id}.
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub session_id: String,
    pub messages: Vec<ChatMessage>,
}

/// Response body for gateway health endpoint.
#[derive(Debug, Serialize)]
pub struct GatewayHealthResponse {
    pub status: &'static str,
    pub backend: &'static str,
    pub model: String,
    pub completion_timeout_secs: u64,
    pub response_format: &'static str,
}

/// Shared state for the HTTP server.
#[derive(Clone)]
pub struct GatewayState {
    pub relay: Arc<Relay>,
}

/// Validate request body; returns error for a blank session_id or prompt.
/// Values pass through unchanged: the session id is opaque and the prompt is stored as sent.
pub fn validate_chat_request(body: &ChatRequest) -> Result<(String, String), RelayError> {
    let session_id = validate_session_id(&body.session_id)?;
    if body.prompt.trim().is_empty() {
        return Err(RelayError::BadRequest("prompt must be non-empty".to_string()));
    }
    Ok((session_id, body.prompt.clone()))
}

fn validate_session_id(raw: &str) -> Result<String, RelayError> {
    if raw.trim().is_empty() {
        return Err(RelayError::BadRequest(
            "session_id must be non-empty".to_string(),
        ));
    }
    Ok(raw.to_string())
}

async fn handle_chat(
    State(state): State<GatewayState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, RelayError> {
    let Json(body) = body.map_err(|rejection| {
        RelayError::BadRequest(format!("invalid input: {}", rejection.body_text()))
    })?;
    let (session_id, prompt) = validate_chat_request(&body)?;
    let reply = state.relay.run_turn(&session_id, &prompt).await?;
    let response = match state.relay.response_format() {
        ResponseFormat::Completion => Json(reply.payload).into_response(),
        ResponseFormat::Message => Json(reply.message).into_response(),
    };
    Ok(response)
}

async fn handle_history(
    State(state): State<GatewayState>,
    Path(session_id): Path<String>,
) -> Result<Json<HistoryResponse>, RelayError> {
    let session_id = validate_session_id(&session_id)?;
    let messages = state.relay.history(&session_id).await?;
    Ok(Json(HistoryResponse {
        session_id,
        messages,
    }))
}

async fn handle_reset(
    State(state): State<GatewayState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, RelayError> {
    let session_id = validate_session_id(&session_id)?;
    state.relay.reset(&session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn handle_health(State(state): State<GatewayState>) -> Json<GatewayHealthResponse> {
    let relay = &state.relay;
    Json(GatewayHealthResponse {
        status: "healthy",
        backend: relay.store().backend_name(),
        model: relay.client().model().to_string(),
        completion_timeout_secs: relay.client().timeout().as_secs(),
        response_format: relay.response_format().as_str(),
    })
}

/// Build the gateway router.
pub fn router(relay: Relay) -> Router {
    let state = GatewayState {
        relay: Arc::new(relay),
    };
    Router::new()
        .route("/health", get(handle_health))
        .route("/chat", post(handle_chat))
        .route(
            "/chat/{session_id}",
            get(handle_history).delete(handle_reset),
        )
        .with_state(state)
}

/// Run the HTTP server; binds to `bind_addr` (e.g. `0.0.0.0:8080`).
/// Graceful shutdown on Ctrl+C (SIGINT) and SIGTERM (Unix); in-flight requests complete before exit.
pub async fn run_http(relay: Relay, bind_addr: &str) -> Result<()> {
    let model = relay.client().model().to_string();
    let backend = relay.store().backend_name();
    let app = router(relay);
    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!(
        "gateway listening on {} (model={}, backend={}, Ctrl+C/SIGTERM to stop)",
        bind_addr,
        model,
        backend
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let ctrl_c = tokio::signal::ctrl_c();
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(error) => {
                tracing::warn!(error = %error, "failed to listen for SIGTERM; Ctrl+C only");
                let _ = ctrl_c.await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %error, "failed to listen for Ctrl+C");
        }
    }
}
