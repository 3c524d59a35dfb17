//! Notes HTTP API.
//!
//! - POST /api/generate-notes
//! - GET /health

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::sse::{KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use uuid::Uuid;

use crate::config::Config;
use crate::notes::prompt::build_messages;
use crate::notes::request::{NotesRequest, ValidationError};
use crate::server::streaming::{notes_to_sse_stream, NotesRelay, GENERIC_FAILURE};
use crate::upstream::client::{ChatCompletionRequest, CompletionClient, UpstreamError};

/// Application state shared across handlers.
pub struct AppState {
    pub client: Arc<dyn CompletionClient>,
    pub config: Arc<Config>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(client: Arc<dyn CompletionClient>, config: Arc<Config>) -> Self {
        Self {
            client,
            config,
            start_time: Instant::now(),
        }
    }
}

/// Build the axum router with all API routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = state.config.server.cors;
    let router = Router::new()
        .route("/api/generate-notes", post(generate_notes))
        .route("/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

// ─── Errors ────────────────────────────────────────────────────────────────

/// Failures that are answered with a plain JSON error instead of a stream.
#[derive(Error, Debug)]
pub enum NotesError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to generate notes: {0}")]
    Upstream(#[from] UpstreamError),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for NotesError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            Self::Upstream(_) => (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE.to_string()),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

// ─── Response Types ────────────────────────────────────────────────────────

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub model: String,
}

// ─── Route Handlers ────────────────────────────────────────────────────────

async fn generate_notes(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, NotesError> {
    let request_id = Uuid::new_v4().to_string();

    let request = NotesRequest::parse(&body).inspect_err(|e| {
        info!(request_id = %request_id, reason = %e, "Rejected notes request");
    })?;

    info!(
        request_id = %request_id,
        topic = %request.topic,
        subject = %request.subject,
        "Generate notes request"
    );

    let upstream = &state.config.upstream;
    let completion = ChatCompletionRequest::streaming(
        upstream.model.clone(),
        build_messages(&request),
        upstream.max_completion_tokens,
    );

    // Nothing has been written to the client until the relay is primed, so
    // failures up to here still map to a status code.
    let relay = open_relay(state.client.as_ref(), completion, &request_id)
        .await
        .inspect_err(|e| {
            error!(request_id = %request_id, error = %e, "Error generating notes");
        })?;

    let sse = Sse::new(notes_to_sse_stream(relay.into_events()));
    let connection = [(header::CONNECTION, HeaderValue::from_static("keep-alive"))];

    let response = match state.config.server.sse_keep_alive_secs {
        Some(secs) => {
            let keep_alive = KeepAlive::new().interval(Duration::from_secs(secs));
            (connection, sse.keep_alive(keep_alive)).into_response()
        }
        None => (connection, sse).into_response(),
    };
    Ok(response)
}

async fn open_relay(
    client: &dyn CompletionClient,
    completion: ChatCompletionRequest,
    request_id: &str,
) -> Result<NotesRelay, UpstreamError> {
    let deltas = client.stream_chat(completion).await?;
    let mut relay = NotesRelay::new(request_id, deltas);
    relay.prime().await?;
    Ok(relay)
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        model: state.config.upstream.model.clone(),
    })
}
