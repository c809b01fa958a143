use super::state::AppState;
use crate::session::{SessionSnapshot, SessionStatus};
use crate::transcript::TranscriptEntry;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: SessionStatus,
    pub status_text: String,
    pub is_connected: bool,
    pub is_connecting: bool,
    pub error: Option<String>,
    pub participant_identity: Option<String>,
    pub audio_track: Option<String>,
}

impl From<SessionSnapshot> for StatusResponse {
    fn from(snapshot: SessionSnapshot) -> Self {
        Self {
            status: snapshot.status,
            status_text: snapshot.status_text,
            is_connected: snapshot.is_connected,
            is_connecting: snapshot.is_connecting,
            error: snapshot.error,
            participant_identity: snapshot.participant_identity,
            audio_track: snapshot.audio_track,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /session/connect
/// Start a session (no-op while one is connecting or connected)
pub async fn connect(State(state): State<AppState>) -> impl IntoResponse {
    info!("Connect requested");

    match state.session.connect().await {
        Ok(()) => (
            StatusCode::OK,
            Json(StatusResponse::from(state.session.snapshot())),
        )
            .into_response(),
        Err(e) => {
            warn!("Connect failed: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// POST /session/disconnect
/// End the session (no-op when there is none)
pub async fn disconnect(State(state): State<AppState>) -> impl IntoResponse {
    info!("Disconnect requested");

    state.session.disconnect().await;

    (
        StatusCode::OK,
        Json(StatusResponse::from(state.session.snapshot())),
    )
}

/// GET /session
/// Get current status and last error
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(StatusResponse::from(state.session.snapshot())),
    )
}

/// GET /session/transcript
/// Get the transcript of the current (or last) session
pub async fn get_transcript(State(state): State<AppState>) -> impl IntoResponse {
    let transcript: Vec<TranscriptEntry> = state.session.snapshot().transcript;
    (StatusCode::OK, Json(transcript))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
