//! HTTP API for a rendering client
//!
//! This module exposes the session's read-only view and its two commands:
//! - POST /session/connect - Start a session
//! - POST /session/disconnect - End the session
//! - GET /session - Query status and last error
//! - GET /session/transcript - Get the ordered transcript
//! - GET /health - Health check

mod handlers;
mod routes;
mod server;
mod state;

pub use handlers::{ErrorResponse, StatusResponse};
pub use routes::create_router;
pub use server::{serve, shutdown_signal};
pub use state::AppState;
