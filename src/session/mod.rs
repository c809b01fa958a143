//! Voice session management
//!
//! This module provides the `SessionController` that manages:
//! - Credential fetch for a fresh participant identity
//! - The real-time connection lifecycle and microphone enablement
//! - Remote audio binding to the playback sink
//! - Transcript collection for the current session
//! - Status and error reporting to read-only observers

mod binder;
mod connection;
mod controller;
mod handle;
mod identity;
mod state;

pub use binder::{MediaContainer, MediaTrackBinder, PlaybackSink};
pub use connection::SessionConnection;
pub use controller::{ControllerConfig, SessionController};
pub use handle::SessionHandle;
pub use identity::ParticipantIdentityGenerator;
pub use state::{ConnectionNotice, ConnectionState, SessionSnapshot, SessionStatus};
