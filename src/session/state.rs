use crate::transcript::TranscriptEntry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of the real-time connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Idle,
    Connecting,
    Connected,
    Disconnecting,
    Failed,
}

impl ConnectionState {
    /// Whether `next` is a legal transition from this state
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;

        matches!(
            (self, next),
            (Idle, Connecting)
                | (Connecting, Connected)
                | (Connecting, Failed)
                | (Connecting, Disconnecting)
                | (Connected, Disconnecting)
                | (Connected, Failed)
                | (Connected, Idle)
                | (Disconnecting, Idle)
                | (Failed, Idle)
        )
    }

    /// Connecting or connected
    pub fn is_active(self) -> bool {
        matches!(self, ConnectionState::Connecting | ConnectionState::Connected)
    }
}

/// Status shown to the user; exactly one at any time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Disconnected,
    Connecting,
    Connected,
    ConnectionFailed,
}

impl SessionStatus {
    pub fn label(self) -> &'static str {
        match self {
            SessionStatus::Disconnected => "Disconnected",
            SessionStatus::Connecting => "Connecting...",
            SessionStatus::Connected => "Connected - You can speak now!",
            SessionStatus::ConnectionFailed => "Connection failed",
        }
    }
}

/// Connection lifecycle notice, recorded as a system transcript line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionNotice {
    Established,
    MicrophoneEnabled,
    Disconnected,
    Lost { reason: String },
    Failed { message: String },
}

impl fmt::Display for ConnectionNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionNotice::Established => write!(f, "Connected to voice assistant"),
            ConnectionNotice::MicrophoneEnabled => {
                write!(f, "Microphone enabled - Start speaking!")
            }
            ConnectionNotice::Disconnected => write!(f, "Disconnected from assistant"),
            ConnectionNotice::Lost { reason } => {
                write!(f, "Connection to assistant lost: {}", reason)
            }
            ConnectionNotice::Failed { message } => write!(f, "Error: {}", message),
        }
    }
}

/// Read-only view of the session for rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub status_text: String,
    pub is_connected: bool,
    pub is_connecting: bool,

    /// Last error message, cleared by the next connect
    pub error: Option<String>,

    /// Transcript of the current (or last) session
    pub transcript: Vec<TranscriptEntry>,

    pub room_name: Option<String>,
    pub participant_identity: Option<String>,

    /// Track currently attached to the playback sink
    pub audio_track: Option<String>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            status: SessionStatus::Disconnected,
            status_text: SessionStatus::Disconnected.label().to_string(),
            is_connected: false,
            is_connecting: false,
            error: None,
            transcript: Vec::new(),
            room_name: None,
            participant_identity: None,
            audio_track: None,
        }
    }
}
