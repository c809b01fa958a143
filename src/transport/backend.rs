use super::track::RemoteTrack;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

/// A unit of recognized speech attributed to one participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionSegment {
    /// Segment identifier assigned by the transcriber
    #[serde(default)]
    pub id: String,

    /// Recognized text
    pub text: String,

    /// Whether the transcriber considers this segment final
    #[serde(default)]
    pub r#final: bool,
}

impl TranscriptionSegment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            text: text.into(),
            r#final: true,
        }
    }
}

/// A participant in the room, as reported by the transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub identity: String,
}

impl Participant {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
        }
    }
}

/// Events delivered by a transport, in the order it observed them
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// The transport confirmed a live connection
    Connected,

    /// The transport lost or closed the connection
    Disconnected { reason: String },

    /// A remote track became available to this participant
    TrackSubscribed(Arc<RemoteTrack>),

    /// A previously subscribed remote track went away
    TrackUnsubscribed { sid: String },

    /// Transcription segments for one participant
    TranscriptionReceived {
        segments: Vec<TranscriptionSegment>,
        participant: Option<Participant>,
    },
}

/// Real-time media transport trait
///
/// Implementations:
/// - NATS: room events and microphone control over NATS subjects
/// - Memory: in-process transport driven by a test/offline remote
#[async_trait::async_trait]
pub trait Transport: Send {
    /// Open the connection with the given URL and access token
    ///
    /// Resolves once the connection is live and returns the receiver that
    /// delivers this connection's events in arrival order
    async fn connect(
        &mut self,
        url: &str,
        token: &str,
    ) -> Result<mpsc::UnboundedReceiver<TransportEvent>>;

    /// Enable or disable local microphone capture
    async fn set_microphone_enabled(&mut self, enabled: bool) -> Result<()>;

    /// Tear the connection down; a no-op when not connected
    async fn disconnect(&mut self) -> Result<()>;

    /// Get transport name for logging
    fn name(&self) -> &str;
}
