//! In-process transport
//!
//! `MemoryTransport` is the session side; `MemoryRemote` plays the room: it
//! publishes tracks, delivers transcriptions, drops the connection and can be
//! scripted to fail individual commands.

use super::backend::{Participant, TranscriptionSegment, Transport, TransportEvent};
use super::track::{RemoteTrack, TrackKind};
use anyhow::{bail, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, watch};
use tracing::debug;

/// Command issued to the transport, as recorded by the remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCommand {
    Connect { url: String, token: String },
    SetMicrophoneEnabled(bool),
    Disconnect,
}

#[derive(Default)]
struct RemoteState {
    commands: Vec<TransportCommand>,
    events: Option<mpsc::UnboundedSender<TransportEvent>>,
    tracks: HashMap<String, Arc<RemoteTrack>>,
    connected: bool,
    microphone_enabled: bool,
    connect_failure: Option<String>,
    microphone_failure: Option<String>,
    disconnect_failure: Option<String>,
}

struct Shared {
    state: Mutex<RemoteState>,
    /// `true` while `connect` must wait
    connect_gate: watch::Sender<bool>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, RemoteState> {
        // A poisoned lock only means a test panicked mid-update; the state is still usable
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Session-side half of the in-process transport
pub struct MemoryTransport {
    shared: Arc<Shared>,
}

/// Room-side half of the in-process transport
#[derive(Clone)]
pub struct MemoryRemote {
    shared: Arc<Shared>,
}

impl MemoryTransport {
    /// Create a transport together with the remote that scripts it
    pub fn pair() -> (Self, MemoryRemote) {
        let (connect_gate, _) = watch::channel(false);
        let shared = Arc::new(Shared {
            state: Mutex::new(RemoteState::default()),
            connect_gate,
        });

        (
            Self {
                shared: Arc::clone(&shared),
            },
            MemoryRemote { shared },
        )
    }
}

#[async_trait::async_trait]
impl Transport for MemoryTransport {
    async fn connect(
        &mut self,
        url: &str,
        token: &str,
    ) -> Result<mpsc::UnboundedReceiver<TransportEvent>> {
        self.shared.lock().commands.push(TransportCommand::Connect {
            url: url.to_string(),
            token: token.to_string(),
        });

        let mut gate = self.shared.connect_gate.subscribe();
        if gate.wait_for(|held| !*held).await.is_err() {
            bail!("transport remote went away");
        }

        let mut state = self.shared.lock();
        if let Some(reason) = state.connect_failure.clone() {
            bail!(reason);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(TransportEvent::Connected);
        state.events = Some(tx);
        state.connected = true;

        debug!("Memory transport connected to {}", url);

        Ok(rx)
    }

    async fn set_microphone_enabled(&mut self, enabled: bool) -> Result<()> {
        let mut state = self.shared.lock();
        state
            .commands
            .push(TransportCommand::SetMicrophoneEnabled(enabled));

        if !state.connected {
            bail!("not connected");
        }
        if enabled {
            if let Some(reason) = state.microphone_failure.clone() {
                bail!(reason);
            }
        }

        state.microphone_enabled = enabled;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        let mut state = self.shared.lock();
        state.commands.push(TransportCommand::Disconnect);

        state.events = None;
        state.tracks.clear();
        state.connected = false;
        state.microphone_enabled = false;

        if let Some(reason) = state.disconnect_failure.clone() {
            bail!(reason);
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

impl MemoryRemote {
    /// Make the next connects fail with `reason`
    pub fn fail_connect(&self, reason: impl Into<String>) {
        self.shared.lock().connect_failure = Some(reason.into());
    }

    /// Make enabling the microphone fail with `reason`
    pub fn fail_microphone(&self, reason: impl Into<String>) {
        self.shared.lock().microphone_failure = Some(reason.into());
    }

    /// Make disconnect report `reason` after releasing its resources
    pub fn fail_disconnect(&self, reason: impl Into<String>) {
        self.shared.lock().disconnect_failure = Some(reason.into());
    }

    /// Park every `connect` until [`release_connect`](Self::release_connect)
    pub fn hold_connect(&self) {
        self.shared.connect_gate.send_replace(true);
    }

    pub fn release_connect(&self) {
        self.shared.connect_gate.send_replace(false);
    }

    /// Deliver an arbitrary event; returns `false` when nobody is listening
    pub fn emit(&self, event: TransportEvent) -> bool {
        let state = self.shared.lock();
        match &state.events {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    /// Publish a track and notify the subscriber
    pub fn publish_track(&self, sid: &str, kind: TrackKind, participant_identity: &str) -> bool {
        let track = Arc::new(RemoteTrack::new(sid, kind, participant_identity));
        let mut state = self.shared.lock();
        let Some(tx) = state.events.clone() else {
            return false;
        };

        state.tracks.insert(sid.to_string(), Arc::clone(&track));
        tx.send(TransportEvent::TrackSubscribed(track)).is_ok()
    }

    /// Unpublish a track, dropping the transport's ownership of it
    pub fn unpublish_track(&self, sid: &str) -> bool {
        let mut state = self.shared.lock();
        state.tracks.remove(sid);
        match &state.events {
            Some(tx) => tx
                .send(TransportEvent::TrackUnsubscribed {
                    sid: sid.to_string(),
                })
                .is_ok(),
            None => false,
        }
    }

    /// Deliver one transcription notification
    pub fn transcribe(&self, participant_identity: Option<&str>, texts: &[&str]) -> bool {
        self.emit(TransportEvent::TranscriptionReceived {
            segments: texts.iter().map(|t| TranscriptionSegment::new(*t)).collect(),
            participant: participant_identity.map(Participant::new),
        })
    }

    /// Drop the connection from the room side (network loss, server close)
    pub fn drop_connection(&self, reason: &str) -> bool {
        let mut state = self.shared.lock();
        state.tracks.clear();
        state.connected = false;
        state.microphone_enabled = false;
        match state.events.take() {
            Some(tx) => tx
                .send(TransportEvent::Disconnected {
                    reason: reason.to_string(),
                })
                .is_ok(),
            None => false,
        }
    }

    /// Close the event stream without a disconnect event
    pub fn close_events(&self) {
        self.shared.lock().events = None;
    }

    pub fn commands(&self) -> Vec<TransportCommand> {
        self.shared.lock().commands.clone()
    }

    pub fn connect_count(&self) -> usize {
        self.shared
            .lock()
            .commands
            .iter()
            .filter(|c| matches!(c, TransportCommand::Connect { .. }))
            .count()
    }

    pub fn is_connected(&self) -> bool {
        self.shared.lock().connected
    }

    pub fn microphone_enabled(&self) -> bool {
        self.shared.lock().microphone_enabled
    }

    /// Whether a session is still receiving this transport's events
    pub fn has_listener(&self) -> bool {
        self.shared
            .lock()
            .events
            .as_ref()
            .map(|tx| !tx.is_closed())
            .unwrap_or(false)
    }

    pub fn track_count(&self) -> usize {
        self.shared.lock().tracks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_delivers_connected_first() {
        let (mut transport, remote) = MemoryTransport::pair();
        let mut rx = transport.connect("memory://room", "token").await.unwrap();

        assert!(remote.transcribe(Some("assistant"), &["hello"]));
        assert!(matches!(rx.recv().await, Some(TransportEvent::Connected)));
        assert!(matches!(
            rx.recv().await,
            Some(TransportEvent::TranscriptionReceived { .. })
        ));
    }

    #[tokio::test]
    async fn test_disconnect_closes_stream_and_releases_tracks() {
        let (mut transport, remote) = MemoryTransport::pair();
        let mut rx = transport.connect("memory://room", "token").await.unwrap();
        remote.publish_track("TR_1", TrackKind::Audio, "assistant");
        assert_eq!(remote.track_count(), 1);

        transport.disconnect().await.unwrap();
        assert_eq!(remote.track_count(), 0);
        assert!(!remote.is_connected());

        // Buffered events drain, then the stream ends
        assert!(matches!(rx.recv().await, Some(TransportEvent::Connected)));
        assert!(matches!(
            rx.recv().await,
            Some(TransportEvent::TrackSubscribed(_))
        ));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_microphone_requires_connection() {
        let (mut transport, _remote) = MemoryTransport::pair();
        assert!(transport.set_microphone_enabled(true).await.is_err());
    }

    #[tokio::test]
    async fn test_scripted_connect_failure() {
        let (mut transport, remote) = MemoryTransport::pair();
        remote.fail_connect("signal server unreachable");

        let err = transport.connect("memory://room", "token").await.unwrap_err();
        assert_eq!(err.to_string(), "signal server unreachable");
        assert!(!remote.is_connected());
        assert_eq!(remote.connect_count(), 1);
    }
}
