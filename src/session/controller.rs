use super::binder::{MediaContainer, MediaTrackBinder, PlaybackSink};
use super::connection::SessionConnection;
use super::identity::ParticipantIdentityGenerator;
use super::state::{ConnectionNotice, ConnectionState, SessionSnapshot, SessionStatus};
use crate::credentials::CredentialSource;
use crate::error::SessionError;
use crate::transcript::{Clock, SpeakerPolicy, TranscriptAggregator, TranscriptEntry};
use crate::transport::{Transport, TransportEvent};
use std::sync::Arc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Settings the controller needs for every session
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Room (session) name sent to the credential authority
    pub room_name: String,

    /// Prefix of generated participant identities
    pub identity_prefix: String,

    /// Speaker classification for transcription segments
    pub speaker_policy: SpeakerPolicy,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            room_name: "voice-ai-room".to_string(),
            identity_prefix: "user".to_string(),
            speaker_policy: SpeakerPolicy::default(),
        }
    }
}

#[derive(Debug, Clone)]
struct ActiveSession {
    attempt_id: Uuid,
    participant_identity: String,
}

/// Orchestrates credential fetch, connection, track binding and transcript.
///
/// At most one session exists at a time. Status, last error and transcript
/// live here and are published to observers as [`SessionSnapshot`]s.
pub struct SessionController {
    config: ControllerConfig,
    credentials: Arc<dyn CredentialSource>,
    connection: SessionConnection,
    binder: MediaTrackBinder,
    transcript: TranscriptAggregator,
    identities: ParticipantIdentityGenerator,
    status: SessionStatus,
    last_error: Option<String>,
    session: Option<ActiveSession>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl SessionController {
    pub fn new(
        config: ControllerConfig,
        credentials: Arc<dyn CredentialSource>,
        transport: Box<dyn Transport>,
    ) -> Self {
        let (snapshots, _) = watch::channel(SessionSnapshot::default());

        Self {
            transcript: TranscriptAggregator::new(config.speaker_policy.clone()),
            identities: ParticipantIdentityGenerator::new(config.identity_prefix.clone()),
            config,
            credentials,
            connection: SessionConnection::new(transport),
            binder: MediaTrackBinder::new(Box::new(MediaContainer::default())),
            status: SessionStatus::Disconnected,
            last_error: None,
            session: None,
            snapshots,
        }
    }

    /// Use `sink` for remote audio playback
    pub fn with_sink(mut self, sink: Box<dyn PlaybackSink>) -> Self {
        self.binder = MediaTrackBinder::new(sink);
        self
    }

    /// Timestamp transcript entries with `clock`
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.transcript =
            TranscriptAggregator::with_clock(self.config.speaker_policy.clone(), clock);
        self
    }

    /// Start a session.
    ///
    /// A no-op while a session is connecting or connected. Any stage
    /// failure leaves the connection idle, sets the error message and is
    /// returned; the controller is always connectable afterwards.
    pub async fn connect(&mut self) -> Result<(), SessionError> {
        if matches!(
            self.status,
            SessionStatus::Connecting | SessionStatus::Connected
        ) || self.connection.state().is_active()
        {
            debug!("Connect ignored: session is {:?}", self.status);
            return Ok(());
        }

        // Leftovers of a previous session must be gone before the new one starts
        self.teardown().await;

        let attempt_id = Uuid::new_v4();
        let participant_identity = self.identities.next_identity();

        info!(
            "Starting session {} as {} in room {}",
            attempt_id, participant_identity, self.config.room_name
        );

        self.transcript.reset(Some(participant_identity.clone()));
        self.last_error = None;
        self.status = SessionStatus::Connecting;
        self.session = Some(ActiveSession {
            attempt_id,
            participant_identity: participant_identity.clone(),
        });
        self.publish();

        match self.establish(&participant_identity).await {
            Ok(notices) => {
                self.binder.bind();
                for notice in &notices {
                    self.transcript.record_notice(notice);
                }
                self.status = SessionStatus::Connected;
                self.publish();

                info!("Session {} connected", attempt_id);
                Ok(())
            }
            Err(err) => {
                self.fail(&err).await;
                Err(err)
            }
        }
    }

    async fn establish(
        &mut self,
        participant_identity: &str,
    ) -> Result<Vec<ConnectionNotice>, SessionError> {
        let credential = self
            .credentials
            .fetch(&self.config.room_name, participant_identity)
            .await?;

        self.connection.connect(credential).await
    }

    async fn fail(&mut self, err: &SessionError) {
        error!("Session attempt failed: {}", err);

        self.teardown().await;
        self.session = None;

        let message = err.to_string();
        self.transcript.record_notice(&ConnectionNotice::Failed {
            message: message.clone(),
        });
        self.last_error = Some(message);
        self.status = SessionStatus::ConnectionFailed;
        self.publish();
    }

    /// End the session.
    ///
    /// Idempotent: without an active session nothing happens, and no
    /// transcript entry is added.
    pub async fn disconnect(&mut self) {
        if !self.teardown().await {
            debug!("Disconnect ignored: no active session");
            return;
        }

        self.transcript.record_notice(&ConnectionNotice::Disconnected);
        self.status = SessionStatus::Disconnected;
        self.publish();

        info!("Session disconnected");
    }

    /// Release sink, subscription and transport; returns whether anything was live
    async fn teardown(&mut self) -> bool {
        self.binder.detach();
        let torn_down = self.connection.disconnect().await;
        if torn_down {
            if let Some(session) = self.session.take() {
                debug!("Session {} torn down", session.attempt_id);
            }
        }
        torn_down
    }

    /// Apply one transport event of the current connection
    pub async fn handle_transport_event(&mut self, event: TransportEvent) {
        if self.connection.state() != ConnectionState::Connected {
            debug!("Dropping transport event outside a connected session");
            return;
        }

        match event {
            TransportEvent::Connected => debug!("Transport confirmed connection"),
            TransportEvent::Disconnected { reason } => self.connection_lost(reason).await,
            TransportEvent::TrackSubscribed(track) => {
                self.binder.on_track_subscribed(&track);
                self.publish();
            }
            TransportEvent::TrackUnsubscribed { sid } => {
                self.binder.on_track_unsubscribed(&sid);
                self.publish();
            }
            TransportEvent::TranscriptionReceived {
                segments,
                participant,
            } => {
                self.transcript
                    .record_transcription(&segments, participant.as_ref());
                self.publish();
            }
        }
    }

    /// The transport closed its event stream without saying why
    pub async fn handle_stream_closed(&mut self) {
        self.connection_lost("event stream closed".to_string()).await;
    }

    async fn connection_lost(&mut self, reason: String) {
        self.binder.detach();
        if !self.connection.connection_lost().await {
            return;
        }
        self.session = None;

        let err = SessionError::TransportLost(reason.clone());
        warn!("{}", err);

        self.transcript
            .record_notice(&ConnectionNotice::Lost { reason });
        self.last_error = Some(err.to_string());
        self.status = SessionStatus::Disconnected;
        self.publish();
    }

    /// Wait for the next event of the current connection.
    ///
    /// `None` means the stream closed. Never resolves without a connection.
    pub async fn next_event(&mut self) -> Option<TransportEvent> {
        self.connection.next_event().await
    }

    /// Apply every event already delivered, in order; returns how many were applied
    pub async fn process_pending_events(&mut self) -> usize {
        let mut processed = 0;

        loop {
            match self.connection.try_next_event() {
                Ok(event) => {
                    self.handle_transport_event(event).await;
                    processed += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.handle_stream_closed().await;
                    break;
                }
            }
        }

        processed
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        self.transcript.entries()
    }

    pub fn playback_sink(&self) -> &dyn PlaybackSink {
        self.binder.sink()
    }

    pub fn participant_identity(&self) -> Option<&str> {
        self.session
            .as_ref()
            .map(|s| s.participant_identity.as_str())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            status_text: self.status.label().to_string(),
            is_connected: self.status == SessionStatus::Connected,
            is_connecting: self.status == SessionStatus::Connecting,
            error: self.last_error.clone(),
            transcript: self.transcript.entries().to_vec(),
            room_name: self
                .session
                .as_ref()
                .map(|_| self.config.room_name.clone()),
            participant_identity: self.participant_identity().map(str::to_string),
            audio_track: self.binder.attached_track().map(str::to_string),
        }
    }

    /// Observe the latest published snapshot
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.snapshot());
    }
}
