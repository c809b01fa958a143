use super::backend::{Participant, Transport, TransportEvent};
use super::messages::{MicrophoneMessage, RoomEventMessage};
use super::track::RemoteTrack;
use anyhow::{bail, Context, Result};
use async_nats::Client;
use futures::stream::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Transport carrying room signaling over NATS.
///
/// The credential URL names the NATS server and the access token is used as
/// the NATS auth token. Room events are read from `<prefix>.<room>.events`,
/// microphone state is published to `<prefix>.<room>.microphone`.
pub struct NatsTransport {
    room_name: String,
    subject_prefix: String,
    client: Option<Client>,
    event_task: Option<JoinHandle<()>>,
}

impl NatsTransport {
    pub fn new(room_name: impl Into<String>, subject_prefix: impl Into<String>) -> Self {
        Self {
            room_name: room_name.into(),
            subject_prefix: subject_prefix.into(),
            client: None,
            event_task: None,
        }
    }

    pub fn events_subject(&self) -> String {
        format!("{}.{}.events", self.subject_prefix, self.room_name)
    }

    pub fn microphone_subject(&self) -> String {
        format!("{}.{}.microphone", self.subject_prefix, self.room_name)
    }
}

/// Turn a wire event into a transport event, keeping track ownership in `tracks`
fn translate(
    message: RoomEventMessage,
    tracks: &mut HashMap<String, Arc<RemoteTrack>>,
) -> TransportEvent {
    match message {
        RoomEventMessage::TrackSubscribed {
            track_sid,
            kind,
            participant,
        } => {
            let track = Arc::new(RemoteTrack::new(track_sid.clone(), kind, participant));
            tracks.insert(track_sid, Arc::clone(&track));
            TransportEvent::TrackSubscribed(track)
        }
        RoomEventMessage::TrackUnsubscribed { track_sid } => {
            tracks.remove(&track_sid);
            TransportEvent::TrackUnsubscribed { sid: track_sid }
        }
        RoomEventMessage::Transcription {
            participant,
            segments,
        } => TransportEvent::TranscriptionReceived {
            segments,
            participant: participant.map(Participant::new),
        },
        RoomEventMessage::Disconnected { reason } => TransportEvent::Disconnected {
            reason: reason.unwrap_or_else(|| "room closed by server".to_string()),
        },
    }
}

#[async_trait::async_trait]
impl Transport for NatsTransport {
    async fn connect(
        &mut self,
        url: &str,
        token: &str,
    ) -> Result<mpsc::UnboundedReceiver<TransportEvent>> {
        if self.client.is_some() {
            bail!("NATS transport is already connected");
        }

        info!("Connecting to NATS at {}", url);

        let (tx, rx) = mpsc::unbounded_channel();

        let callback_tx = tx.clone();
        let client = async_nats::ConnectOptions::with_token(token.to_string())
            .event_callback(move |event| {
                let tx = callback_tx.clone();
                async move {
                    if let async_nats::Event::Disconnected = event {
                        let _ = tx.send(TransportEvent::Disconnected {
                            reason: "connection to server lost".to_string(),
                        });
                    }
                }
            })
            .connect(url)
            .await
            .context("Failed to connect to NATS")?;

        let subject = self.events_subject();
        let mut subscriber = client
            .subscribe(subject.clone())
            .await
            .context("Failed to subscribe to room events")?;

        info!("Connected to NATS, subscribed to {}", subject);

        let _ = tx.send(TransportEvent::Connected);

        // Spawn room event forwarding task
        let event_task = tokio::spawn(async move {
            debug!("Room event task started");

            let mut tracks = HashMap::new();

            while let Some(msg) = subscriber.next().await {
                match serde_json::from_slice::<RoomEventMessage>(&msg.payload) {
                    Ok(message) => {
                        let event = translate(message, &mut tracks);
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Failed to parse room event: {}", e);
                    }
                }
            }

            debug!("Room event task stopped");
        });

        self.client = Some(client);
        self.event_task = Some(event_task);

        Ok(rx)
    }

    async fn set_microphone_enabled(&mut self, enabled: bool) -> Result<()> {
        let Some(client) = &self.client else {
            bail!("NATS transport is not connected");
        };

        let message = MicrophoneMessage {
            enabled,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        let payload = serde_json::to_vec(&message)?;

        client
            .publish(self.microphone_subject(), payload.into())
            .await
            .context("Failed to publish microphone state")?;
        client
            .flush()
            .await
            .context("Failed to confirm microphone state")?;

        info!("Microphone {}", if enabled { "enabled" } else { "disabled" });

        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(task) = self.event_task.take() {
            task.abort();
        }

        let Some(client) = self.client.take() else {
            return Ok(());
        };

        info!("Closing NATS transport");

        // Dropping the last client handle closes the connection
        client
            .flush()
            .await
            .context("Failed to flush NATS connection")?;

        Ok(())
    }

    fn name(&self) -> &str {
        "nats"
    }
}

impl Drop for NatsTransport {
    fn drop(&mut self) {
        if let Some(task) = self.event_task.take() {
            task.abort();
        }
    }
}
