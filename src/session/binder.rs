use crate::transport::{MediaElement, RemoteTrack, TrackKind};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Local output destination for remote audio
pub trait PlaybackSink: Send {
    /// Replace whatever the sink holds with `element`
    fn replace(&mut self, element: MediaElement) -> Result<()>;

    /// Remove all media content
    fn clear(&mut self);

    fn current(&self) -> Option<&MediaElement>;
}

/// Sink holding at most one playback element
#[derive(Debug, Default)]
pub struct MediaContainer {
    element: Option<MediaElement>,
}

impl PlaybackSink for MediaContainer {
    fn replace(&mut self, element: MediaElement) -> Result<()> {
        self.element = Some(element);
        Ok(())
    }

    fn clear(&mut self) {
        self.element = None;
    }

    fn current(&self) -> Option<&MediaElement> {
        self.element.as_ref()
    }
}

/// Binds subscribed remote audio to the playback sink while connected
pub struct MediaTrackBinder {
    sink: Box<dyn PlaybackSink>,
    bound: bool,
}

impl MediaTrackBinder {
    pub fn new(sink: Box<dyn PlaybackSink>) -> Self {
        Self { sink, bound: false }
    }

    /// Start accepting tracks for a freshly connected session
    pub fn bind(&mut self) {
        self.sink.clear();
        self.bound = true;
    }

    pub fn on_track_subscribed(&mut self, track: &Arc<RemoteTrack>) {
        if !self.bound {
            debug!("Ignoring track {} outside a connected session", track.sid());
            return;
        }
        if track.kind() != TrackKind::Audio {
            debug!("Ignoring {:?} track {}", track.kind(), track.sid());
            return;
        }

        // Audio is best-effort; a failed attach leaves the session intact
        match self.sink.replace(track.attach()) {
            Ok(()) => info!(
                "Attached audio track {} from {}",
                track.sid(),
                track.participant_identity()
            ),
            Err(e) => warn!("Failed to attach audio track {}: {:#}", track.sid(), e),
        }
    }

    pub fn on_track_unsubscribed(&mut self, sid: &str) {
        if self.attached_track() == Some(sid) {
            info!("Detaching audio track {}", sid);
            self.sink.clear();
        }
    }

    /// Clear the sink and stop accepting tracks
    pub fn detach(&mut self) {
        if let Some(sid) = self.attached_track() {
            info!("Detaching audio track {}", sid);
        }
        self.sink.clear();
        self.bound = false;
    }

    pub fn attached_track(&self) -> Option<&str> {
        self.sink.current().map(|e| e.track_sid())
    }

    pub fn sink(&self) -> &dyn PlaybackSink {
        self.sink.as_ref()
    }
}
