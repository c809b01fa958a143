use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};

/// Kind of a remote media track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    Audio,
    Video,
}

/// A media track published by a remote participant.
///
/// The transport owns every `RemoteTrack` (behind an `Arc`) for as long as it
/// is subscribed; everything else holds it through a [`MediaElement`].
#[derive(Debug)]
pub struct RemoteTrack {
    sid: String,
    kind: TrackKind,
    participant_identity: String,
}

impl RemoteTrack {
    pub fn new(
        sid: impl Into<String>,
        kind: TrackKind,
        participant_identity: impl Into<String>,
    ) -> Self {
        Self {
            sid: sid.into(),
            kind,
            participant_identity: participant_identity.into(),
        }
    }

    pub fn sid(&self) -> &str {
        &self.sid
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn participant_identity(&self) -> &str {
        &self.participant_identity
    }

    /// Create a playback element bound to this track without taking ownership
    pub fn attach(self: &Arc<Self>) -> MediaElement {
        MediaElement {
            track_sid: self.sid.clone(),
            track: Arc::downgrade(self),
        }
    }
}

/// Playback handle for a remote track
#[derive(Debug, Clone)]
pub struct MediaElement {
    track_sid: String,
    track: Weak<RemoteTrack>,
}

impl MediaElement {
    pub fn track_sid(&self) -> &str {
        &self.track_sid
    }

    /// Whether the transport still holds the underlying track
    pub fn is_live(&self) -> bool {
        self.track.strong_count() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_element_does_not_keep_track_alive() {
        let track = Arc::new(RemoteTrack::new("TR_audio", TrackKind::Audio, "assistant"));
        let element = track.attach();

        assert_eq!(element.track_sid(), "TR_audio");
        assert!(element.is_live());
        assert_eq!(Arc::strong_count(&track), 1);

        drop(track);
        assert!(!element.is_live());
    }
}
