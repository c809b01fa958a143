use super::backend::TranscriptionSegment;
use super::track::TrackKind;
use serde::{Deserialize, Serialize};

/// Room event published by the media server on `<prefix>.<room>.events`
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomEventMessage {
    TrackSubscribed {
        track_sid: String,
        kind: TrackKind,
        participant: String,
    },
    TrackUnsubscribed {
        track_sid: String,
    },
    Transcription {
        #[serde(default)]
        participant: Option<String>,
        segments: Vec<TranscriptionSegment>,
    },
    Disconnected {
        #[serde(default)]
        reason: Option<String>,
    },
}

/// Microphone state published on `<prefix>.<room>.microphone`
#[derive(Debug, Serialize, Deserialize)]
pub struct MicrophoneMessage {
    pub enabled: bool,
    pub timestamp: String, // RFC3339 timestamp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcription_event_deserialization() {
        let json = r#"{
            "type": "transcription",
            "participant": "user_1730000000000",
            "segments": [
                {"id": "SG_1", "text": "what are your hours", "final": true},
                {"text": "today"}
            ]
        }"#;

        let msg: RoomEventMessage = serde_json::from_str(json).unwrap();
        match msg {
            RoomEventMessage::Transcription {
                participant,
                segments,
            } => {
                assert_eq!(participant.as_deref(), Some("user_1730000000000"));
                assert_eq!(segments.len(), 2);
                assert_eq!(segments[0].id, "SG_1");
                assert!(segments[0].r#final);
                assert_eq!(segments[1].text, "today");
                assert!(!segments[1].r#final);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_track_subscribed_deserialization() {
        let json = r#"{"type": "track_subscribed", "track_sid": "TR_a", "kind": "audio", "participant": "assistant"}"#;
        let msg: RoomEventMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(
            msg,
            RoomEventMessage::TrackSubscribed {
                kind: TrackKind::Audio,
                ..
            }
        ));
    }

    #[test]
    fn test_disconnected_without_reason() {
        let msg: RoomEventMessage = serde_json::from_str(r#"{"type": "disconnected"}"#).unwrap();
        assert!(matches!(msg, RoomEventMessage::Disconnected { reason: None }));
    }

    #[test]
    fn test_microphone_message_serialization() {
        let msg = MicrophoneMessage {
            enabled: true,
            timestamp: "2025-10-27T14:30:00Z".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"enabled\":true"));
    }
}
