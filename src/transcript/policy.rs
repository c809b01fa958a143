use super::entry::Speaker;
use serde::{Deserialize, Serialize};

/// How a transcription's participant identity maps to a speaker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpeakerPolicy {
    /// Identities starting with `prefix` are the local user
    IdentityPrefix { prefix: String },

    /// Only this session's own participant identity is the local user
    LocalIdentity,
}

impl Default for SpeakerPolicy {
    fn default() -> Self {
        Self::IdentityPrefix {
            prefix: "user".to_string(),
        }
    }
}

impl SpeakerPolicy {
    /// Classify a segment's originating participant.
    ///
    /// `identity` is `None` when the transport did not attribute the
    /// segment; such segments belong to the assistant.
    pub fn classify(&self, identity: Option<&str>, local_identity: Option<&str>) -> Speaker {
        let Some(identity) = identity else {
            return Speaker::Assistant;
        };

        let is_user = match self {
            Self::IdentityPrefix { prefix } => identity.starts_with(prefix.as_str()),
            Self::LocalIdentity => local_identity == Some(identity),
        };

        if is_user {
            Speaker::User
        } else {
            Speaker::Assistant
        }
    }
}
