use crate::session::ControllerConfig;
use crate::transcript::SpeakerPolicy;
use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub authority: AuthorityConfig,
    #[serde(default)]
    pub participant: ParticipantConfig,
    #[serde(default)]
    pub transport: TransportConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct AuthorityConfig {
    /// Base URL of the credential authority (the service exposing `POST /token`)
    pub base_url: String,
    #[serde(default = "default_room_name")]
    pub room_name: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct ParticipantConfig {
    #[serde(default = "default_identity_prefix")]
    pub identity_prefix: String,
    /// Defaults to matching `identity_prefix`
    #[serde(default)]
    pub speaker_policy: Option<SpeakerPolicy>,
}

#[derive(Debug, Deserialize)]
pub struct TransportConfig {
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,
}

fn default_room_name() -> String {
    "voice-ai-room".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_identity_prefix() -> String {
    "user".to_string()
}

fn default_subject_prefix() -> String {
    "voice".to_string()
}

impl Default for ParticipantConfig {
    fn default() -> Self {
        Self {
            identity_prefix: default_identity_prefix(),
            speaker_policy: None,
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            subject_prefix: default_subject_prefix(),
        }
    }
}

impl AuthorityConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ParticipantConfig {
    pub fn speaker_policy(&self) -> SpeakerPolicy {
        self.speaker_policy
            .clone()
            .unwrap_or_else(|| SpeakerPolicy::IdentityPrefix {
                prefix: self.identity_prefix.clone(),
            })
    }
}

impl Config {
    /// Load from `path`, overridden by `VOICE_SESSION_*` environment variables
    /// (`__` separates nested keys, e.g. `VOICE_SESSION_AUTHORITY__BASE_URL`)
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix("VOICE_SESSION")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            room_name: self.authority.room_name.clone(),
            identity_prefix: self.participant.identity_prefix.clone(),
            speaker_policy: self.participant.speaker_policy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(contents: &str) -> (TempDir, String) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("voice-session.toml");
        fs::write(&path, contents).unwrap();
        let path = path.to_string_lossy().into_owned();
        (dir, path)
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let (_dir, path) = write_config(
            r#"
            [service]
            name = "voice-session"

            [service.http]
            bind = "127.0.0.1"
            port = 8090

            [authority]
            base_url = "http://localhost:5000"
            "#,
        );

        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.authority.room_name, "voice-ai-room");
        assert_eq!(cfg.authority.timeout(), Duration::from_secs(10));
        assert_eq!(cfg.transport.subject_prefix, "voice");

        let controller = cfg.controller_config();
        assert_eq!(controller.identity_prefix, "user");
        assert_eq!(
            controller.speaker_policy,
            SpeakerPolicy::IdentityPrefix {
                prefix: "user".to_string()
            }
        );
    }

    #[test]
    fn test_explicit_speaker_policy() {
        let (_dir, path) = write_config(
            r#"
            [service]
            name = "voice-session"

            [service.http]
            bind = "0.0.0.0"
            port = 9000

            [authority]
            base_url = "http://authority:5000"
            room_name = "store-assistant"

            [participant]
            identity_prefix = "caller"

            [participant.speaker_policy]
            kind = "local_identity"
            "#,
        );

        let cfg = Config::load(&path).unwrap();
        let controller = cfg.controller_config();
        assert_eq!(controller.room_name, "store-assistant");
        assert_eq!(controller.identity_prefix, "caller");
        assert_eq!(controller.speaker_policy, SpeakerPolicy::LocalIdentity);
    }

    #[test]
    fn test_missing_authority_is_an_error() {
        let (_dir, path) = write_config(
            r#"
            [service]
            name = "voice-session"

            [service.http]
            bind = "127.0.0.1"
            port = 8090
            "#,
        );

        assert!(Config::load(&path).is_err());
    }
}
