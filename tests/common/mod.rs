// Shared fixtures for session integration tests
#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use voice_session::credentials::{Credential, CredentialError, CredentialSource};
use voice_session::transcript::FixedClock;
use voice_session::{ControllerConfig, MemoryRemote, MemoryTransport, SessionController};

/// Credential source answering from memory and counting requests
#[derive(Default)]
pub struct StaticCredentials {
    calls: AtomicUsize,
    participants: Mutex<Vec<String>>,
    rejection: Mutex<Option<String>>,
}

impl StaticCredentials {
    pub fn reject_with(&self, message: &str) {
        *self.rejection.lock().unwrap() = Some(message.to_string());
    }

    pub fn accept(&self) {
        *self.rejection.lock().unwrap() = None;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn participants(&self) -> Vec<String> {
        self.participants.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl CredentialSource for StaticCredentials {
    async fn fetch(
        &self,
        room_name: &str,
        participant_name: &str,
    ) -> Result<Credential, CredentialError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.participants
            .lock()
            .unwrap()
            .push(participant_name.to_string());

        if let Some(message) = self.rejection.lock().unwrap().clone() {
            return Err(CredentialError::Rejected {
                status: 500,
                message: Some(message),
            });
        }

        Ok(Credential {
            access_token: "test-token".to_string(),
            connection_url: format!("memory://{}", room_name),
        })
    }
}

pub struct Harness {
    pub controller: SessionController,
    pub remote: MemoryRemote,
    pub credentials: Arc<StaticCredentials>,
}

pub fn harness() -> Harness {
    harness_with(ControllerConfig::default())
}

pub fn harness_with(config: ControllerConfig) -> Harness {
    let (transport, remote) = MemoryTransport::pair();
    let credentials = Arc::new(StaticCredentials::default());
    let clock = FixedClock(Utc.with_ymd_and_hms(2025, 10, 27, 14, 30, 0).unwrap());

    let controller = SessionController::new(config, credentials.clone(), Box::new(transport))
        .with_clock(Arc::new(clock));

    Harness {
        controller,
        remote,
        credentials,
    }
}

pub fn texts(controller: &SessionController) -> Vec<String> {
    controller
        .transcript()
        .iter()
        .map(|e| e.text.clone())
        .collect()
}
