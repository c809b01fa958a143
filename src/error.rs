use crate::credentials::CredentialError;

/// Failures that end a session attempt or a live session.
///
/// All variants are caught by the session controller and reduced to a single
/// user-visible message; none of them escapes to the rendering boundary.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The credential authority was unreachable or rejected the request
    #[error("Failed to get token: {0}")]
    Credential(#[from] CredentialError),

    /// The transport failed to establish or the microphone could not be enabled
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Unexpected disconnect after a successful connection
    #[error("Connection to assistant lost: {0}")]
    TransportLost(String),

    /// The controller task is gone; no session can be driven anymore
    #[error("Session controller is not running")]
    ControllerStopped,
}

impl SessionError {
    /// Build a connection error from a transport failure, keeping the cause chain
    pub fn connection(err: anyhow::Error) -> Self {
        Self::Connection(format!("{:#}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_visible_messages() {
        let err = SessionError::Credential(CredentialError::Rejected {
            status: 500,
            message: Some("Missing LiveKit credentials".to_string()),
        });
        assert_eq!(
            err.to_string(),
            "Failed to get token: Missing LiveKit credentials"
        );

        let err = SessionError::connection(
            anyhow::anyhow!("permission denied").context("Failed to enable microphone"),
        );
        assert_eq!(
            err.to_string(),
            "Connection failed: Failed to enable microphone: permission denied"
        );

        let err = SessionError::TransportLost("server closed".to_string());
        assert_eq!(err.to_string(), "Connection to assistant lost: server closed");
    }
}
