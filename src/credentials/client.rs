use super::messages::{AuthorityErrorBody, TokenRequest, TokenResponse};
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

/// Short-lived connection credential issued by the authority.
///
/// Never persisted; consumed by the session connection during connect.
#[derive(Clone)]
pub struct Credential {
    pub access_token: String,
    pub connection_url: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("connection_url", &self.connection_url)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("authority unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    #[error("{}", rejection_message(.status, .message))]
    Rejected { status: u16, message: Option<String> },

    #[error("malformed token response: {0}")]
    Malformed(String),
}

fn rejection_message(status: &u16, message: &Option<String>) -> String {
    match message {
        Some(message) => message.clone(),
        None => format!("authority returned status {}", status),
    }
}

/// Source of session credentials
#[async_trait::async_trait]
pub trait CredentialSource: Send + Sync {
    /// Request a credential for `participant_name` to join `room_name`.
    ///
    /// Performs exactly one exchange; callers get the failure immediately.
    async fn fetch(
        &self,
        room_name: &str,
        participant_name: &str,
    ) -> Result<Credential, CredentialError>;
}

/// Credential fetcher talking to the authority's `POST /token` endpoint
pub struct HttpCredentialFetcher {
    client: reqwest::Client,
    token_url: String,
}

impl HttpCredentialFetcher {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let token_url = format!("{}/token", base_url.trim().trim_end_matches('/'));

        Ok(Self { client, token_url })
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }
}

#[async_trait::async_trait]
impl CredentialSource for HttpCredentialFetcher {
    async fn fetch(
        &self,
        room_name: &str,
        participant_name: &str,
    ) -> Result<Credential, CredentialError> {
        if room_name.trim().is_empty() {
            return Err(CredentialError::InvalidRequest(
                "room name must not be empty".to_string(),
            ));
        }
        if participant_name.trim().is_empty() {
            return Err(CredentialError::InvalidRequest(
                "participant name must not be empty".to_string(),
            ));
        }

        info!(
            "Requesting credential for {} in room {} from {}",
            participant_name, room_name, self.token_url
        );

        let request = TokenRequest {
            room_name: room_name.to_string(),
            participant_name: participant_name.to_string(),
        };

        let response = self
            .client
            .post(&self.token_url)
            .json(&request)
            .send()
            .await
            .map_err(CredentialError::Unreachable)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<AuthorityErrorBody>(&body)
                .ok()
                .map(|b| b.detail)
                .filter(|d| !d.trim().is_empty());

            warn!("Credential authority rejected request ({}): {}", status, body);

            return Err(CredentialError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| CredentialError::Malformed(e.to_string()))?;

        if body.token.is_empty() || body.url.is_empty() {
            return Err(CredentialError::Malformed(
                "token or url is empty".to_string(),
            ));
        }

        info!("Received credential for {} (url={})", participant_name, body.url);

        Ok(Credential {
            access_token: body.token,
            connection_url: body.url,
        })
    }
}
