use serde::{Deserialize, Serialize};

/// Token request sent to the credential authority
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenRequest {
    pub room_name: String,
    pub participant_name: String,
}

/// Successful token response from the credential authority
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub url: String,
    /// Echoed by some authorities, unused
    #[serde(default)]
    pub room_name: Option<String>,
}

/// Error body returned by the authority on failure (`{"detail": "..."}`)
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthorityErrorBody {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_request_wire_format() {
        let req = TokenRequest {
            room_name: "voice-ai-room".to_string(),
            participant_name: "user_1730000000000".to_string(),
        };

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["room_name"], "voice-ai-room");
        assert_eq!(json["participant_name"], "user_1730000000000");
    }

    #[test]
    fn test_token_response_with_echoed_room() {
        let json = r#"{"token": "jwt", "url": "nats://localhost:4222", "room_name": "voice-ai-room"}"#;
        let resp: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.token, "jwt");
        assert_eq!(resp.url, "nats://localhost:4222");
        assert_eq!(resp.room_name.as_deref(), Some("voice-ai-room"));
    }

    #[test]
    fn test_token_response_missing_url_is_rejected() {
        let json = r#"{"token": "jwt"}"#;
        assert!(serde_json::from_str::<TokenResponse>(json).is_err());
    }
}
