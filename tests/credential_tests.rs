// Integration tests for the credential authority client
//
// Each test serves a small authority on an ephemeral local port and checks
// the request the fetcher sends and how it reads the reply.

use axum::{http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use voice_session::credentials::{CredentialError, CredentialSource, HttpCredentialFetcher};

/// Serve `router` on 127.0.0.1 and return its base URL
async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn fetcher(base_url: &str) -> HttpCredentialFetcher {
    HttpCredentialFetcher::new(base_url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_successful_token_exchange() {
    let received: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
    let seen = received.clone();

    let router = Router::new().route(
        "/token",
        post(move |Json(body): Json<Value>| {
            let seen = seen.clone();
            async move {
                *seen.lock().unwrap() = Some(body);
                Json(json!({
                    "token": "jwt-abc",
                    "url": "nats://media.example:4222",
                    "room_name": "voice-ai-room"
                }))
            }
        }),
    );
    let base_url = serve(router).await;

    let credential = fetcher(&base_url)
        .fetch("voice-ai-room", "user_1730000000000")
        .await
        .unwrap();

    assert_eq!(credential.access_token, "jwt-abc");
    assert_eq!(credential.connection_url, "nats://media.example:4222");

    let body = received.lock().unwrap().clone().unwrap();
    assert_eq!(body["room_name"], "voice-ai-room");
    assert_eq!(body["participant_name"], "user_1730000000000");
}

#[tokio::test]
async fn test_rejection_carries_authority_detail() {
    let router = Router::new().route(
        "/token",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"detail": "Missing LiveKit credentials"})),
            )
        }),
    );
    let base_url = serve(router).await;

    let err = fetcher(&base_url)
        .fetch("voice-ai-room", "user_1")
        .await
        .unwrap_err();

    match err {
        CredentialError::Rejected { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message.as_deref(), Some("Missing LiveKit credentials"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_rejection_without_detail() {
    let router = Router::new().route(
        "/token",
        post(|| async { (StatusCode::FORBIDDEN, "nope") }),
    );
    let base_url = serve(router).await;

    let err = fetcher(&base_url)
        .fetch("voice-ai-room", "user_1")
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "authority returned status 403");
}

#[tokio::test]
async fn test_missing_endpoint_is_a_rejection() {
    let base_url = serve(Router::new()).await;

    let err = fetcher(&base_url)
        .fetch("voice-ai-room", "user_1")
        .await
        .unwrap_err();

    assert!(matches!(err, CredentialError::Rejected { status: 404, .. }));
}

#[tokio::test]
async fn test_malformed_payload() {
    let router = Router::new().route(
        "/token",
        post(|| async { Json(json!({"token": "jwt-abc"})) }),
    );
    let base_url = serve(router).await;

    let err = fetcher(&base_url)
        .fetch("voice-ai-room", "user_1")
        .await
        .unwrap_err();

    assert!(matches!(err, CredentialError::Malformed(_)));
}

#[tokio::test]
async fn test_unreachable_authority() {
    // Bind then drop to get a port nobody listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = fetcher(&format!("http://{}", addr))
        .fetch("voice-ai-room", "user_1")
        .await
        .unwrap_err();

    assert!(matches!(err, CredentialError::Unreachable(_)));
}
