// Integration tests for process shutdown
//
// The server is run until its shutdown future resolves; afterwards the
// session must be torn down and the controller stopped.

mod common;

use common::harness;
use std::time::Duration;
use tokio::net::TcpListener;
use voice_session::http::{serve, shutdown_signal};
use voice_session::transport::TransportCommand;
use voice_session::SessionError;

#[tokio::test]
async fn test_server_shutdown_tears_session_down() {
    let h = harness();
    let remote = h.remote.clone();
    let (session, task) = h.controller.spawn();
    session.connect().await.unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(serve(listener, session.clone(), task, async {
        let _ = stopped.await;
    }));

    stop.send(()).unwrap();
    server.await.unwrap().unwrap();

    assert!(!remote.is_connected());
    assert_eq!(remote.commands().last(), Some(&TransportCommand::Disconnect));
    assert!(matches!(
        session.connect().await,
        Err(SessionError::ControllerStopped)
    ));
}

#[cfg(unix)]
#[tokio::test]
async fn test_sigterm_tears_session_down() {
    let h = harness();
    let remote = h.remote.clone();
    let (session, task) = h.controller.spawn();
    session.connect().await.unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let server = tokio::spawn(serve(listener, session, task, shutdown_signal()));

    // Give the server time to install its signal handlers
    tokio::time::sleep(Duration::from_millis(200)).await;

    let status = std::process::Command::new("kill")
        .args(["-TERM", &std::process::id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not stop on SIGTERM")
        .unwrap()
        .unwrap();

    assert!(!remote.is_connected());
}
