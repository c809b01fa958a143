use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use voice_session::{http, Config, HttpCredentialFetcher, NatsTransport, SessionController};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cfg = Config::load("config/voice-session")?;

    info!("Voice Session v0.1.0");
    info!("Loaded config: {}", cfg.service.name);
    info!("Credential authority: {}", cfg.authority.base_url);
    info!("Room: {}", cfg.authority.room_name);

    let credentials = HttpCredentialFetcher::new(&cfg.authority.base_url, cfg.authority.timeout())
        .context("Failed to create credential client")?;
    let transport = NatsTransport::new(
        cfg.authority.room_name.clone(),
        cfg.transport.subject_prefix.clone(),
    );

    let controller = SessionController::new(
        cfg.controller_config(),
        Arc::new(credentials),
        Box::new(transport),
    );
    let (session, controller_task) = controller.spawn();

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    // Tears the session down on every exit path
    http::serve(listener, session, controller_task, http::shutdown_signal()).await
}
