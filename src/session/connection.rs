use super::state::{ConnectionNotice, ConnectionState};
use crate::credentials::Credential;
use crate::error::SessionError;
use crate::transport::{Transport, TransportEvent};
use anyhow::Result;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, info, warn};

/// Owns one real-time connection and drives its lifecycle:
/// `Idle -> Connecting -> Connected -> Disconnecting -> Idle`, with
/// `Failed -> Idle` on errors and `Connected -> Idle` on transport loss.
///
/// Every path out of an active state releases the transport and drops the
/// event subscription before reporting `Idle`.
pub struct SessionConnection {
    transport: Box<dyn Transport>,
    state: ConnectionState,
    events: Option<mpsc::UnboundedReceiver<TransportEvent>>,
}

impl SessionConnection {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            state: ConnectionState::Idle,
            events: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    fn transition(&mut self, next: ConnectionState) {
        if !self.state.can_transition_to(next) {
            warn!("Unexpected connection transition {:?} -> {:?}", self.state, next);
        }
        debug!("Connection {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Open the transport and enable the microphone.
    ///
    /// Only valid from `Idle`. On success the connection is `Connected` and
    /// the returned notices describe what was established, in order. On any
    /// failure the transport is torn down and the connection is back to
    /// `Idle`; partial success is never exposed.
    pub async fn connect(
        &mut self,
        credential: Credential,
    ) -> Result<Vec<ConnectionNotice>, SessionError> {
        if self.state != ConnectionState::Idle {
            return Err(SessionError::Connection(format!(
                "connection is already {:?}",
                self.state
            )));
        }

        self.transition(ConnectionState::Connecting);

        info!(
            "Opening {} transport to {}",
            self.transport.name(),
            credential.connection_url
        );

        let events = match self
            .transport
            .connect(&credential.connection_url, &credential.access_token)
            .await
        {
            Ok(events) => events,
            Err(e) => {
                let err = SessionError::connection(e.context("Failed to open transport"));
                self.fail(&err).await;
                return Err(err);
            }
        };
        self.events = Some(events);

        if let Err(e) = self.transport.set_microphone_enabled(true).await {
            let err = SessionError::connection(e.context("Failed to enable microphone"));
            self.fail(&err).await;
            return Err(err);
        }

        self.transition(ConnectionState::Connected);
        info!("Connection established");

        Ok(vec![
            ConnectionNotice::Established,
            ConnectionNotice::MicrophoneEnabled,
        ])
    }

    async fn fail(&mut self, err: &SessionError) {
        warn!("Connection attempt failed: {}", err);
        self.transition(ConnectionState::Failed);
        self.release().await;
        self.transition(ConnectionState::Idle);
    }

    /// Drop the event subscription and tear the transport down.
    /// Teardown errors are logged, never returned.
    async fn release(&mut self) {
        self.events = None;
        if let Err(e) = self.transport.disconnect().await {
            warn!("Transport teardown failed: {:#}", e);
        }
    }

    /// Tear the connection down.
    ///
    /// Idempotent: returns `false` and does nothing when already `Idle`.
    pub async fn disconnect(&mut self) -> bool {
        if self.state == ConnectionState::Idle {
            return false;
        }

        info!("Disconnecting {} transport", self.transport.name());

        self.transition(ConnectionState::Disconnecting);
        self.release().await;
        self.transition(ConnectionState::Idle);

        true
    }

    /// Handle a transport-initiated disconnect: `Connected -> Idle`.
    ///
    /// Returns `false` when there was no live connection to lose.
    pub async fn connection_lost(&mut self) -> bool {
        if self.state != ConnectionState::Connected {
            self.events = None;
            return false;
        }

        self.release().await;
        self.transition(ConnectionState::Idle);

        true
    }

    /// Next event of the current connection.
    ///
    /// `None` means the transport closed its event stream. Without a
    /// connection this never resolves.
    pub async fn next_event(&mut self) -> Option<TransportEvent> {
        match self.events.as_mut() {
            Some(events) => events.recv().await,
            None => std::future::pending().await,
        }
    }

    /// Next already-delivered event, without waiting
    pub fn try_next_event(&mut self) -> Result<TransportEvent, TryRecvError> {
        match self.events.as_mut() {
            Some(events) => events.try_recv(),
            None => Err(TryRecvError::Empty),
        }
    }
}

/// Placeholder left behind once the real transport has been handed off
struct ReleasedTransport;

#[async_trait::async_trait]
impl Transport for ReleasedTransport {
    async fn connect(
        &mut self,
        _url: &str,
        _token: &str,
    ) -> Result<mpsc::UnboundedReceiver<TransportEvent>> {
        anyhow::bail!("transport already released")
    }

    async fn set_microphone_enabled(&mut self, _enabled: bool) -> Result<()> {
        anyhow::bail!("transport already released")
    }

    async fn disconnect(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "released"
    }
}

impl Drop for SessionConnection {
    fn drop(&mut self) {
        if self.state == ConnectionState::Idle {
            return;
        }

        warn!(
            "Session connection dropped while {:?}, releasing transport",
            self.state
        );

        self.events = None;
        let mut transport = std::mem::replace(&mut self.transport, Box::new(ReleasedTransport));

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if let Err(e) = transport.disconnect().await {
                        warn!("Transport teardown failed: {:#}", e);
                    }
                });
            }
            Err(_) => warn!("No runtime available, transport dropped without disconnect"),
        }
    }
}
