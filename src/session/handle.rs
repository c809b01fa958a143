use super::controller::SessionController;
use super::state::SessionSnapshot;
use crate::error::SessionError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

enum SessionCommand {
    Connect {
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    Disconnect {
        reply: oneshot::Sender<()>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Cloneable handle to a controller running on its own task.
///
/// Commands are applied one at a time, interleaved with transport events in
/// arrival order. Dropping every handle tears the session down.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    /// Start a session; a no-op while one is connecting or connected
    pub async fn connect(&self) -> Result<(), SessionError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(SessionCommand::Connect { reply })
            .await
            .map_err(|_| SessionError::ControllerStopped)?;

        response.await.map_err(|_| SessionError::ControllerStopped)?
    }

    /// End the session; a no-op when there is none
    pub async fn disconnect(&self) {
        let (reply, response) = oneshot::channel();
        if self
            .commands
            .send(SessionCommand::Disconnect { reply })
            .await
            .is_err()
        {
            debug!("Disconnect ignored: controller already stopped");
            return;
        }
        let _ = response.await;
    }

    /// Tear the session down and stop the controller task
    pub async fn shutdown(&self) {
        let (reply, response) = oneshot::channel();
        if self
            .commands
            .send(SessionCommand::Shutdown { reply })
            .await
            .is_err()
        {
            return;
        }
        let _ = response.await;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }
}

/// Commands that arrived while a connect attempt was in flight
#[derive(Default)]
struct Deferred {
    disconnects: Vec<oneshot::Sender<()>>,
    shutdown: Option<oneshot::Sender<()>>,
    handles_dropped: bool,
}

impl Deferred {
    fn teardown_requested(&self) -> bool {
        !self.disconnects.is_empty() || self.shutdown.is_some() || self.handles_dropped
    }

    fn stops_controller(&self) -> bool {
        self.shutdown.is_some() || self.handles_dropped
    }
}

impl SessionController {
    /// Run the controller on a new task
    pub fn spawn(self) -> (SessionHandle, JoinHandle<()>) {
        let (commands, receiver) = mpsc::channel(16);
        let handle = SessionHandle {
            commands,
            snapshots: self.subscribe(),
        };

        let task = tokio::spawn(self.run(receiver));

        (handle, task)
    }

    async fn run(mut self, mut commands: mpsc::Receiver<SessionCommand>) {
        info!("Session controller started");

        let mut shutdown_reply = None;

        loop {
            tokio::select! {
                command = commands.recv() => {
                    // Events the transport delivered before this command go first
                    self.process_pending_events().await;

                    match command {
                        Some(SessionCommand::Connect { reply }) => {
                            let (result, deferred) = self.connect_interruptible(&mut commands).await;
                            let _ = reply.send(result);

                            if deferred.stops_controller() {
                                shutdown_reply = deferred.shutdown;
                                break;
                            }
                        }
                        Some(SessionCommand::Disconnect { reply }) => {
                            self.disconnect().await;
                            let _ = reply.send(());
                        }
                        Some(SessionCommand::Shutdown { reply }) => {
                            shutdown_reply = Some(reply);
                            break;
                        }
                        None => {
                            info!("All session handles dropped");
                            break;
                        }
                    }
                }
                event = self.next_event() => match event {
                    Some(event) => self.handle_transport_event(event).await,
                    None => self.handle_stream_closed().await,
                },
            }
        }

        self.disconnect().await;

        if let Some(reply) = shutdown_reply {
            let _ = reply.send(());
        }

        info!("Session controller stopped");
    }

    /// Connect while still answering commands.
    ///
    /// A second connect is answered at once as a no-op. Disconnect, shutdown
    /// or losing every handle is honored once the attempt settles, tearing
    /// down whatever it established.
    async fn connect_interruptible(
        &mut self,
        commands: &mut mpsc::Receiver<SessionCommand>,
    ) -> (Result<(), SessionError>, Deferred) {
        let mut deferred = Deferred::default();

        let result = {
            let attempt = self.connect();
            tokio::pin!(attempt);

            loop {
                tokio::select! {
                    result = &mut attempt => break result,
                    command = commands.recv(), if !deferred.handles_dropped => match command {
                        Some(SessionCommand::Connect { reply }) => {
                            debug!("Connect ignored: attempt already in progress");
                            let _ = reply.send(Ok(()));
                        }
                        Some(SessionCommand::Disconnect { reply }) => {
                            info!("Disconnect requested while connecting, deferring");
                            deferred.disconnects.push(reply);
                        }
                        Some(SessionCommand::Shutdown { reply }) => {
                            deferred.shutdown = Some(reply);
                        }
                        None => deferred.handles_dropped = true,
                    },
                }
            }
        };

        if deferred.teardown_requested() {
            self.process_pending_events().await;
            self.disconnect().await;
            for reply in deferred.disconnects.drain(..) {
                let _ = reply.send(());
            }
        }

        (result, deferred)
    }
}
