use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::models::error::SessionError;
use crate::models::report::{SessionReport, SessionSnapshot, StartOutcome};
use crate::models::state::SessionStatus;

use super::state_machine::SessionStateMachine;

enum SessionCommand {
    Start(oneshot::Sender<Result<StartOutcome, SessionError>>),
    Stop(oneshot::Sender<Result<SessionReport, SessionError>>),
    Snapshot(oneshot::Sender<SessionSnapshot>),
    Authorize(oneshot::Sender<()>),
    AcceptCallback {
        query: String,
        reply: oneshot::Sender<bool>,
    },
    Shutdown(oneshot::Sender<()>),
}

/// Cloneable front end for a spawned session controller.
///
/// Every call is a request/reply round trip; once the controller has
/// stopped they fail with `SessionError::ControllerClosed`.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
    status: watch::Receiver<SessionStatus>,
}

impl SessionHandle {
    pub async fn start(&self) -> Result<StartOutcome, SessionError> {
        self.request(SessionCommand::Start).await?
    }

    pub async fn stop(&self) -> Result<SessionReport, SessionError> {
        self.request(SessionCommand::Stop).await?
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        self.request(SessionCommand::Snapshot).await
    }

    pub async fn authorize(&self) -> Result<(), SessionError> {
        self.request(SessionCommand::Authorize).await
    }

    pub async fn accept_callback(&self, query: impl Into<String>) -> Result<bool, SessionError> {
        let query = query.into();
        self.request(|reply| SessionCommand::AcceptCallback { query, reply })
            .await
    }

    /// Release the camera and end the controller loop.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.request(SessionCommand::Shutdown).await
    }

    pub fn status(&self) -> watch::Receiver<SessionStatus> {
        self.status.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(command(reply))
            .await
            .map_err(|_| SessionError::ControllerClosed)?;
        rx.await.map_err(|_| SessionError::ControllerClosed)
    }
}

/// Move `machine` onto its own task and return a handle to drive it.
pub fn spawn(machine: SessionStateMachine) -> (SessionHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(machine.config().command_capacity.max(1));
    let status = machine.subscribe_status();
    let task = tokio::spawn(run(machine, rx));
    (SessionHandle { tx, status }, task)
}

/// Controller loop. Commands, tick reports and SDK events are handled one at
/// a time, so the state machine never sees concurrent mutation.
async fn run(mut machine: SessionStateMachine, mut commands: mpsc::Receiver<SessionCommand>) {
    machine.prepare().await;
    log::info!("Session controller running");

    loop {
        tokio::select! {
            biased;

            command = commands.recv() => {
                let Some(command) = command else {
                    log::debug!("All session handles dropped");
                    machine.shutdown().await;
                    break;
                };
                if let SessionCommand::Shutdown(reply) = command {
                    machine.shutdown().await;
                    let _ = reply.send(());
                    break;
                }
                dispatch(&mut machine, command).await;
            }

            event = machine.next_event() => machine.process(event),
        }
    }

    log::info!("Session controller stopped");
}

async fn dispatch(machine: &mut SessionStateMachine, command: SessionCommand) {
    // Send errors mean the caller stopped waiting; nothing to do.
    match command {
        SessionCommand::Start(reply) => {
            let _ = reply.send(machine.start().await);
        }
        SessionCommand::Stop(reply) => {
            let _ = reply.send(machine.stop().await);
        }
        SessionCommand::Snapshot(reply) => {
            let _ = reply.send(machine.snapshot());
        }
        SessionCommand::Authorize(reply) => {
            machine.authorize();
            let _ = reply.send(());
        }
        SessionCommand::AcceptCallback { query, reply } => {
            let _ = reply.send(machine.accept_callback(&query).await);
        }
        SessionCommand::Shutdown(reply) => {
            machine.shutdown().await;
            let _ = reply.send(());
        }
    }
}
