//! Thread boundary between the session (async) and the UI.
//!
//! The UI never blocks on the engine or the network. [`LabBridge::spawn`]
//! starts a worker thread running a current-thread tokio runtime, which loads
//! the engine, reports the session back to the UI, and then runs each async
//! action as its own task so a slow share does not hold up a compile.
//!
//! Synchronous actions (edits, insertion, view changes) are called directly on
//! the shared [`SessionController`] from the UI thread.

use crate::error::{ErrorKind, LabError, Result};
use crate::session::{ActionOutcome, SessionController};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::future::Future;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::mpsc;

/// Async actions sent from the UI to the worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabCommand {
    Compile,
    Execute,
    Normalise,
    Share,
    /// Stop the worker; in-flight actions are dropped
    Shutdown,
}

/// Messages sent from the worker to the UI
#[derive(Clone)]
pub enum LabEvent {
    /// The engine loaded and the session is ready
    Loaded(Arc<SessionController>),
    /// The engine could not be loaded
    LoadFailed(String),
    /// An async action finished
    Finished {
        command: LabCommand,
        outcome: ActionOutcome,
    },
}

impl std::fmt::Debug for LabEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LabEvent::Loaded(_) => f.write_str("Loaded"),
            LabEvent::LoadFailed(e) => f.debug_tuple("LoadFailed").field(e).finish(),
            LabEvent::Finished { command, outcome } => f
                .debug_struct("Finished")
                .field("command", command)
                .field("outcome", outcome)
                .finish(),
        }
    }
}

/// Called by the worker after every event, typically to request a repaint
pub type Waker = Arc<dyn Fn() + Send + Sync>;

/// UI-side handle for the session worker
pub struct LabBridge {
    cmd_tx: mpsc::UnboundedSender<LabCommand>,
    event_rx: Receiver<LabEvent>,
    worker: Option<JoinHandle<()>>,
}

impl LabBridge {
    /// Start the worker thread
    ///
    /// `launch` runs on the worker's runtime and produces the session.
    /// Commands sent before it finishes are queued.
    pub fn spawn<F, Fut>(launch: F, waker: Waker) -> Result<Self>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<SessionController>> + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = unbounded();

        let worker = std::thread::Builder::new()
            .name("streamlab-session".to_string())
            .spawn(move || run_worker(launch, cmd_rx, event_tx, waker))
            .map_err(|e| LabError::Io(e).with_context("failed to start session worker"))?;

        Ok(Self {
            cmd_tx,
            event_rx,
            worker: Some(worker),
        })
    }

    /// Queue an async action; returns false if the worker has stopped
    pub fn send(&self, cmd: LabCommand) -> bool {
        match self.cmd_tx.send(cmd) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Session worker is gone, dropped {:?}", e.0);
                false
            }
        }
    }

    /// Drain all pending events
    pub fn drain(&self) -> Vec<LabEvent> {
        self.event_rx.try_iter().collect()
    }

    /// Wait for the next event
    pub fn recv_timeout(&self, timeout: Duration) -> Option<LabEvent> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn shutdown(&mut self) {
        let _ = self.cmd_tx.send(LabCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("Session worker panicked");
            }
        }
    }
}

impl Drop for LabBridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker<F, Fut>(
    launch: F,
    mut cmd_rx: mpsc::UnboundedReceiver<LabCommand>,
    event_tx: Sender<LabEvent>,
    waker: Waker,
) where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<SessionController>>,
{
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to build session runtime: {}", e);
            let _ = event_tx.send(LabEvent::LoadFailed(e.to_string()));
            waker();
            return;
        }
    };

    runtime.block_on(async move {
        let session = match launch().await {
            Ok(session) => Arc::new(session),
            Err(e) => {
                tracing::error!("Failed to load engine: {}", e);
                let _ = event_tx.send(LabEvent::LoadFailed(e.to_string()));
                waker();
                return;
            }
        };
        let _ = event_tx.send(LabEvent::Loaded(session.clone()));
        waker();

        while let Some(command) = cmd_rx.recv().await {
            if command == LabCommand::Shutdown {
                break;
            }
            tracing::debug!("Running {:?}", command);

            let session = session.clone();
            let event_tx = event_tx.clone();
            let waker = waker.clone();
            tokio::spawn(async move {
                let outcome = run_command(&session, command).await;
                let _ = event_tx.send(LabEvent::Finished { command, outcome });
                waker();
            });
        }
        tracing::info!("Session worker stopped");
    });
}

async fn run_command(session: &SessionController, command: LabCommand) -> ActionOutcome {
    match command {
        LabCommand::Compile => session.request_compile().await,
        LabCommand::Execute => session.request_execute().await,
        LabCommand::Normalise => session.request_normalise().await,
        LabCommand::Share => match session.request_share().await {
            Some(_) => ActionOutcome::Completed,
            None => ActionOutcome::Failed(ErrorKind::Transport),
        },
        LabCommand::Shutdown => ActionOutcome::NoChange,
    }
}
