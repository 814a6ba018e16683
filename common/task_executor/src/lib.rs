mod status;

pub use status::{advance_node_status, node_status, NodeStatus};

use futures::channel::mpsc::Sender;
use futures::prelude::*;
use slog::{debug, o};

/// Provides a reason when the node is shut down.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ShutdownReason {
    /// The node shut down successfully.
    Success(&'static str),
    /// The node shut down due to an error condition.
    Failure(&'static str),
}

impl ShutdownReason {
    pub fn message(&self) -> &'static str {
        match self {
            ShutdownReason::Success(msg) => msg,
            ShutdownReason::Failure(msg) => msg,
        }
    }
}

/// A wrapper over a runtime handle which can spawn async tasks.
///
/// Tasks spawned here terminate early when the global `exit` future
/// resolves, so a single signal tears down every service loop.
#[derive(Clone)]
pub struct TaskExecutor {
    handle: tokio::runtime::Handle,
    /// The receiving side of the exit future fired on shutdown.
    exit: exit_future::Exit,
    /// Sender given to tasks so they can request the node shuts down.
    signal_tx: Sender<ShutdownReason>,
    log: slog::Logger,
}

impl TaskExecutor {
    pub fn new(
        handle: tokio::runtime::Handle,
        exit: exit_future::Exit,
        signal_tx: Sender<ShutdownReason>,
        log: slog::Logger,
    ) -> Self {
        Self {
            handle,
            exit,
            signal_tx,
            log,
        }
    }

    /// Spawn a future on the runtime, cancelled when the executor's exit
    /// future resolves.
    pub fn spawn(&self, task: impl Future<Output = ()> + Send + 'static, name: &'static str) {
        let exit = self.exit.clone();
        let log = self.log.clone();

        let future = async move {
            if exit.until(Box::pin(task)).await.is_none() {
                debug!(log, "Async task shutdown, exit received"; "task" => name);
            }
        };

        self.handle.spawn(future);
    }

    /// Spawn a future that must run to completion regardless of shutdown.
    pub fn spawn_without_exit(
        &self,
        task: impl Future<Output = ()> + Send + 'static,
        _name: &'static str,
    ) {
        self.handle.spawn(task);
    }

    /// A channel on which tasks may request a node-wide shutdown.
    pub fn shutdown_sender(&self) -> Sender<ShutdownReason> {
        self.signal_tx.clone()
    }

    pub fn runtime_handle(&self) -> &tokio::runtime::Handle {
        &self.handle
    }

    pub fn exit(&self) -> exit_future::Exit {
        self.exit.clone()
    }

    pub fn log(&self) -> &slog::Logger {
        &self.log
    }

    /// A child executor whose logger carries the service name.
    pub fn service_executor(&self, service: &'static str) -> Self {
        Self {
            handle: self.handle.clone(),
            exit: self.exit.clone(),
            signal_tx: self.signal_tx.clone(),
            log: self.log.new(o!("service" => service)),
        }
    }
}
