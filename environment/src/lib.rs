//! This crate aims to provide a common set of tools that can be used to create a "environment" to
//! run the beacon node. This allows for the unification of creating tokio runtimes, loggers and
//! eth2 specifications in one place.

use futures::channel::mpsc::{channel, Receiver, Sender};
use futures::prelude::*;
use slog::{error, info, o, Drain, Level, Logger};
use sloggers::{null::NullLoggerBuilder, Build};
use std::sync::Arc;
use task_executor::{advance_node_status, NodeStatus, ShutdownReason, TaskExecutor};
use tokio::runtime::{Builder as RuntimeBuilder, Runtime};
use types::{ChainSpec, EthSpec, MainnetEthSpec, MinimalEthSpec};

/// The maximum time in seconds the client will wait for all internal tasks to shutdown.
const MAXIMUM_SHUTDOWN_TIME: u64 = 15;

/// Builds an `Environment`.
pub struct EnvironmentBuilder<E: EthSpec> {
    runtime: Option<Arc<Runtime>>,
    log: Option<Logger>,
    eth_spec_instance: E,
    spec: ChainSpec,
}

impl EnvironmentBuilder<MainnetEthSpec> {
    pub fn mainnet() -> Self {
        Self {
            runtime: None,
            log: None,
            eth_spec_instance: MainnetEthSpec,
            spec: MainnetEthSpec::default_spec(),
        }
    }
}

impl EnvironmentBuilder<MinimalEthSpec> {
    pub fn minimal() -> Self {
        Self {
            runtime: None,
            log: None,
            eth_spec_instance: MinimalEthSpec,
            spec: MinimalEthSpec::default_spec(),
        }
    }
}

impl<E: EthSpec> EnvironmentBuilder<E> {
    /// Specifies that a single-threaded tokio runtime should be used.
    ///
    /// The node's concurrency model is cooperative: services interleave only
    /// at await points, so one OS thread drives every loop.
    pub fn single_thread_tokio_runtime(mut self) -> Result<Self, String> {
        self.runtime = Some(Arc::new(
            RuntimeBuilder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| format!("Failed to start runtime: {:?}", e))?,
        ));
        Ok(self)
    }

    /// Specifies that all logs should be sent to `null` (i.e., ignored).
    pub fn null_logger(mut self) -> Result<Self, String> {
        self.log = Some(
            NullLoggerBuilder
                .build()
                .map_err(|e| format!("Failed to start null logger: {:?}", e))?,
        );
        Ok(self)
    }

    /// Specifies that the `slog` asynchronous logger should be used. Ideal
    /// for production.
    pub fn async_logger(mut self, debug_level: &str) -> Result<Self, String> {
        let decorator = slog_term::TermDecorator::new().build();
        let drain = slog_term::FullFormat::new(decorator).build().fuse();
        let drain = slog_async::Async::new(drain).build();

        let drain = match debug_level {
            "info" => drain.filter_level(Level::Info),
            "debug" => drain.filter_level(Level::Debug),
            "trace" => drain.filter_level(Level::Trace),
            "warn" => drain.filter_level(Level::Warning),
            "error" => drain.filter_level(Level::Error),
            "crit" => drain.filter_level(Level::Critical),
            unknown => return Err(format!("Unknown debug-level: {}", unknown)),
        };

        self.log = Some(Logger::root(drain.fuse(), o!()));
        Ok(self)
    }

    /// Consumes the builder, returning an `Environment`.
    pub fn build(self) -> Result<Environment<E>, String> {
        let (signal, exit) = exit_future::signal();
        let (signal_tx, signal_rx) = channel(1);
        Ok(Environment {
            runtime: self
                .runtime
                .ok_or("Cannot build environment without runtime")?,
            signal_tx,
            signal_rx: Some(signal_rx),
            signal: Some(signal),
            exit,
            log: self.log.ok_or("Cannot build environment without log")?,
            eth_spec_instance: self.eth_spec_instance,
            spec: self.spec,
        })
    }
}

/// An execution context that can be used by a service.
///
/// Distinct from an `Environment` because a `Context` is not able to give a
/// mutable reference to a `Runtime`, instead it only has access to a `Handle`.
#[derive(Clone)]
pub struct RuntimeContext<E: EthSpec> {
    pub executor: TaskExecutor,
    pub eth_spec_instance: E,
    pub spec: ChainSpec,
}

impl<E: EthSpec> RuntimeContext<E> {
    /// Returns a sub-context of this context, with a logger annotated with
    /// the name of the service.
    pub fn service_context(&self, service_name: &'static str) -> Self {
        Self {
            executor: self.executor.service_executor(service_name),
            eth_spec_instance: self.eth_spec_instance,
            spec: self.spec.clone(),
        }
    }

    pub fn log(&self) -> &Logger {
        self.executor.log()
    }
}

/// An environment where the node can run.
pub struct Environment<E: EthSpec> {
    runtime: Arc<Runtime>,
    /// Sender to request shutting down.
    signal_tx: Sender<ShutdownReason>,
    signal_rx: Option<Receiver<ShutdownReason>>,
    signal: Option<exit_future::Signal>,
    exit: exit_future::Exit,
    log: Logger,
    eth_spec_instance: E,
    spec: ChainSpec,
}

impl<E: EthSpec> Environment<E> {
    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    /// Returns a `Context` where a logger already exists.
    pub fn core_context(&self) -> RuntimeContext<E> {
        RuntimeContext {
            executor: TaskExecutor::new(
                self.runtime.handle().clone(),
                self.exit.clone(),
                self.signal_tx.clone(),
                self.log.clone(),
            ),
            eth_spec_instance: self.eth_spec_instance,
            spec: self.spec.clone(),
        }
    }

    pub fn core_log(&self) -> Logger {
        self.log.clone()
    }

    pub fn eth2_spec(&self) -> &ChainSpec {
        &self.spec
    }

    /// Block the current thread until a shutdown is requested, either by a
    /// task sending a `ShutdownReason` or by the process receiving a
    /// termination signal.
    pub fn block_until_shutdown_requested(&mut self) -> Result<ShutdownReason, String> {
        let mut signal_rx = self
            .signal_rx
            .take()
            .ok_or("Cannot wait for shutdown twice")?;

        let (ctrlc_tx, mut ctrlc_rx) = channel::<()>(1);
        let log = self.log.clone();
        ctrlc::set_handler(move || {
            advance_node_status(NodeStatus::Stopping);
            let mut tx = ctrlc_tx.clone();
            let _ = tx.try_send(());
        })
        .map_err(|e| format!("Could not set ctrlc handler: {:?}", e))?;

        self.runtime.block_on(async {
            futures::select! {
                _ = ctrlc_rx.next() => {
                    info!(log, "Shutting down..."; "reason" => "signal received");
                    Ok(ShutdownReason::Success("received termination signal"))
                }
                reason = signal_rx.next() => match reason {
                    Some(reason) => {
                        info!(log, "Shutting down..."; "reason" => reason.message());
                        Ok(reason)
                    }
                    None => Err("Internal shutdown channel unexpectedly closed".to_string()),
                },
            }
        })
    }

    /// Fire the exit signal to stop all spawned services, then shut the
    /// runtime down once idle or after the timeout.
    pub fn fire_signal(&mut self) {
        if let Some(signal) = self.signal.take() {
            if signal.fire().is_err() {
                error!(self.log, "Failed to fire exit signal");
            }
        }
    }

    pub fn shutdown_on_idle(self) {
        match Arc::try_unwrap(self.runtime) {
            Ok(runtime) => {
                runtime.shutdown_timeout(std::time::Duration::from_secs(MAXIMUM_SHUTDOWN_TIME))
            }
            Err(_) => error!(
                self.log,
                "Failed to obtain runtime access to shutdown gracefully"
            ),
        }
    }
}
