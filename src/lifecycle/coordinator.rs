//! Multi-listener start/stop coordinator.
//!
//! # Responsibilities
//! - Own every HTTP and RPC listener of the process
//! - Start them concurrently and surface the first failure inside a grace window
//! - Stop them concurrently under one shared deadline
//!
//! # Design Decisions
//! - One task per listener; failures flow through a bounded channel sized to
//!   the listener count, so no task ever blocks on reporting
//! - A listener failing after the grace window is not restarted; it is logged
//!   and counted in `lifecycle_listener_failures_total`
//! - A listener still running at the shutdown deadline is aborted and reported
//!   on its own; the others are unaffected

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use futures_util::future::join_all;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use super::shutdown::Shutdown;
use super::signals;
use crate::net::{HttpEndpoint, ListenerError, ListenerKind, RpcEndpoint, Serve};
use crate::observability::logging::{Entry, Logger};
use crate::observability::metrics;

/// How long `start` waits for an early listener failure.
pub const DEFAULT_STARTUP_GRACE: Duration = Duration::from_secs(2);

/// How long `stop` waits for listeners to drain.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("already started")]
    AlreadyStarted,

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("{kind} server on {addr} did not stop before the shutdown deadline")]
    ShutdownTimeout { kind: ListenerKind, addr: SocketAddr },

    #[error("{kind} server on {addr} terminated abnormally: {reason}")]
    Aborted {
        kind: ListenerKind,
        addr: SocketAddr,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    NotStarted,
    Started,
    Stopped,
}

struct Running {
    kind: ListenerKind,
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

/// Starts and stops a set of listeners as one unit.
///
/// ```no_run
/// # async fn run(http: calculator_service::net::HttpEndpoint, rpc: calculator_service::net::RpcEndpoint)
/// #     -> Result<(), calculator_service::lifecycle::LifecycleError> {
/// use calculator_service::lifecycle::Coordinator;
///
/// let mut coordinator = Coordinator::new().with_http(http).with_rpc(rpc);
/// coordinator.run_until_interrupt().await
/// # }
/// ```
pub struct Coordinator {
    pending: Vec<Box<dyn Serve>>,
    running: Vec<Running>,
    state: State,
    grace: Duration,
    shutdown_timeout: Duration,
    shutdown: Shutdown,
    logger: Logger,
}

impl Coordinator {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            running: Vec::new(),
            state: State::NotStarted,
            grace: DEFAULT_STARTUP_GRACE,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            shutdown: Shutdown::new(),
            logger: Logger::discard(),
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_startup_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn with_http(self, endpoint: HttpEndpoint) -> Self {
        self.with_listener(endpoint)
    }

    pub fn with_rpc(self, endpoint: RpcEndpoint) -> Self {
        self.with_listener(endpoint)
    }

    /// Register any listener. Ignored once started.
    pub fn with_listener(mut self, listener: impl Serve) -> Self {
        if self.state == State::NotStarted {
            self.pending.push(Box::new(listener));
        }
        self
    }

    /// Handle that triggers the same shutdown as [`Coordinator::stop`] without waiting.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Number of registered listeners, running or not.
    pub fn listener_count(&self) -> usize {
        self.pending.len() + self.running.len()
    }

    /// Start every listener and wait for the grace window.
    ///
    /// Returns the first failure seen inside the window. Listeners that did
    /// start keep running; call [`Coordinator::stop`] to release them.
    pub async fn start(&mut self) -> Result<(), LifecycleError> {
        if self.state != State::NotStarted {
            return Err(LifecycleError::AlreadyStarted);
        }
        self.state = State::Started;

        let listeners = std::mem::take(&mut self.pending);
        if listeners.is_empty() {
            self.logger.notice("no listeners registered");
            return Ok(());
        }

        let (errors_tx, mut errors_rx) = mpsc::channel(listeners.len());
        for listener in listeners {
            let kind = listener.kind();
            let addr = listener.address();
            let logger = self.logger.with("kind", kind.as_str()).with("addr", addr);
            let shutdown = self.shutdown.subscribe();
            let errors = errors_tx.clone();

            logger.info(format!("starting {kind} server"));
            let handle = tokio::spawn(async move {
                let err = match listener.serve(shutdown).await {
                    Ok(()) => {
                        logger.info(format!("{kind} server stopped"));
                        return;
                    }
                    Err(err) => err,
                };
                if let Err(send_err) = errors.try_send(err) {
                    let err = match send_err {
                        mpsc::error::TrySendError::Full(err) | mpsc::error::TrySendError::Closed(err) => err,
                    };
                    metrics::record_listener_failure(kind.as_str());
                    logger.error(Entry::error_with_context(err, "listener failed after startup"));
                }
            });
            self.running.push(Running { kind, addr, handle });
        }
        drop(errors_tx);

        tokio::select! {
            Some(err) = errors_rx.recv() => {
                while let Ok(other) = errors_rx.try_recv() {
                    self.logger.error(Entry::error_with_context(other, "additional listener failure"));
                }
                Err(err.into())
            }
            _ = time::sleep(self.grace) => Ok(()),
        }
    }

    /// Gracefully stop every listener, waiting at most the shutdown timeout.
    ///
    /// Every listener is attempted; the first error is returned.
    pub async fn stop(&mut self) -> Result<(), LifecycleError> {
        if self.state == State::Stopped {
            return Ok(());
        }
        self.state = State::Stopped;
        self.shutdown.trigger();

        let deadline = Instant::now() + self.shutdown_timeout;
        let running = std::mem::take(&mut self.running);
        let stops = running.into_iter().map(|Running { kind, addr, mut handle }| {
            let logger = self.logger.with("kind", kind.as_str()).with("addr", addr);
            async move {
                logger.info(format!("stopping {kind} server"));
                match time::timeout_at(deadline, &mut handle).await {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(join_err)) => Err(LifecycleError::Aborted {
                        kind,
                        addr,
                        reason: join_err.to_string(),
                    }),
                    Err(_) => {
                        handle.abort();
                        logger.warn(format!("{kind} server did not drain in time, aborted"));
                        Err(LifecycleError::ShutdownTimeout { kind, addr })
                    }
                }
            }
        });

        let results = join_all(stops).await;
        results.into_iter().find_map(Result::err).map_or(Ok(()), Err)
    }

    /// Start, wait for `signal`, then stop.
    pub async fn run_until<F: Future<Output = ()>>(&mut self, signal: F) -> Result<(), LifecycleError> {
        self.start().await?;
        self.logger.info("startup complete");
        signal.await;
        self.logger.info("shutting down");
        self.stop().await
    }

    /// Start, wait for SIGINT or SIGTERM, then stop.
    pub async fn run_until_interrupt(&mut self) -> Result<(), LifecycleError> {
        let logger = self.logger.clone();
        self.run_until(async move {
            match signals::interrupt().await {
                Ok(signal) => logger.info(format!("received {signal}")),
                Err(err) => logger.error(Entry::error_with_context(err, "waiting for interrupt")),
            }
        })
        .await
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}
