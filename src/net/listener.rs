//! Listenable servers.
//!
//! # Responsibilities
//! - Bind the configured address
//! - Serve HTTP (axum) or RPC (tonic) until failure or shutdown
//! - Report bind failures and runtime failures as [`ListenerError`]
//!
//! # Design Decisions
//! - Binding happens inside `serve`, so bind failures travel the same path as
//!   runtime failures
//! - TLS is optional per endpoint and handled transparently

use std::fmt;
use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use futures_util::future::BoxFuture;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::service::Routes;
use tonic::transport::{Server, ServerTlsConfig};

use crate::lifecycle::ShutdownSignal;
use crate::observability::logging::BoxError;

/// Transport spoken by a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    Http,
    Rpc,
}

impl ListenerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ListenerKind::Http => "http",
            ListenerKind::Rpc => "grpc",
        }
    }
}

impl fmt::Display for ListenerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("failed to start {kind} server: {addr}: {source}")]
    Start {
        kind: ListenerKind,
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    /// The server stopped with an error after binding.
    #[error("{kind} server on {addr} failed: {source}")]
    Serve {
        kind: ListenerKind,
        addr: SocketAddr,
        #[source]
        source: BoxError,
    },
}

pub type ServeFuture = BoxFuture<'static, Result<(), ListenerError>>;

/// A server the lifecycle coordinator can start and stop.
pub trait Serve: Send + 'static {
    fn kind(&self) -> ListenerKind;

    fn address(&self) -> SocketAddr;

    /// Bind and serve until `shutdown` resolves, then drain gracefully.
    fn serve(self: Box<Self>, shutdown: ShutdownSignal) -> ServeFuture;
}

/// An axum router bound to an address.
pub struct HttpEndpoint {
    addr: SocketAddr,
    router: Router,
    tls: Option<RustlsConfig>,
}

impl HttpEndpoint {
    pub fn new(addr: SocketAddr, router: Router) -> Self {
        Self {
            addr,
            router,
            tls: None,
        }
    }

    pub fn with_tls(mut self, tls: Option<RustlsConfig>) -> Self {
        self.tls = tls;
        self
    }
}

impl Serve for HttpEndpoint {
    fn kind(&self) -> ListenerKind {
        ListenerKind::Http
    }

    fn address(&self) -> SocketAddr {
        self.addr
    }

    fn serve(self: Box<Self>, shutdown: ShutdownSignal) -> ServeFuture {
        let HttpEndpoint { addr, router, tls } = *self;
        let start_err = move |source| ListenerError::Start {
            kind: ListenerKind::Http,
            addr,
            source,
        };
        let serve_err = move |source: std::io::Error| ListenerError::Serve {
            kind: ListenerKind::Http,
            addr,
            source: source.into(),
        };

        Box::pin(async move {
            match tls {
                None => {
                    let listener = TcpListener::bind(addr).await.map_err(start_err)?;
                    axum::serve(listener, router)
                        .with_graceful_shutdown(shutdown.recv())
                        .await
                        .map_err(serve_err)
                }
                Some(config) => {
                    let listener = std::net::TcpListener::bind(addr).map_err(start_err)?;
                    listener.set_nonblocking(true).map_err(start_err)?;

                    let handle = axum_server::Handle::new();
                    let server = axum_server::from_tcp_rustls(listener, config)
                        .handle(handle.clone())
                        .serve(router.into_make_service());
                    drain_on_shutdown(server, handle, shutdown).await.map_err(serve_err)
                }
            }
        })
    }
}

/// Drive `server` to completion, asking `handle` to drain once `shutdown` fires.
///
/// The signal is released as soon as `server` returns, whether or not shutdown fired.
async fn drain_on_shutdown<F: Future>(server: F, handle: axum_server::Handle, shutdown: ShutdownSignal) -> F::Output {
    tokio::pin!(server);
    tokio::select! {
        output = &mut server => output,
        () = shutdown.recv() => {
            handle.graceful_shutdown(None);
            server.await
        }
    }
}

/// A set of tonic services bound to an address.
pub struct RpcEndpoint {
    addr: SocketAddr,
    routes: Routes,
    tls: Option<ServerTlsConfig>,
}

impl RpcEndpoint {
    pub fn new(addr: SocketAddr, routes: Routes) -> Self {
        Self {
            addr,
            routes,
            tls: None,
        }
    }

    pub fn with_tls(mut self, tls: Option<ServerTlsConfig>) -> Self {
        self.tls = tls;
        self
    }
}

impl Serve for RpcEndpoint {
    fn kind(&self) -> ListenerKind {
        ListenerKind::Rpc
    }

    fn address(&self) -> SocketAddr {
        self.addr
    }

    fn serve(self: Box<Self>, shutdown: ShutdownSignal) -> ServeFuture {
        let RpcEndpoint { addr, routes, tls } = *self;
        let serve_err = move |source: tonic::transport::Error| ListenerError::Serve {
            kind: ListenerKind::Rpc,
            addr,
            source: source.into(),
        };

        Box::pin(async move {
            let listener = TcpListener::bind(addr)
                .await
                .map_err(|source| ListenerError::Start {
                    kind: ListenerKind::Rpc,
                    addr,
                    source,
                })?;

            let mut server = Server::builder();
            if let Some(tls) = tls {
                server = server.tls_config(tls).map_err(serve_err)?;
            }

            server
                .add_routes(routes)
                .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown.recv())
                .await
                .map_err(serve_err)
        })
    }
}
