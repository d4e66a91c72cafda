//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::io::{self, Write};
use std::net::{SocketAddr, TcpListener};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use calculator_service::lifecycle::{Coordinator, ShutdownSignal};
use calculator_service::net::{ListenerError, ListenerKind, Serve, ServeFuture};
use calculator_service::observability::logging::Logger;

/// An address on loopback that was free a moment ago.
pub fn free_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// Coordinator with short windows so tests stay fast.
pub fn coordinator(logger: Logger) -> Coordinator {
    Coordinator::new()
        .with_logger(logger)
        .with_startup_grace(Duration::from_millis(200))
        .with_shutdown_timeout(Duration::from_millis(500))
}

/// In-memory log sink; each line is one JSON record.
#[derive(Clone, Default)]
pub struct Buffer(Arc<Mutex<Vec<u8>>>);

impl Buffer {
    pub fn logger(&self) -> Logger {
        Logger::builder().writer(self.clone()).build()
    }

    pub fn records(&self) -> Vec<serde_json::Value> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.records()
            .iter()
            .filter_map(|record| record["message"].as_str().map(str::to_string))
            .collect()
    }
}

impl Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A listener that never returns, not even on shutdown.
pub struct Hanging {
    pub addr: SocketAddr,
}

impl Serve for Hanging {
    fn kind(&self) -> ListenerKind {
        ListenerKind::Http
    }

    fn address(&self) -> SocketAddr {
        self.addr
    }

    fn serve(self: Box<Self>, _shutdown: ShutdownSignal) -> ServeFuture {
        Box::pin(std::future::pending())
    }
}

/// A listener that stops as soon as shutdown is signalled.
pub struct Idle {
    pub addr: SocketAddr,
}

impl Serve for Idle {
    fn kind(&self) -> ListenerKind {
        ListenerKind::Rpc
    }

    fn address(&self) -> SocketAddr {
        self.addr
    }

    fn serve(self: Box<Self>, shutdown: ShutdownSignal) -> ServeFuture {
        Box::pin(async move {
            shutdown.recv().await;
            Ok(())
        })
    }
}

/// A listener that fails after `delay`.
pub struct Failing {
    pub addr: SocketAddr,
    pub delay: Duration,
}

impl Serve for Failing {
    fn kind(&self) -> ListenerKind {
        ListenerKind::Http
    }

    fn address(&self) -> SocketAddr {
        self.addr
    }

    fn serve(self: Box<Self>, _shutdown: ShutdownSignal) -> ServeFuture {
        let addr = self.addr;
        let delay = self.delay;
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            Err(ListenerError::Serve {
                kind: ListenerKind::Http,
                addr,
                source: "connection reset by test".into(),
            })
        })
    }
}
