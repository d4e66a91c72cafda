//! Dependency status registry.
//!
//! # Responsibilities
//! - Hold the providers registered at startup
//! - Check all of them on demand and build the status report
//! - Serve the report as JSON

use std::sync::{Arc, PoisonError, RwLock};

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use futures_util::future::BoxFuture;
use serde::Serialize;

use crate::observability::logging::BoxError;
use crate::observability::metrics;

/// Something this service depends on and can check.
pub trait StatusProvider: Send + Sync {
    /// Name shown in the status report.
    fn name(&self) -> &str;

    /// `Ok` when usable, otherwise the reason it is not.
    fn status(&self) -> BoxFuture<'_, Result<(), BoxError>>;
}

/// One entry of the status report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyStatus {
    pub name: String,
    pub healthy: bool,
    pub error: String,
}

/// Body of `GET /status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub deps: Vec<DependencyStatus>,
    pub all_healthy: bool,
}

/// Registered dependencies. Clones share the same set.
#[derive(Clone, Default)]
pub struct StatusRegistry {
    deps: Arc<RwLock<Vec<Arc<dyn StatusProvider>>>>,
}

impl StatusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, provider: impl StatusProvider + 'static) {
        self.deps
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(provider));
    }

    pub fn len(&self) -> usize {
        self.deps.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check every dependency in registration order.
    pub async fn check(&self) -> StatusReport {
        let deps: Vec<Arc<dyn StatusProvider>> =
            self.deps.read().unwrap_or_else(PoisonError::into_inner).clone();

        let mut report = StatusReport {
            deps: Vec::with_capacity(deps.len()),
            all_healthy: true,
        };
        for dep in deps {
            let status = match dep.status().await {
                Ok(()) => DependencyStatus {
                    name: dep.name().to_string(),
                    healthy: true,
                    error: String::new(),
                },
                Err(err) => {
                    report.all_healthy = false;
                    DependencyStatus {
                        name: dep.name().to_string(),
                        healthy: false,
                        error: err.to_string(),
                    }
                }
            };
            report.deps.push(status);
        }

        metrics::set_unhealthy_deps(report.deps.iter().filter(|dep| !dep.healthy).count());
        report
    }

    /// Router answering `GET /` with the status report.
    pub fn router(self) -> Router {
        Router::new().route("/", get(status_handler)).with_state(self)
    }
}

impl std::fmt::Debug for StatusRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusRegistry").field("deps", &self.len()).finish()
    }
}

async fn status_handler(State(registry): State<StatusRegistry>) -> Json<StatusReport> {
    Json(registry.check().await)
}
