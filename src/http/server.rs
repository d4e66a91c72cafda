//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router for the service HTTP listener
//! - Wire up middleware (request metrics, tracing)
//! - Serve dependency status, version and Prometheus metrics

use axum::middleware;
use axum::routing::get;
use axum::{Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::trace::TraceLayer;

use crate::health::StatusRegistry;
use crate::observability::metrics;
use crate::version::VersionInfo;

/// Router for the service HTTP listener.
///
/// `/metrics` is only mounted when a recorder handle is given.
pub fn router(registry: StatusRegistry, prometheus: Option<PrometheusHandle>) -> Router {
    let mut router = Router::new()
        .nest("/status", registry.router())
        .route("/version", get(version_handler));

    if let Some(handle) = prometheus {
        router = router.route(
            "/metrics",
            get(move || {
                let handle = handle.clone();
                async move { handle.render() }
            }),
        );
    }

    router
        .layer(middleware::from_fn(metrics::track_http))
        .layer(TraceLayer::new_for_http())
}

async fn version_handler() -> Json<VersionInfo> {
    Json(VersionInfo::current())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;

    async fn get_json(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null))
    }

    #[tokio::test]
    async fn serves_version() {
        let (status, json) = get_json(router(StatusRegistry::new(), None), "/version").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["name"], "calculator-service");
        assert!(json["start_time"].is_string());
    }

    #[tokio::test]
    async fn serves_status() {
        let (status, json) = get_json(router(StatusRegistry::new(), None), "/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["all_healthy"], true);
        assert!(json["deps"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn metrics_is_optional() {
        let response = router(StatusRegistry::new(), None)
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
