//! Liveness probe.

use axum::routing::get;
use axum::Router;

pub const LIVENESS_BODY: &str = "liveliness probe ok";

async fn probe() -> &'static str {
    LIVENESS_BODY
}

/// Router answering every request with `200 liveliness probe ok`.
pub fn router() -> Router {
    Router::new().route("/", get(probe)).fallback(probe)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;

    #[tokio::test]
    async fn answers_ok() {
        for uri in ["/", "/healthz"] {
            let response = router()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
            assert_eq!(&body[..], LIVENESS_BODY.as_bytes());
        }
    }
}
