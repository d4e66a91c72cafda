//! HTTP surfaces served through the coordinator.

use calculator_service::health::{liveness, StatusRegistry};
use calculator_service::http;
use calculator_service::net::HttpEndpoint;
use calculator_service::observability::logging::Logger;
use calculator_service::observability::metrics;
use calculator_service::rpc::CalculatorClient;
use calculator_service::version;
use reqwest::StatusCode;
use serde_json::Value;

mod common;

#[tokio::test]
async fn liveness_answers_any_path() {
    let addr = common::free_addr();
    let mut coordinator =
        common::coordinator(Logger::discard()).with_http(HttpEndpoint::new(addr, liveness::router()));
    coordinator.start().await.unwrap();

    for path in ["/", "/healthz"] {
        let res = reqwest::get(format!("http://{addr}{path}")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.text().await.unwrap(), "liveliness probe ok");
    }

    coordinator.stop().await.unwrap();
}

#[tokio::test]
async fn service_router_serves_status_version_and_metrics() {
    let registry = StatusRegistry::new();
    let unreachable = CalculatorClient::from_uri(format!("http://{}", common::free_addr())).unwrap();
    unreachable.register_status(&registry);

    let handle = metrics::install().unwrap();
    let addr = common::free_addr();
    let mut coordinator = common::coordinator(Logger::discard())
        .with_http(HttpEndpoint::new(addr, http::router(registry, Some(handle))));
    coordinator.start().await.unwrap();

    let status: Value = reqwest::get(format!("http://{addr}/status")).await.unwrap().json().await.unwrap();
    assert_eq!(status["all_healthy"], false);
    assert_eq!(status["deps"][0]["name"], "calculator");
    assert_eq!(status["deps"][0]["healthy"], false);
    assert!(status["deps"][0]["error"].as_str().unwrap().starts_with("connection not ready"));

    let info: Value = reqwest::get(format!("http://{addr}/version")).await.unwrap().json().await.unwrap();
    assert_eq!(info["name"], version::NAME);
    assert_eq!(info["version"], version::VERSION);
    assert!(info["start_time"].is_string());

    let res = reqwest::get(format!("http://{addr}/metrics")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.text().await.unwrap();
    assert!(body.contains("http_requests_total"));

    coordinator.stop().await.unwrap();
}
