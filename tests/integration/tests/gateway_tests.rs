//! Gateway Integration Tests
//!
//! Smoke coverage for the gateway's HTTP surface. Frame-level behavior
//! is covered by the relay-gateway unit tests; these only verify that a
//! fully wired gateway starts against a real database and answers on
//! its routes.
//!
//! Run with: cargo test -p integration-tests --test gateway_tests

use integration_tests::{assert_status, check_test_env, TestGateway};
use reqwest::StatusCode;

#[tokio::test]
async fn test_gateway_health_check() {
    if !check_test_env().await {
        return;
    }

    let gateway = TestGateway::start().await.expect("Failed to start gateway");
    let response = gateway.get("/health").await.expect("Request failed");
    assert_status(response, StatusCode::OK).await.unwrap();
}

#[tokio::test]
async fn test_ws_route_requires_upgrade() {
    if !check_test_env().await {
        return;
    }

    let gateway = TestGateway::start().await.expect("Failed to start gateway");

    // A plain GET without the upgrade handshake never reaches admission.
    let response = gateway.get("/ws").await.expect("Request failed");
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    if !check_test_env().await {
        return;
    }

    let gateway = TestGateway::start().await.expect("Failed to start gateway");
    let response = gateway.get("/nope").await.expect("Request failed");
    assert_status(response, StatusCode::NOT_FOUND).await.unwrap();
}
