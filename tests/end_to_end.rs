//! End-to-end tests of the control endpoint over a real TCP listener.

use std::time::Duration;

use live_config::{ControlEndpoint, Registry, VarConfig};
use serde_json::json;

mod common;

#[tokio::test]
async fn test_post_updates_value_and_environment() {
    let _env = common::env_lock().await;
    let registry = Registry::new();
    let (port, _) = registry.declare(VarConfig::new(8080u16).env("PORT"));
    let addr = common::start_control_server(ControlEndpoint::new(registry.clone()).into_router()).await;
    let client = common::client();

    let res = client
        .post(format!("http://{}/", addr))
        .json(&json!({ "PORT": "7000" }))
        .send()
        .await
        .expect("control endpoint unreachable");
    assert_eq!(res.status(), 201);

    let vars: serde_json::Value = client
        .get(format!("http://{}/", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(vars["PORT"], json!(7000));
    assert_eq!(*port.get(), 7000);
    assert_eq!(std::env::var("PORT").unwrap(), "7000");
}

#[tokio::test]
async fn test_post_invalid_value_leaves_variable_unchanged() {
    let _env = common::env_lock().await;
    let registry = Registry::new();
    let (port, _) = registry.declare(VarConfig::new(8080u16).env("PORT"));
    let addr = common::start_control_server(ControlEndpoint::new(registry).into_router()).await;

    let res = common::client()
        .post(format!("http://{}/", addr))
        .json(&json!({ "PORT": "not-a-number" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 500);
    let body = res.text().await.unwrap();
    assert!(body.contains("PORT"), "{}", body);
    assert_eq!(*port.get(), 8080);
}

#[tokio::test]
async fn test_put_query_and_round_trip_through_get() {
    let _env = common::env_lock().await;
    let registry = Registry::new();
    let (timeout, _) = registry.declare(
        VarConfig::new(Duration::from_secs(10)).env("LIVE_CONFIG_E2E_TIMEOUT"),
    );
    let addr = common::start_control_server(ControlEndpoint::new(registry).into_router()).await;
    let client = common::client();

    let res = client
        .put(format!("http://{}/", addr))
        .query(&[("LIVE_CONFIG_E2E_TIMEOUT", "1m30s")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);
    assert_eq!(*timeout.get(), Duration::from_secs(90));

    // The snapshot form is accepted back as input.
    let vars: serde_json::Value = client
        .get(format!("http://{}/", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(vars["LIVE_CONFIG_E2E_TIMEOUT"], json!("1m30s"));

    let res = client
        .post(format!("http://{}/", addr))
        .json(&vars)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);
    assert_eq!(*timeout.get(), Duration::from_secs(90));
}

#[tokio::test]
async fn test_api_key_required() {
    let registry = Registry::new();
    registry.declare(VarConfig::new(false).env("LIVE_CONFIG_E2E_AUTH"));
    let router = ControlEndpoint::new(registry).with_api_key("s3cret").into_router();
    let addr = common::start_control_server(router).await;
    let client = common::client();

    let res = client.get(format!("http://{}/", addr)).send().await.unwrap();
    assert_eq!(res.status(), 401);

    let res = client
        .get(format!("http://{}/", addr))
        .bearer_auth("wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);

    let res = client
        .get(format!("http://{}/", addr))
        .bearer_auth("s3cret")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
}
