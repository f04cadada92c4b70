//! ARM client behaviour against a mock Resource Manager

use std::sync::Arc;
use std::time::Duration;

use azurerm_core::{ArmClient, Error, StaticTokenCredential};
use secrecy::SecretString;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RESOURCE: &str = "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Databricks/workspaces/ws1";
const API_VERSION: &str = "2023-02-01";

fn client(server: &MockServer) -> ArmClient {
    let credential = Arc::new(StaticTokenCredential::new(SecretString::from(
        "test-token".to_string(),
    )));
    ArmClient::new(server.uri(), credential, Duration::from_millis(5)).unwrap()
}

#[tokio::test]
async fn test_get_sends_api_version_and_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RESOURCE))
        .and(query_param("api-version", API_VERSION))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "ws1"})))
        .expect(1)
        .mount(&server)
        .await;

    let body: Option<Value> = client(&server).get(RESOURCE, API_VERSION).await.unwrap();
    assert_eq!(body.unwrap()["name"], "ws1");
}

#[tokio::test]
async fn test_get_not_found_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RESOURCE))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": "ResourceNotFound", "message": "gone"}
        })))
        .mount(&server)
        .await;

    let body: Option<Value> = client(&server).get(RESOURCE, API_VERSION).await.unwrap();
    assert!(body.is_none());
}

#[tokio::test]
async fn test_error_envelope_decoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RESOURCE))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": "AuthorizationFailed", "message": "no access"}
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .get::<Value>(RESOURCE, API_VERSION)
        .await
        .unwrap_err();

    match err {
        Error::Api { source, .. } => {
            assert_eq!(source.status, 403);
            assert_eq!(source.code, "AuthorizationFailed");
            assert_eq!(source.message, "no access");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_put_polls_async_operation() {
    let server = MockServer::start().await;
    let operation_url = format!("{}/operations/op1", server.uri());

    Mock::given(method("PUT"))
        .and(path(RESOURCE))
        .and(body_json(json!({"location": "westeurope"})))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("Azure-AsyncOperation", operation_url.as_str())
                .set_body_json(json!({})),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/operations/op1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "InProgress"})))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/operations/op1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "Succeeded"})))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .put(RESOURCE, API_VERSION, &json!({"location": "westeurope"}))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_failed_operation_surfaces_error() {
    let server = MockServer::start().await;
    let operation_url = format!("{}/operations/op2", server.uri());

    Mock::given(method("PUT"))
        .and(path(RESOURCE))
        .respond_with(
            ResponseTemplate::new(200).insert_header("Azure-AsyncOperation", operation_url.as_str()),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/operations/op2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "Failed",
            "error": {"code": "InvalidEncryption", "message": "key vault unreachable"}
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .put(RESOURCE, API_VERSION, &json!({}))
        .await
        .unwrap_err();

    match err {
        Error::OperationFailed { status, message, .. } => {
            assert_eq!(status, "Failed");
            assert_eq!(message, "InvalidEncryption: key vault unreachable");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_delete_polls_location() {
    let server = MockServer::start().await;
    let location = format!("{}/locations/del1", server.uri());

    Mock::given(method("DELETE"))
        .and(path(RESOURCE))
        .respond_with(ResponseTemplate::new(202).insert_header("Location", location.as_str()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/locations/del1"))
        .respond_with(ResponseTemplate::new(202))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/locations/del1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).delete(RESOURCE, API_VERSION).await.unwrap();
}

#[tokio::test]
async fn test_delete_of_missing_resource_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(RESOURCE))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    client(&server).delete(RESOURCE, API_VERSION).await.unwrap();
}
