/*
[INPUT]:  Mock HTTP responses
[OUTPUT]: Test results for HTTP client
[POS]:    Integration tests - HTTP endpoints
[UPDATE]: When HTTP endpoints change
*/

mod common;

use common::{active_status_json, authed_client, mock_access_token, setup_mock_server};
use focusflow_adapter::{
    ClientConfig, Credentials, FlowApi, FocusflowClient, FocusflowError, NewTimeEntry,
    TimeEntryStore,
};
use tokio_test::assert_ok;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, ResponseTemplate};

#[test]
fn test_client_creation() {
    let client = assert_ok!(FocusflowClient::new());
    assert!(client.credentials().is_none());
}

#[test]
fn test_client_with_config() {
    let config = ClientConfig::default();
    let _client = assert_ok!(FocusflowClient::with_config(config));
}

#[test]
fn test_invalid_base_url() {
    let err = FocusflowClient::with_config_and_base_url(ClientConfig::default(), "not a url")
        .expect_err("invalid url should fail");
    assert!(matches!(err, FocusflowError::UrlParse(_)));
}

#[test]
fn test_non_http_base_url_is_rejected() {
    let err = FocusflowClient::with_config_and_base_url(ClientConfig::default(), "file:///tmp/focusflow")
        .expect_err("file url should fail");
    assert!(matches!(err, FocusflowError::Config(_)));
}

#[tokio::test]
async fn test_base_url_path_prefix_is_preserved() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/v1/api/flow/status"))
        .and(header("authorization", format!("Bearer {}", mock_access_token()).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(active_status_json(0, 0, 2)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/api/flow/stop"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let base = format!("{}/v1", server.uri());
    let mut client = assert_ok!(FocusflowClient::with_config_and_base_url(ClientConfig::default(), &base));
    client.set_credentials(Credentials {
        access_token: mock_access_token(),
    });

    let status = assert_ok!(client.flow_status().await);
    assert!(status.active);
    assert_ok!(client.stop_flow().await);
}

#[test]
fn test_client_credentials_roundtrip() {
    let mut client = assert_ok!(FocusflowClient::new());
    client.set_credentials(Credentials {
        access_token: mock_access_token(),
    });

    let stored = client.credentials().expect("credentials should be set");
    assert_eq!(stored.access_token, mock_access_token());
}

#[tokio::test]
async fn test_requests_carry_bearer_and_request_id() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/api/flow/status"))
        .and(header("authorization", format!("Bearer {}", mock_access_token()).as_str()))
        .and(header_exists("x-request-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(active_status_json(2, 2, 5)))
        .expect(1)
        .mount(&server)
        .await;

    let client = authed_client(&server);
    let status = assert_ok!(FlowApi::status(&client).await);

    assert!(status.active);
    assert_eq!(status.current_index, 2);
    assert_eq!(status.effective_progress().percentage, 40);
}

#[tokio::test]
async fn test_create_time_entry_through_store_trait() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/api/time-entries"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "id": "te_42",
            "taskId": "task_1",
            "description": "Deep work",
            "startTime": "2026-10-16T09:00:00Z",
            "duration": 0,
            "date": "2026-10-16"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let start = "2026-10-16T09:00:00Z".parse().expect("timestamp");
    let entry = NewTimeEntry {
        task_id: Some("task_1".to_string()),
        list_id: None,
        description: "Deep work".to_string(),
        start_time: start,
        end_time: None,
        duration: 0,
        date: "2026-10-16".parse().expect("date"),
        tags: Vec::new(),
        billable: None,
    };

    let client = authed_client(&server);
    let created = assert_ok!(TimeEntryStore::create(&client, entry).await);
    assert_eq!(created.id, "te_42");
    assert!(created.is_active());
}

#[tokio::test]
async fn test_unauthorized_maps_to_auth_error() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/api/time-entries"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": "token expired"
        })))
        .mount(&server)
        .await;

    let client = authed_client(&server);
    let err = client
        .list_time_entries()
        .await
        .expect_err("401 should fail");
    assert!(err.is_auth_error());
}

#[tokio::test]
async fn test_server_error_message_is_surfaced() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/api/flow/start"))
        .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
            "message": "No eligible tasks"
        })))
        .mount(&server)
        .await;

    let client = authed_client(&server);
    let err = client
        .start_flow(&focusflow_adapter::StartFlowRequest {
            duration: 30,
            energy: None,
        })
        .await
        .expect_err("422 should fail");

    match err {
        FocusflowError::Api { code, message } => {
            assert_eq!(code, 422);
            assert_eq!(message, "No eligible tasks");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_empty_json_body_is_invalid_response() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/api/flow/next"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = authed_client(&server);
    let err = client.next_flow_task().await.expect_err("empty body should fail");
    assert!(matches!(err, FocusflowError::InvalidResponse(_)));
}
