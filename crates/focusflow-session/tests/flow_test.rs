/*
[INPUT]:  Flow endpoints served by wiremock, JsonFileStore in a temp dir
[OUTPUT]: End-to-end verification of FlowSession start, resume, and teardown
[POS]:    Integration test layer - flow session against the real client
[UPDATE]: When flow wire behavior or resumption changes
*/

mod common;

use common::{active_status_json, authed_client, sequence_json, setup_mock_server};
use focusflow_adapter::EnergyLevel;
use focusflow_session::{
    FLOW_SESSION_KEY, FlowSession, FlowSessionConfig, JsonFileStore, KeyValueStore,
};
use std::sync::Arc;
use tempfile::TempDir;
use tokio_test::assert_ok;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

fn file_store() -> (TempDir, Arc<JsonFileStore>) {
    let dir = TempDir::new().expect("temp dir");
    let store = Arc::new(JsonFileStore::new(dir.path()).expect("file store"));
    (dir, store)
}

#[tokio::test]
async fn test_start_flow_persists_status() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/api/flow/start"))
        .and(body_json(serde_json::json!({"duration": 45, "energy": "high"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sessionId": "flow_1",
            "sequence": sequence_json(3)
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/flow/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(active_status_json(0, 0, 3)))
        .expect(1)
        .mount(&server)
        .await;

    let (dir, store) = file_store();
    let session = FlowSession::new(authed_client(&server), store.clone(), FlowSessionConfig::default());

    let response = assert_ok!(session.start_flow(45, Some(EnergyLevel::High)).await);

    assert_eq!(response.sequence.len(), 3);
    assert!(session.is_active());
    assert_eq!(session.progress().map(|p| p.percentage), Some(0));
    assert!(dir.path().join("flow_session.json").exists());

    let persisted = store.get(FLOW_SESSION_KEY).unwrap().expect("persisted status");
    let value: serde_json::Value = serde_json::from_str(&persisted).unwrap();
    assert_eq!(value["active"], serde_json::json!(true));
}

#[tokio::test]
async fn test_restore_refreshes_once_from_persisted_marker() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/api/flow/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(active_status_json(2, 1, 4)))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, store) = file_store();
    store
        .set(FLOW_SESSION_KEY, &active_status_json(1, 1, 4).to_string())
        .unwrap();

    let session =
        FlowSession::restore(authed_client(&server), store, FlowSessionConfig::default()).await;

    assert!(session.is_active());
    assert_eq!(session.current_task().map(|t| t.id), Some("t3".to_string()));
    assert_eq!(session.progress().map(|p| p.percentage), Some(25));
}

#[tokio::test]
async fn test_expired_session_clears_persisted_file() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/api/flow/status"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(serde_json::json!({"error": "Session not found"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (dir, store) = file_store();
    store.set(FLOW_SESSION_KEY, r#"{"active": true}"#).unwrap();

    let session =
        FlowSession::restore(authed_client(&server), store, FlowSessionConfig::default()).await;

    assert!(!session.is_active());
    assert!(session.error().is_none());
    assert!(!dir.path().join("flow_session.json").exists());
}

#[tokio::test]
async fn test_flow_complete_skips_status_round_trip() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/api/flow/complete"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"type": "flow_complete"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/flow/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(active_status_json(0, 0, 1)))
        .expect(0)
        .mount(&server)
        .await;

    let (_dir, store) = file_store();
    store.set(FLOW_SESSION_KEY, r#"{"active": true}"#).unwrap();
    let session = FlowSession::new(authed_client(&server), store.clone(), FlowSessionConfig::default());

    let outcome = assert_ok!(session.complete_task().await);

    assert!(outcome.is_complete());
    assert!(!session.is_active());
    assert_eq!(store.get(FLOW_SESSION_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_stop_failure_still_clears() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/api/flow/stop"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, store) = file_store();
    store.set(FLOW_SESSION_KEY, r#"{"active": true}"#).unwrap();
    let session = FlowSession::new(authed_client(&server), store.clone(), FlowSessionConfig::default());

    assert!(session.stop_flow().await.is_err());
    assert!(!session.is_active());
    assert_eq!(store.get(FLOW_SESSION_KEY).unwrap(), None);
}
