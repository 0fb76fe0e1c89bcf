/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for focusflow-adapter tests

use focusflow_adapter::{ClientConfig, Credentials, FocusflowClient};
use wiremock::MockServer;

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Mock access token for testing
pub fn mock_access_token() -> String {
    "ff_test_token_0123456789".to_string()
}

/// Client pointed at the mock server, with credentials set
pub fn authed_client(server: &MockServer) -> FocusflowClient {
    let mut client = FocusflowClient::with_config_and_base_url(ClientConfig::default(), &server.uri())
        .expect("client init");
    client.set_credentials(Credentials {
        access_token: mock_access_token(),
    });
    client
}

/// Status payload for an active session
#[allow(dead_code)]
pub fn active_status_json(current_index: u32, completed: u32, total: u32) -> serde_json::Value {
    serde_json::json!({
        "active": true,
        "sessionId": "flow_1",
        "currentTask": {"id": format!("t{}", current_index + 1), "title": "Task", "duration": 25, "order": current_index},
        "currentIndex": current_index,
        "completedTasks": completed,
        "skippedTasks": 0,
        "totalTasks": total,
        "startedAt": "2026-10-16T09:00:00Z"
    })
}
