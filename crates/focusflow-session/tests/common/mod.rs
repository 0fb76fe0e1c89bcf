/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared fixtures for tracker and flow integration tests
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for focusflow-session tests

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use focusflow_adapter::{ClientConfig, Credentials, FocusflowClient};
use wiremock::MockServer;

pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Client pointed at the mock server, with credentials set
pub fn authed_client(server: &MockServer) -> Arc<FocusflowClient> {
    let mut client =
        FocusflowClient::with_config_and_base_url(ClientConfig::default(), &server.uri())
            .expect("client init");
    client.set_credentials(Credentials {
        access_token: "ff_test_token".to_string(),
    });
    Arc::new(client)
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap()
}

pub fn time_entry_json(id: &str, task_id: &str, start: &str, end: Option<&str>) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "taskId": task_id,
        "description": format!("Task {task_id}"),
        "startTime": start,
        "endTime": end,
        "duration": 0,
        "date": &start[..10],
        "tags": []
    })
}

pub fn active_status_json(current_index: u32, completed: u32, total: u32) -> serde_json::Value {
    serde_json::json!({
        "active": true,
        "sessionId": "flow_1",
        "currentTask": {
            "id": format!("t{}", current_index + 1),
            "title": format!("Task {}", current_index + 1),
            "duration": 25,
            "order": current_index
        },
        "currentIndex": current_index,
        "completedTasks": completed,
        "skippedTasks": 0,
        "totalTasks": total,
        "startedAt": "2026-10-16T09:00:00Z"
    })
}

pub fn sequence_json(count: u32) -> serde_json::Value {
    let tasks: Vec<serde_json::Value> = (0..count)
        .map(|idx| {
            serde_json::json!({
                "id": format!("t{}", idx + 1),
                "title": format!("Task {}", idx + 1),
                "duration": 25,
                "order": idx,
                "reason": "due soon"
            })
        })
        .collect();
    serde_json::Value::Array(tasks)
}
