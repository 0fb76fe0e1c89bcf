/*
[INPUT]:  Scripted replies and seeded time entries
[OUTPUT]: In-memory TimeEntryStore / FlowApi implementations with call recording
[POS]:    API layer - test doubles for the collaborator traits
[UPDATE]: When collaborator traits gain methods
*/

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use super::{FlowApi, TimeEntryStore};
use crate::http::{FocusflowError, Result};
use crate::types::{
    FlowStatus, NewTimeEntry, StartFlowRequest, StartFlowResponse, TimeEntry, TimeEntryPatch,
    TransitionResponse,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Scripted reply for a mocked call
#[derive(Debug, Clone)]
pub enum MockReply<T> {
    Value(T),
    NotFound(String),
    Fail { code: u16, message: String },
}

impl<T> MockReply<T> {
    pub fn fail(message: impl Into<String>) -> Self {
        MockReply::Fail {
            code: 500,
            message: message.into(),
        }
    }

    fn into_result(self) -> Result<T> {
        match self {
            MockReply::Value(value) => Ok(value),
            MockReply::NotFound(message) => Err(FocusflowError::NotFound { message }),
            MockReply::Fail { code, message } => Err(FocusflowError::api_error(
                StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                message,
            )),
        }
    }
}

#[derive(Debug, Default)]
struct StoreState {
    entries: Vec<TimeEntry>,
    next_id: u64,
    fail_creates: bool,
    fail_updates: bool,
    creates: usize,
    updates: usize,
    lists: usize,
}

/// In-memory time entry store
#[derive(Debug, Default)]
pub struct MockTimeEntryStore {
    state: Mutex<StoreState>,
}

impl MockTimeEntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing records
    pub fn with_entries(entries: Vec<TimeEntry>) -> Self {
        let store = Self::new();
        {
            let mut state = lock(&store.state);
            state.next_id = entries.len() as u64;
            state.entries = entries;
        }
        store
    }

    pub fn entries(&self) -> Vec<TimeEntry> {
        lock(&self.state).entries.clone()
    }

    pub fn active_entries(&self) -> Vec<TimeEntry> {
        lock(&self.state)
            .entries
            .iter()
            .filter(|entry| entry.is_active())
            .cloned()
            .collect()
    }

    pub fn set_fail_creates(&self, fail: bool) {
        lock(&self.state).fail_creates = fail;
    }

    pub fn set_fail_updates(&self, fail: bool) {
        lock(&self.state).fail_updates = fail;
    }

    pub fn create_calls(&self) -> usize {
        lock(&self.state).creates
    }

    pub fn update_calls(&self) -> usize {
        lock(&self.state).updates
    }

    pub fn list_calls(&self) -> usize {
        lock(&self.state).lists
    }
}

#[async_trait]
impl TimeEntryStore for MockTimeEntryStore {
    async fn list(&self) -> Result<Vec<TimeEntry>> {
        let mut state = lock(&self.state);
        state.lists += 1;
        Ok(state.entries.clone())
    }

    async fn create(&self, entry: NewTimeEntry) -> Result<TimeEntry> {
        let mut state = lock(&self.state);
        state.creates += 1;
        if state.fail_creates {
            return Err(FocusflowError::api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "create failed",
            ));
        }

        state.next_id += 1;
        let created = TimeEntry {
            id: format!("te_{}", state.next_id),
            task_id: entry.task_id,
            list_id: entry.list_id,
            description: entry.description,
            start_time: entry.start_time,
            end_time: entry.end_time,
            duration: entry.duration,
            date: entry.date,
            tags: entry.tags,
            billable: entry.billable,
        };
        state.entries.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: &str, patch: TimeEntryPatch) -> Result<TimeEntry> {
        let mut state = lock(&self.state);
        state.updates += 1;
        if state.fail_updates {
            return Err(FocusflowError::api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "update failed",
            ));
        }

        let entry = state
            .entries
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or_else(|| FocusflowError::NotFound {
                message: format!("time entry {id}"),
            })?;

        if let Some(description) = patch.description {
            entry.description = description;
        }
        if let Some(end_time) = patch.end_time {
            entry.end_time = Some(end_time);
        }
        if let Some(duration) = patch.duration {
            entry.duration = duration;
        }
        if let Some(tags) = patch.tags {
            entry.tags = tags;
        }
        if patch.billable.is_some() {
            entry.billable = patch.billable;
        }
        Ok(entry.clone())
    }
}

#[derive(Debug, Default)]
struct FlowScript {
    starts: VecDeque<MockReply<StartFlowResponse>>,
    transitions: VecDeque<MockReply<TransitionResponse>>,
    statuses: VecDeque<MockReply<FlowStatus>>,
    fallback_status: Option<FlowStatus>,
    stop_failure: Option<String>,
    transition_delay: Option<Duration>,
    status_delay: Option<Duration>,
    calls: Vec<&'static str>,
}

/// Scripted flow API
///
/// Replies are consumed in order. When the status script runs dry the fallback status is
/// returned, or a not-found error if none is set.
#[derive(Debug, Default)]
pub struct MockFlowApi {
    script: Mutex<FlowScript>,
}

impl MockFlowApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_start(&self, reply: MockReply<StartFlowResponse>) {
        lock(&self.script).starts.push_back(reply);
    }

    pub fn push_transition(&self, reply: MockReply<TransitionResponse>) {
        lock(&self.script).transitions.push_back(reply);
    }

    pub fn push_status(&self, reply: MockReply<FlowStatus>) {
        lock(&self.script).statuses.push_back(reply);
    }

    pub fn set_fallback_status(&self, status: Option<FlowStatus>) {
        lock(&self.script).fallback_status = status;
    }

    pub fn fail_stop(&self, message: impl Into<String>) {
        lock(&self.script).stop_failure = Some(message.into());
    }

    /// Hold every transition reply for `delay` before answering
    pub fn set_transition_delay(&self, delay: Duration) {
        lock(&self.script).transition_delay = Some(delay);
    }

    /// Hold every status reply for `delay` before answering
    pub fn set_status_delay(&self, delay: Duration) {
        lock(&self.script).status_delay = Some(delay);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        lock(&self.script).calls.clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        lock(&self.script)
            .calls
            .iter()
            .filter(|call| **call == name)
            .count()
    }

    fn record(&self, name: &'static str) {
        lock(&self.script).calls.push(name);
    }

    async fn transition(&self, name: &'static str) -> Result<TransitionResponse> {
        let (reply, delay) = {
            let mut script = lock(&self.script);
            script.calls.push(name);
            let reply = script
                .transitions
                .pop_front()
                .unwrap_or_else(|| MockReply::fail("no scripted transition"));
            (reply, script.transition_delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        reply.into_result()
    }
}

#[async_trait]
impl FlowApi for MockFlowApi {
    async fn start(&self, _req: StartFlowRequest) -> Result<StartFlowResponse> {
        let reply = {
            let mut script = lock(&self.script);
            script.calls.push("start");
            script.starts.pop_front()
        };
        reply
            .unwrap_or_else(|| MockReply::Fail {
                code: 400,
                message: "No eligible tasks".to_string(),
            })
            .into_result()
    }

    async fn next(&self) -> Result<TransitionResponse> {
        self.transition("next").await
    }

    async fn complete(&self) -> Result<TransitionResponse> {
        self.transition("complete").await
    }

    async fn skip(&self) -> Result<TransitionResponse> {
        self.transition("skip").await
    }

    async fn stop(&self) -> Result<()> {
        self.record("stop");
        match lock(&self.script).stop_failure.clone() {
            Some(message) => MockReply::<()>::fail(message).into_result(),
            None => Ok(()),
        }
    }

    async fn status(&self) -> Result<FlowStatus> {
        let (reply, delay) = {
            let mut script = lock(&self.script);
            script.calls.push("status");
            let reply = match script.statuses.pop_front() {
                Some(reply) => reply,
                None => match script.fallback_status.clone() {
                    Some(status) => MockReply::Value(status),
                    None => MockReply::NotFound("no active flow session".to_string()),
                },
            };
            (reply, script.status_delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        reply.into_result()
    }
}
