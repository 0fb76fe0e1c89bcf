/*
[INPUT]:  Remote time entry store and flow endpoints
[OUTPUT]: Collaborator traits consumed by the session state machines
[POS]:    API layer - seams between state machines and transport
[UPDATE]: When the collaborator contracts change
*/

pub mod mock;

use std::sync::Arc;

use async_trait::async_trait;

use crate::http::{FocusflowClient, Result};
use crate::types::{
    FlowStatus, NewTimeEntry, StartFlowRequest, StartFlowResponse, TimeEntry, TimeEntryPatch,
    TransitionResponse,
};

pub use mock::{MockFlowApi, MockReply, MockTimeEntryStore};

/// Remote store of time entries
///
/// An entry without `end_time` denotes in-progress tracking.
#[async_trait]
pub trait TimeEntryStore: Send + Sync {
    async fn list(&self) -> Result<Vec<TimeEntry>>;

    async fn create(&self, entry: NewTimeEntry) -> Result<TimeEntry>;

    async fn update(&self, id: &str, patch: TimeEntryPatch) -> Result<TimeEntry>;
}

/// Remote flow session commands; the server owns sequencing
#[async_trait]
pub trait FlowApi: Send + Sync {
    async fn start(&self, req: StartFlowRequest) -> Result<StartFlowResponse>;

    async fn next(&self) -> Result<TransitionResponse>;

    async fn complete(&self) -> Result<TransitionResponse>;

    async fn skip(&self) -> Result<TransitionResponse>;

    async fn stop(&self) -> Result<()>;

    async fn status(&self) -> Result<FlowStatus>;
}

#[async_trait]
impl TimeEntryStore for FocusflowClient {
    async fn list(&self) -> Result<Vec<TimeEntry>> {
        self.list_time_entries().await
    }

    async fn create(&self, entry: NewTimeEntry) -> Result<TimeEntry> {
        self.create_time_entry(&entry).await
    }

    async fn update(&self, id: &str, patch: TimeEntryPatch) -> Result<TimeEntry> {
        self.update_time_entry(id, &patch).await
    }
}

#[async_trait]
impl FlowApi for FocusflowClient {
    async fn start(&self, req: StartFlowRequest) -> Result<StartFlowResponse> {
        self.start_flow(&req).await
    }

    async fn next(&self) -> Result<TransitionResponse> {
        self.next_flow_task().await
    }

    async fn complete(&self) -> Result<TransitionResponse> {
        self.complete_flow_task().await
    }

    async fn skip(&self) -> Result<TransitionResponse> {
        self.skip_flow_task().await
    }

    async fn stop(&self) -> Result<()> {
        self.stop_flow().await
    }

    async fn status(&self) -> Result<FlowStatus> {
        self.flow_status().await
    }
}

#[async_trait]
impl<T: TimeEntryStore + ?Sized> TimeEntryStore for Arc<T> {
    async fn list(&self) -> Result<Vec<TimeEntry>> {
        (**self).list().await
    }

    async fn create(&self, entry: NewTimeEntry) -> Result<TimeEntry> {
        (**self).create(entry).await
    }

    async fn update(&self, id: &str, patch: TimeEntryPatch) -> Result<TimeEntry> {
        (**self).update(id, patch).await
    }
}

#[async_trait]
impl<T: FlowApi + ?Sized> FlowApi for Arc<T> {
    async fn start(&self, req: StartFlowRequest) -> Result<StartFlowResponse> {
        (**self).start(req).await
    }

    async fn next(&self) -> Result<TransitionResponse> {
        (**self).next().await
    }

    async fn complete(&self) -> Result<TransitionResponse> {
        (**self).complete().await
    }

    async fn skip(&self) -> Result<TransitionResponse> {
        (**self).skip().await
    }

    async fn stop(&self) -> Result<()> {
        (**self).stop().await
    }

    async fn status(&self) -> Result<FlowStatus> {
        (**self).status().await
    }
}
