/*
[INPUT]:  Flow commands (start, next, complete, skip, stop) and bearer authentication
[OUTPUT]: Flow session status and transition replies
[POS]:    HTTP layer - flow mode endpoints (server owns sequencing)
[UPDATE]: When flow endpoints or transition reply shape change
*/

use reqwest::Method;
use tracing::debug;

use crate::http::{FocusflowClient, Result};
use crate::types::{FlowStatus, StartFlowRequest, StartFlowResponse, TransitionResponse};

impl FocusflowClient {
    /// Start a flow session
    ///
    /// POST /api/flow/start
    pub async fn start_flow(&self, req: &StartFlowRequest) -> Result<StartFlowResponse> {
        let builder = self.authed_request(Method::POST, "api/flow/start")?.json(req);
        let response: StartFlowResponse = self.send_json(builder).await?;
        debug!(
            session_id = %response.session_id,
            tasks = response.sequence.len(),
            "flow session started"
        );
        Ok(response)
    }

    /// Advance to the next task
    ///
    /// POST /api/flow/next
    pub async fn next_flow_task(&self) -> Result<TransitionResponse> {
        self.flow_transition("api/flow/next").await
    }

    /// Mark the current task complete
    ///
    /// POST /api/flow/complete
    pub async fn complete_flow_task(&self) -> Result<TransitionResponse> {
        self.flow_transition("api/flow/complete").await
    }

    /// Skip the current task
    ///
    /// POST /api/flow/skip
    pub async fn skip_flow_task(&self) -> Result<TransitionResponse> {
        self.flow_transition("api/flow/skip").await
    }

    /// End the flow session
    ///
    /// POST /api/flow/stop
    pub async fn stop_flow(&self) -> Result<()> {
        let builder = self.authed_request(Method::POST, "api/flow/stop")?;
        self.send_empty(builder).await
    }

    /// Fetch full session status
    ///
    /// GET /api/flow/status
    pub async fn flow_status(&self) -> Result<FlowStatus> {
        let builder = self.authed_request(Method::GET, "api/flow/status")?;
        self.send_json(builder).await
    }

    async fn flow_transition(&self, endpoint: &str) -> Result<TransitionResponse> {
        let builder = self.authed_request(Method::POST, endpoint)?;
        self.send_json(builder).await
    }
}
