/*
[INPUT]:  Finished pomodoro intervals
[OUTPUT]: Flow mode advancement when a work interval ends
[POS]:    Integration layer - pomodoro timer to flow session bridge
[UPDATE]: When pomodoro interval kinds change
*/

use std::fmt;
use std::str::FromStr;

use focusflow_adapter::{FlowApi, TransitionOutcome};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::flow::FlowSession;
use crate::state::KeyValueStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalKind {
    Work,
    ShortBreak,
    LongBreak,
}

impl IntervalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntervalKind::Work => "work",
            IntervalKind::ShortBreak => "short_break",
            IntervalKind::LongBreak => "long_break",
        }
    }
}

impl fmt::Display for IntervalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntervalKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "work" => Ok(IntervalKind::Work),
            "short_break" | "short" => Ok(IntervalKind::ShortBreak),
            "long_break" | "long" => Ok(IntervalKind::LongBreak),
            other => Err(format!("unknown interval kind: {other}")),
        }
    }
}

/// Complete the current flow task when a work interval finishes
///
/// Breaks, and work intervals outside flow mode, leave the session untouched and return `None`.
pub async fn on_interval_complete<A, K>(
    kind: IntervalKind,
    flow: &FlowSession<A, K>,
) -> Result<Option<TransitionOutcome>>
where
    A: FlowApi + 'static,
    K: KeyValueStore + 'static,
{
    if kind != IntervalKind::Work || !flow.is_active() {
        debug!(interval = %kind, active = flow.is_active(), "pomodoro interval ignored by flow mode");
        return Ok(None);
    }
    let outcome = flow.complete_task().await?;
    Ok(Some(outcome))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::flow::FlowSessionConfig;
    use crate::state::MemoryStore;
    use focusflow_adapter::{
        FlowStatus, FlowTask, MockFlowApi, MockReply, StartFlowResponse, TransitionKind,
        TransitionResponse,
    };
    use rstest::rstest;

    fn task(id: &str) -> FlowTask {
        FlowTask {
            id: id.to_string(),
            title: id.to_uppercase(),
            duration: 25,
            order: 0,
            reason: None,
        }
    }

    async fn active_flow() -> (FlowSession<Arc<MockFlowApi>, Arc<MemoryStore>>, Arc<MockFlowApi>) {
        let api = Arc::new(MockFlowApi::new());
        let flow = FlowSession::new(
            api.clone(),
            Arc::new(MemoryStore::new()),
            FlowSessionConfig::default(),
        );
        api.push_start(MockReply::Value(StartFlowResponse {
            session_id: "flow_1".to_string(),
            sequence: vec![task("t1")],
        }));
        api.push_status(MockReply::Value(FlowStatus {
            active: true,
            session_id: Some("flow_1".to_string()),
            current_task: Some(task("t1")),
            current_index: 0,
            completed_tasks: 0,
            skipped_tasks: 0,
            total_tasks: 1,
            progress: None,
            started_at: None,
            sequence: Vec::new(),
        }));
        flow.start_flow(25, None).await.unwrap();
        (flow, api)
    }

    #[rstest]
    #[case("work", IntervalKind::Work)]
    #[case("short-break", IntervalKind::ShortBreak)]
    #[case("LONG_BREAK", IntervalKind::LongBreak)]
    fn test_parse_interval_kind(#[case] raw: &str, #[case] expected: IntervalKind) {
        assert_eq!(raw.parse::<IntervalKind>().unwrap(), expected);
    }

    #[tokio::test]
    async fn test_work_interval_completes_task() {
        let (flow, api) = active_flow().await;
        api.push_transition(MockReply::Value(TransitionResponse {
            task: None,
            progress: None,
            kind: Some(TransitionKind::FlowComplete),
        }));

        let outcome = on_interval_complete(IntervalKind::Work, &flow).await.unwrap();

        assert_eq!(outcome, Some(TransitionOutcome::FlowComplete));
        assert_eq!(api.call_count("complete"), 1);
        assert!(!flow.is_active());
    }

    #[tokio::test]
    async fn test_break_interval_is_ignored() {
        let (flow, api) = active_flow().await;

        let outcome = on_interval_complete(IntervalKind::ShortBreak, &flow)
            .await
            .unwrap();

        assert_eq!(outcome, None);
        assert_eq!(api.call_count("complete"), 0);
        assert!(flow.is_active());
    }

    #[tokio::test]
    async fn test_work_interval_without_flow_is_ignored() {
        let api = Arc::new(MockFlowApi::new());
        let flow = FlowSession::new(
            api.clone(),
            Arc::new(MemoryStore::new()),
            FlowSessionConfig::default(),
        );

        let outcome = on_interval_complete(IntervalKind::Work, &flow).await.unwrap();
        assert_eq!(outcome, None);
        assert!(api.calls().is_empty());
    }
}
