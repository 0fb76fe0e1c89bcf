/*
[INPUT]:  API schema definitions and serde requirements
[OUTPUT]: Typed Rust response structs with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use serde::{Deserialize, Serialize};

use super::enums::TransitionKind;
use super::models::{FlowProgress, FlowTask};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartFlowResponse {
    pub session_id: String,
    #[serde(default)]
    pub sequence: Vec<FlowTask>,
}

/// Reply to next/complete/skip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<FlowTask>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<FlowProgress>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransitionKind>,
}

impl TransitionResponse {
    pub fn is_flow_complete(&self) -> bool {
        self.kind == Some(TransitionKind::FlowComplete)
    }

    pub fn outcome(&self) -> TransitionOutcome {
        if self.is_flow_complete() {
            TransitionOutcome::FlowComplete
        } else {
            TransitionOutcome::Advanced {
                task: self.task.clone(),
                progress: self.progress,
            }
        }
    }
}

/// Tagged view over the loosely shaped transition reply
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    Advanced {
        task: Option<FlowTask>,
        progress: Option<FlowProgress>,
    },
    FlowComplete,
}

impl TransitionOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, TransitionOutcome::FlowComplete)
    }
}
