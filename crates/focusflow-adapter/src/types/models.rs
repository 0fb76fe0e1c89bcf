/*
[INPUT]:  API schema definitions and serde requirements
[OUTPUT]: Typed Rust structs with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
[UPDATE]: 2026-10-16 Fallback progress derivation when the server omits it
*/

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Record of time spent; an entry without `end_time` is in progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_id: Option<String>,
    #[serde(default)]
    pub description: String,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Whole minutes
    #[serde(default)]
    pub duration: u32,
    pub date: NaiveDate,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billable: Option<bool>,
}

impl TimeEntry {
    pub fn is_active(&self) -> bool {
        self.end_time.is_none()
    }

    pub fn is_for_task(&self, task_id: &str) -> bool {
        self.task_id.as_deref() == Some(task_id)
    }
}

/// One task in a flow sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowTask {
    pub id: String,
    pub title: String,
    /// Planned minutes
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowProgress {
    pub current: u32,
    pub total: u32,
    pub percentage: u32,
}

impl FlowProgress {
    /// `round(current / total * 100)`, 0 for an empty sequence
    pub fn from_counts(current: u32, total: u32) -> Self {
        let percentage = if total == 0 {
            0
        } else {
            (f64::from(current) / f64::from(total) * 100.0).round() as u32
        };
        Self {
            current,
            total,
            percentage,
        }
    }
}

/// Server-authoritative flow session status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowStatus {
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_task: Option<FlowTask>,
    #[serde(default)]
    pub current_index: u32,
    #[serde(default)]
    pub completed_tasks: u32,
    #[serde(default)]
    pub skipped_tasks: u32,
    #[serde(default)]
    pub total_tasks: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<FlowProgress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sequence: Vec<FlowTask>,
}

impl FlowStatus {
    /// Progress as reported by the server, or derived from completed/total counts
    pub fn effective_progress(&self) -> FlowProgress {
        self.progress
            .unwrap_or_else(|| FlowProgress::from_counts(self.completed_tasks, self.total_tasks))
    }
}
