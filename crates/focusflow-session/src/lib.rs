/*
[INPUT]:  Public API exports for focusflow-session crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod clock;
pub mod config;
pub mod error;
pub mod flow;
pub mod pomodoro;
pub mod scheduler;
pub mod state;
pub mod tracker;

// Re-export main types for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::AppConfig;
pub use error::{Result, SessionError};
pub use flow::{FLOW_SESSION_KEY, FlowSession, FlowSessionConfig, FlowSnapshot};
pub use pomodoro::{IntervalKind, on_interval_complete};
pub use scheduler::PeriodicTask;
pub use state::{JsonFileStore, KeyValueStore, MemoryStore, StorageError};
pub use tracker::{ActiveTimeTracker, TrackerSnapshot, TrackerState};
