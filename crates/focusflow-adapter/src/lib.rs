/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public Focusflow adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod api;
pub mod http;
pub mod types;

// Re-export collaborator traits and their test doubles
pub use api::{FlowApi, MockFlowApi, MockReply, MockTimeEntryStore, TimeEntryStore};

// Re-export commonly used types from http
pub use http::{ClientConfig, Credentials, FocusflowClient, FocusflowError, Result};

// Re-export all types
pub use types::*;
