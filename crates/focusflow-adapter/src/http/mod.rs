/*
[INPUT]:  HTTP client configuration and API endpoints
[OUTPUT]: HTTP responses and typed API results
[POS]:    HTTP layer - REST API communication
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod client;
pub mod error;
pub mod flow;
pub mod time_entries;

pub use error::{FocusflowError, Result};

pub use client::{ClientConfig, Credentials, FocusflowClient};
