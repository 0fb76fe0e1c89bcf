/*
[INPUT]:  Remote adapter errors, persistence errors, rejected re-entrant commands
[OUTPUT]: SessionError surfaced by the tracker and flow state machines
[POS]:    Error handling layer - session crate library errors
[UPDATE]: When adding new failure sources to the state machines
*/

use focusflow_adapter::FocusflowError;
use thiserror::Error;

use crate::state::storage::StorageError;

#[derive(Error, Debug)]
pub enum SessionError {
    /// Remote call failed; nothing is retried or rolled back
    #[error("remote call failed: {0}")]
    Remote(#[from] FocusflowError),

    /// Local persistence failed
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Another flow command is still awaiting the server
    #[error("{operation} rejected: another flow command is in flight")]
    Busy { operation: &'static str },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SessionError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SessionError::Remote(err) if err.is_not_found())
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, SessionError::Busy { .. })
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
