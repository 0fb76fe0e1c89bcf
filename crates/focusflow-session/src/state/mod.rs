/*
[INPUT]:  Local persistence backends
[OUTPUT]: Key/value storage used for session resumption
[POS]:    State layer - client-side persistence
[UPDATE]: When adding storage backends
*/

pub mod storage;

pub use storage::{JsonFileStore, KeyValueStore, MemoryStore, StorageError};
