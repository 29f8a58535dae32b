//! Document store collaborator: JSON documents keyed by user id and track
//! id, written by a background writer that coalesces saves per track.
//!
//! The store is local-first: controller mutations are authoritative and a
//! failed write is logged and surfaced, never rolled back.

mod document;
mod json;
mod session;
mod sync;

pub use document::{SnippetDocument, TrackDocument};
pub use json::JsonFileStore;
pub use session::SessionToken;
pub use sync::{Persister, StoreEvent, StoreWriter};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Persistence contract. Session identity is an explicit argument on every
/// call, never ambient state.
pub trait TrackStore: Send {
    fn save(&self, session: &SessionToken, doc: &TrackDocument) -> Result<(), StoreError>;
    fn delete(&self, session: &SessionToken, track_id: &str) -> Result<(), StoreError>;
    fn load_all(&self, session: &SessionToken) -> Result<Vec<TrackDocument>, StoreError>;
}
