//! Storage seams. The engine reads published flows from a [`FlowStore`] and records
//! respondent progress in a [`ResponseStore`]; both are implemented by collaborators.
//! In-memory implementations are provided for tests, tooling and embedding.

use crate::data::Answer;
use crate::error::StoreError;
use crate::flow::{Flow, VersionedFlowId};
use crate::session::ResponseSession;
use std::sync::Arc;

mod memory;

pub use memory::{InMemoryFlowStore, InMemoryResponseStore};

/// Versioned, immutable flow snapshots.
pub trait FlowStore: Send + Sync {
    /// Fetches a published flow. `None` selects the latest version.
    fn get(&self, flow_id: &str, version: Option<u32>) -> Result<Arc<Flow>, StoreError>;

    /// Publishes `flow` as a new version and returns its versioned id. Existing
    /// versions are never modified.
    fn put(&self, flow: Flow) -> Result<VersionedFlowId, StoreError>;

    /// All published versions of a flow, oldest first.
    fn versions(&self, flow_id: &str) -> Result<Vec<u32>, StoreError>;
}

/// Session state and collected answers.
pub trait ResponseStore: Send + Sync {
    /// Records an answer. Idempotent per `(session_id, answer.node_id)`: replaying the
    /// same key replaces the stored answer instead of adding another.
    fn append_answer(&self, session_id: &str, answer: &Answer) -> Result<(), StoreError>;

    fn save_session_state(&self, session: &ResponseSession) -> Result<(), StoreError>;

    fn load_session(&self, session_id: &str) -> Result<ResponseSession, StoreError>;

    /// The answers recorded for a session, in the order they were first appended.
    fn answers(&self, session_id: &str) -> Result<Vec<Answer>, StoreError>;
}
