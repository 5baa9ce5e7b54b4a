//! Response sessions: one respondent's walk through a published flow.
//!
//! [`transition`] holds the pure state-transition functions; [`SessionEngine`]
//! wires them to the stores and serializes work per session.

use crate::data::Answers;
use crate::flow::VersionedFlowId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

mod engine;
pub mod transition;

pub use engine::{SessionEngine, SessionEngineBuilder};
pub use transition::Advance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
    Abandoned,
}

impl SessionStatus {
    pub fn is_closed(&self) -> bool {
        !matches!(self, SessionStatus::InProgress)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
            SessionStatus::Abandoned => "abandoned",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSession {
    pub id: String,
    /// The exact flow version this session walks; re-resolved on every step.
    pub flow: VersionedFlowId,
    /// The node waiting for an answer. `None` once the session is closed.
    pub current_node_id: Option<String>,
    pub answers: Answers,
    /// Every node the session has entered, conditional nodes included.
    pub path: Vec<String>,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResponseSession {
    pub fn is_completed(&self) -> bool {
        self.status == SessionStatus::Completed
    }
}
