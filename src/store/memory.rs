use super::{FlowStore, ResponseStore};
use crate::data::{Answer, Answers};
use crate::error::StoreError;
use crate::flow::{Flow, VersionedFlowId};
use crate::session::ResponseSession;
use ahash::AHashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Backend("store lock poisoned".to_string())
}

/// Keeps every published version of every flow in memory.
#[derive(Default)]
pub struct InMemoryFlowStore {
    flows: RwLock<AHashMap<String, Vec<Arc<Flow>>>>,
}

impl InMemoryFlowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FlowStore for InMemoryFlowStore {
    fn get(&self, flow_id: &str, version: Option<u32>) -> Result<Arc<Flow>, StoreError> {
        let flows = self.flows.read().map_err(poisoned)?;
        let versions = flows.get(flow_id);
        let found = match version {
            Some(v) => versions.and_then(|all| all.iter().find(|f| f.version == v)),
            None => versions.and_then(|all| all.last()),
        };
        found.cloned().ok_or_else(|| StoreError::FlowNotFound {
            flow_id: flow_id.to_string(),
            version,
        })
    }

    fn put(&self, mut flow: Flow) -> Result<VersionedFlowId, StoreError> {
        let mut flows = self.flows.write().map_err(poisoned)?;
        let versions = flows.entry(flow.id.clone()).or_default();
        flow.version = versions.last().map_or(1, |latest| latest.version + 1);
        let id = flow.versioned_id();
        versions.push(Arc::new(flow));
        debug!(flow = %id, "Stored flow version");
        Ok(id)
    }

    fn versions(&self, flow_id: &str) -> Result<Vec<u32>, StoreError> {
        let flows = self.flows.read().map_err(poisoned)?;
        Ok(flows
            .get(flow_id)
            .map(|all| all.iter().map(|f| f.version).collect())
            .unwrap_or_default())
    }
}

/// Keeps session state and answers in memory.
#[derive(Default)]
pub struct InMemoryResponseStore {
    sessions: RwLock<AHashMap<String, ResponseSession>>,
    answers: RwLock<AHashMap<String, Answers>>,
}

impl InMemoryResponseStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResponseStore for InMemoryResponseStore {
    fn append_answer(&self, session_id: &str, answer: &Answer) -> Result<(), StoreError> {
        let mut answers = self.answers.write().map_err(poisoned)?;
        answers
            .entry(session_id.to_string())
            .or_default()
            .upsert(answer.clone());
        Ok(())
    }

    fn save_session_state(&self, session: &ResponseSession) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    fn load_session(&self, session_id: &str) -> Result<ResponseSession, StoreError> {
        let sessions = self.sessions.read().map_err(poisoned)?;
        sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))
    }

    fn answers(&self, session_id: &str) -> Result<Vec<Answer>, StoreError> {
        let answers = self.answers.read().map_err(poisoned)?;
        Ok(answers
            .get(session_id)
            .map(|a| a.iter().cloned().collect())
            .unwrap_or_default())
    }
}
