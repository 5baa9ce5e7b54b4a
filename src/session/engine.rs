use super::{ResponseSession, SessionStatus, transition};
use crate::data::RawAnswer;
use crate::error::{SessionError, StoreError};
use crate::graph::NextNode;
use crate::registry::NodeTypeRegistry;
use crate::store::{FlowStore, ResponseStore};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, info};
use uuid::Uuid;

/// Drives response sessions against published flows.
///
/// Every mutation of a session runs under a mutex keyed by its id, so two
/// submissions for the same session never interleave. Distinct sessions proceed in
/// parallel; the only thing they share is the immutable flow snapshot.
pub struct SessionEngine {
    flows: Arc<dyn FlowStore>,
    responses: Arc<dyn ResponseStore>,
    registry: Arc<NodeTypeRegistry>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

pub struct SessionEngineBuilder {
    flows: Arc<dyn FlowStore>,
    responses: Arc<dyn ResponseStore>,
    registry: Option<Arc<NodeTypeRegistry>>,
}

impl SessionEngineBuilder {
    /// Uses `registry` for answer validation. It should be the registry the flows
    /// were compiled with.
    pub fn with_registry(mut self, registry: Arc<NodeTypeRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn build(self) -> SessionEngine {
        SessionEngine {
            flows: self.flows,
            responses: self.responses,
            registry: self
                .registry
                .unwrap_or_else(|| Arc::new(NodeTypeRegistry::default())),
            locks: DashMap::new(),
        }
    }
}

impl SessionEngine {
    pub fn builder(
        flows: Arc<dyn FlowStore>,
        responses: Arc<dyn ResponseStore>,
    ) -> SessionEngineBuilder {
        SessionEngineBuilder {
            flows,
            responses,
            registry: None,
        }
    }

    /// Opens a new session on a flow version (`None` for the latest).
    pub fn start(
        &self,
        flow_id: &str,
        version: Option<u32>,
    ) -> Result<ResponseSession, SessionError> {
        let flow = self.flows.get(flow_id, version)?;
        let session_id = Uuid::new_v4().to_string();
        let session = transition::start(&flow, &self.registry, session_id, Utc::now())?;
        self.responses.save_session_state(&session)?;
        info!(
            session = %session.id,
            flow = %session.flow,
            current = ?session.current_node_id,
            "Session started"
        );
        Ok(session)
    }

    /// Submits an answer for the session's current node and returns where it goes next.
    ///
    /// The answer is appended to the response store before the advanced session
    /// state is saved. If either write fails the stored session still points at the
    /// same node, so the submission can simply be retried.
    pub fn submit_answer(
        &self,
        session_id: &str,
        node_id: &str,
        raw: impl Into<RawAnswer>,
    ) -> Result<NextNode, SessionError> {
        let raw = raw.into();
        let lock = self.lock_for(session_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let result = self.apply_answer(session_id, node_id, &raw);
        if let Err(e) = &result {
            self.release_if_dead(session_id, e);
        }
        result
    }

    fn apply_answer(
        &self,
        session_id: &str,
        node_id: &str,
        raw: &RawAnswer,
    ) -> Result<NextNode, SessionError> {
        let session = self.responses.load_session(session_id)?;
        let flow = self
            .flows
            .get(&session.flow.flow_id, Some(session.flow.version))?;

        let now = Utc::now();
        let advance = match transition::advance(&session, &flow, &self.registry, node_id, raw, now)
        {
            Ok(advance) => advance,
            Err(e) if e.is_invariant_violation() => {
                error!(
                    session = %session_id,
                    node = %node_id,
                    error = %e,
                    "Flow misbehaved at runtime, abandoning session"
                );
                let abandoned = transition::abandon(&session, Utc::now())?;
                self.responses.save_session_state(&abandoned)?;
                self.release(session_id);
                return Err(e);
            }
            Err(e) => {
                debug!(session = %session_id, node = %node_id, error = %e, "Answer rejected");
                return Err(e);
            }
        };

        self.responses.append_answer(session_id, &advance.answer)?;
        self.responses.save_session_state(&advance.session)?;

        debug!(session = %session_id, node = %node_id, next = ?advance.next, "Answer accepted");
        if advance.session.status == SessionStatus::Completed {
            info!(
                session = %session_id,
                answers = advance.session.answers.len(),
                "Session completed"
            );
            self.release(session_id);
        }
        Ok(advance.next)
    }

    /// Marks an in-progress session as abandoned. Closed sessions are left alone.
    pub fn abandon(&self, session_id: &str) -> Result<ResponseSession, SessionError> {
        let lock = self.lock_for(session_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let abandoned = self
            .responses
            .load_session(session_id)
            .map_err(SessionError::from)
            .and_then(|session| transition::abandon(&session, Utc::now()));
        let abandoned = match abandoned {
            Ok(abandoned) => abandoned,
            Err(e) => {
                self.release_if_dead(session_id, &e);
                return Err(e);
            }
        };
        self.responses.save_session_state(&abandoned)?;
        info!(session = %session_id, "Session abandoned");
        self.release(session_id);
        Ok(abandoned)
    }

    pub fn session(&self, session_id: &str) -> Result<ResponseSession, SessionError> {
        Ok(self.responses.load_session(session_id)?)
    }

    fn lock_for(&self, session_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(session_id.to_string())
            .or_default()
            .clone()
    }

    /// Number of sessions currently holding a lock entry.
    pub fn active_locks(&self) -> usize {
        self.locks.len()
    }

    // Closed sessions reject every mutation, so their lock can go.
    fn release(&self, session_id: &str) {
        self.locks.remove(session_id);
    }

    // Unknown and closed sessions never need their lock again.
    fn release_if_dead(&self, session_id: &str, error: &SessionError) {
        if matches!(
            error,
            SessionError::SessionClosed(_)
                | SessionError::Persistence(StoreError::SessionNotFound(_))
        ) {
            self.release(session_id);
        }
    }
}
