use super::{ResponseSession, SessionStatus};
use crate::data::{Answer, Answers, RawAnswer};
use crate::error::SessionError;
use crate::flow::Flow;
use crate::graph::{FlowGraph, NextNode};
use crate::registry::NodeTypeRegistry;
use chrono::{DateTime, Utc};

/// The result of accepting one answer.
#[derive(Debug, Clone)]
pub struct Advance {
    pub session: ResponseSession,
    pub answer: Answer,
    pub next: NextNode,
}

/// Opens a session at the flow's entry node, passing through any conditional nodes
/// that can be resolved before the first answer.
pub fn start(
    flow: &Flow,
    registry: &NodeTypeRegistry,
    session_id: String,
    now: DateTime<Utc>,
) -> Result<ResponseSession, SessionError> {
    let graph = FlowGraph::new(flow);
    let entry = graph.entry()?;

    let mut session = ResponseSession {
        id: session_id,
        flow: flow.versioned_id(),
        current_node_id: None,
        answers: Answers::new(),
        path: Vec::new(),
        status: SessionStatus::InProgress,
        started_at: now,
        updated_at: now,
    };

    let next = settle(
        &graph,
        registry,
        &mut session.path,
        &session.answers,
        NextNode::Node(entry.id.clone()),
    )?;
    place(&mut session, next);
    Ok(session)
}

/// Accepts `raw` as the answer to `node_id`, returning the advanced session.
///
/// The input session is never modified; on error the caller still holds the state
/// from before the submission.
pub fn advance(
    session: &ResponseSession,
    flow: &Flow,
    registry: &NodeTypeRegistry,
    node_id: &str,
    raw: &RawAnswer,
    now: DateTime<Utc>,
) -> Result<Advance, SessionError> {
    if session.status.is_closed() {
        return Err(SessionError::SessionClosed(session.status));
    }

    let graph = FlowGraph::new(flow);
    if graph
        .node(node_id)
        .is_ok_and(|node| !registry.is_answerable(node))
    {
        return Err(SessionError::InvalidNodeForAnswer(node_id.to_string()));
    }

    // Any id other than the current one, known to the flow or not.
    let expected = session.current_node_id.as_deref().unwrap_or_default();
    if expected != node_id {
        return Err(SessionError::OutOfOrderSubmission {
            expected: expected.to_string(),
            submitted: node_id.to_string(),
        });
    }

    let node = graph
        .node(node_id)
        .map_err(|_| SessionError::UnknownNode(node_id.to_string()))?;
    let value = registry.validate_answer(node, raw)?;
    let answer = Answer {
        node_id: node_id.to_string(),
        value,
        submitted_at: now,
    };

    let mut advanced = session.clone();
    advanced.answers.upsert(answer.clone());
    let next = graph.next_node(node_id, &advanced.answers)?;
    let next = settle(
        &graph,
        registry,
        &mut advanced.path,
        &advanced.answers,
        next,
    )?;
    place(&mut advanced, next.clone());
    advanced.updated_at = now;

    Ok(Advance {
        session: advanced,
        answer,
        next,
    })
}

/// Closes an in-progress session as abandoned.
pub fn abandon(
    session: &ResponseSession,
    now: DateTime<Utc>,
) -> Result<ResponseSession, SessionError> {
    if session.status.is_closed() {
        return Err(SessionError::SessionClosed(session.status));
    }
    let mut abandoned = session.clone();
    abandoned.status = SessionStatus::Abandoned;
    abandoned.current_node_id = None;
    abandoned.updated_at = now;
    Ok(abandoned)
}

/// Follows non-answerable nodes until reaching one a respondent must answer, or the
/// end of the flow. Every node entered is appended to `path`; entering one twice is
/// a cycle.
fn settle(
    graph: &FlowGraph<'_>,
    registry: &NodeTypeRegistry,
    path: &mut Vec<String>,
    answers: &Answers,
    mut next: NextNode,
) -> Result<NextNode, SessionError> {
    loop {
        let NextNode::Node(node_id) = &next else {
            return Ok(next);
        };
        if path.iter().any(|visited| visited == node_id) {
            return Err(SessionError::CycleDetected(node_id.clone()));
        }
        path.push(node_id.clone());

        let node = graph.node(node_id)?;
        if registry.is_answerable(node) {
            return Ok(next);
        }
        next = graph.next_node(node_id, answers)?;
    }
}

fn place(session: &mut ResponseSession, next: NextNode) {
    match next {
        NextNode::Node(node_id) => session.current_node_id = Some(node_id),
        NextNode::Terminal => {
            session.current_node_id = None;
            session.status = SessionStatus::Completed;
        }
    }
}
