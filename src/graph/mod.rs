//! The read-only graph view over a compiled flow: structural checks at publish
//! time and next-step resolution at runtime.

use crate::condition::{self, AnswerLookup};
use crate::error::GraphError;
use crate::flow::{Flow, Node};
use ahash::AHashMap;
use tracing::debug;

mod structure;

pub use structure::validate_structure;

/// Where a session goes after a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextNode {
    Node(String),
    /// No further node; the session is complete.
    Terminal,
}

impl NextNode {
    pub fn node_id(&self) -> Option<&str> {
        match self {
            NextNode::Node(id) => Some(id),
            NextNode::Terminal => None,
        }
    }
}

/// Indexed lookups over an immutable `Flow`.
pub struct FlowGraph<'a> {
    flow: &'a Flow,
    nodes: AHashMap<&'a str, &'a Node>,
    outgoing: AHashMap<&'a str, Vec<&'a str>>,
}

impl<'a> FlowGraph<'a> {
    pub fn new(flow: &'a Flow) -> Self {
        let nodes = flow.nodes.iter().map(|n| (n.id.as_str(), n)).collect();
        let mut outgoing: AHashMap<&'a str, Vec<&'a str>> = AHashMap::new();
        for transition in &flow.transitions {
            outgoing
                .entry(transition.from.as_str())
                .or_default()
                .push(transition.to.as_str());
        }
        Self {
            flow,
            nodes,
            outgoing,
        }
    }

    pub fn node(&self, node_id: &str) -> Result<&'a Node, GraphError> {
        self.nodes
            .get(node_id)
            .copied()
            .ok_or_else(|| GraphError::UnknownNode(node_id.to_string()))
    }

    pub fn entry(&self) -> Result<&'a Node, GraphError> {
        self.node(&self.flow.entry_node_id)
    }

    /// Resolves the step after `current_node_id`.
    ///
    /// Plain nodes follow their single outgoing transition, or end the session when
    /// they have none. Conditional nodes pick their target from `answers`, which must
    /// already include the answer that was just submitted.
    pub fn next_node<A: AnswerLookup + ?Sized>(
        &self,
        current_node_id: &str,
        answers: &A,
    ) -> Result<NextNode, GraphError> {
        let node = self.node(current_node_id)?;

        if let Some(branches) = node.branches() {
            let decision =
                condition::evaluate(branches, answers).map_err(|source| GraphError::Evaluation {
                    node_id: node.id.clone(),
                    source,
                })?;
            debug!(
                node = %node.id,
                target = %decision.target,
                branch = ?decision.branch_index,
                reason = %decision.reason,
                "Resolved conditional node"
            );
            return Ok(NextNode::Node(decision.target));
        }

        Ok(self
            .outgoing
            .get(current_node_id)
            .and_then(|targets| targets.first())
            .map_or(NextNode::Terminal, |target| NextNode::Node(target.to_string())))
    }
}
