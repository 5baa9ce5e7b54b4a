//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the dynaflow
//! crate. Import this module to get access to the core functionality without having
//! to import each type individually.

// Authoring and publishing
pub use crate::compiler::{CompiledFlow, FlowCompiler, PublishedFlow};
pub use crate::flow::{
    Flow, FlowDocument, IntoFlowDocument, Node, NodeConfig, NodeKind, Transition,
    VersionedFlowId,
};
pub use crate::registry::{NodeTypeHandler, NodeTypeRegistry};

// Graph and conditions
pub use crate::condition::{Branch, BranchDecision, Operand, Predicate, TraceFormatter, Value};
pub use crate::graph::{FlowGraph, NextNode, validate_structure};

// Sessions and answers
pub use crate::data::{Answer, AnswerValue, FileRef, RawAnswer};
pub use crate::session::{ResponseSession, SessionEngine, SessionStatus};
pub use crate::store::{FlowStore, InMemoryFlowStore, InMemoryResponseStore, ResponseStore};

// Error types
pub use crate::error::{
    AuthoringError, PublishError, SessionError, StoreError, StructuralError, ValidationError,
};

// Result type alias for convenience
pub type Result<T, E = Box<dyn std::error::Error>> = std::result::Result<T, E>;
