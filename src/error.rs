use crate::session::SessionStatus;
use thiserror::Error;

/// How seriously a structural finding should be taken when publishing a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Surfaced to the author, but the flow can still be published.
    Warning,
    /// The flow cannot be published.
    Error,
}

/// Problems found while checking the shape of a flow graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("Flow '{0}' has no nodes")]
    EmptyFlow(String),

    #[error("Node id '{0}' is declared more than once")]
    DuplicateNodeId(String),

    #[error("Entry node '{0}' does not exist in the flow")]
    MissingEntryNode(String),

    #[error("Transition from '{from}' to '{to}' references a node that does not exist")]
    DanglingTransition { from: String, to: String },

    #[error("Node '{node_id}' has {count} outgoing transitions, but at most one is allowed")]
    AmbiguousTransition { node_id: String, count: usize },

    #[error(
        "Conditional node '{0}' has plain transitions; conditional routing must be expressed as branches"
    )]
    ConditionalWithTransition(String),

    #[error("Conditional node '{0}' has no branches")]
    EmptyBranches(String),

    #[error("Conditional node '{0}' has no default branch")]
    MissingDefaultBranch(String),

    #[error("Conditional node '{node_id}' declares {count} default branches, expected exactly one")]
    MultipleDefaultBranches { node_id: String, count: usize },

    #[error("The default branch of conditional node '{0}' must be declared last")]
    DefaultBranchNotLast(String),

    #[error("A predicate in conditional node '{node_id}' references unknown node '{missing}'")]
    UnknownPredicateReference { node_id: String, missing: String },

    #[error("Node '{0}' is not reachable from the entry node")]
    UnreachableNode(String),
}

impl StructuralError {
    pub fn severity(&self) -> Severity {
        match self {
            StructuralError::UnreachableNode(_) => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

/// Errors raised while turning a `FlowDocument` into a publishable `Flow`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthoringError {
    #[error("Node '{node_id}' has an unregistered node type: '{type_name}'")]
    UnknownNodeType { node_id: String, type_name: String },

    #[error("Node '{node_id}' has an invalid configuration: {message}")]
    InvalidConfig { node_id: String, message: String },

    #[error("Flow failed structural validation: {}", format_structural(.0))]
    Structure(Vec<StructuralError>),

    #[error(transparent)]
    Conversion(#[from] FlowConversionError),
}

/// Errors raised while publishing a flow to a store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PublishError {
    #[error(transparent)]
    Authoring(#[from] AuthoringError),

    #[error("Failed to store flow: {0}")]
    Store(#[from] StoreError),
}

fn format_structural(errors: &[StructuralError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Reasons a respondent's answer is rejected. All of these are recoverable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("An answer is required for node '{0}'")]
    Required(String),

    #[error("Answer for node '{node_id}' is not a valid {expected}")]
    InvalidFormat { node_id: String, expected: String },

    #[error("Answer for node '{node_id}' exceeds the maximum length of {max_length} characters")]
    TooLong { node_id: String, max_length: usize },

    #[error("Answer for node '{0}' is not a number")]
    NotANumber(String),

    #[error("Answer {value} for node '{node_id}' is outside the allowed range [{min}, {max}]")]
    OutOfRange {
        node_id: String,
        value: f64,
        min: String,
        max: String,
    },

    #[error("'{value}' is not one of the options of node '{node_id}'")]
    InvalidOption { node_id: String, value: String },

    #[error("Answer for node '{node_id}' is not a date in YYYY-MM-DD format: '{value}'")]
    InvalidDate { node_id: String, value: String },

    #[error("File for node '{node_id}' violates its constraints: {reason}")]
    FileConstraintViolation { node_id: String, reason: String },

    #[error("Node '{0}' cannot be answered directly")]
    InvalidNodeForAnswer(String),

    #[error("Node '{node_id}' is registered as '{type_name}' but carries a different configuration")]
    ConfigMismatch { node_id: String, type_name: String },

    #[error("Node '{node_id}' uses unregistered node type '{type_name}'")]
    UnknownNodeType { node_id: String, type_name: String },
}

/// Errors that can occur while resolving a conditional node.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    #[error("No branch matched and no default branch is declared")]
    NoMatchingBranch,
}

/// Errors that can occur when walking the flow graph at runtime.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Node '{0}' does not exist in the flow")]
    UnknownNode(String),

    #[error("Conditional node '{node_id}' could not be resolved: {source}")]
    Evaluation {
        node_id: String,
        #[source]
        source: EvaluationError,
    },
}

/// Errors reported by flow and response stores.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Flow '{flow_id}' (version {version:?}) not found")]
    FlowNotFound {
        flow_id: String,
        version: Option<u32>,
    },

    #[error("Session '{0}' not found")]
    SessionNotFound(String),

    #[error("Storage backend failure: {0}")]
    Backend(String),
}

/// Errors surfaced by the response session state machine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Answer submitted for node '{submitted}' but the session is waiting on '{expected}'")]
    OutOfOrderSubmission { expected: String, submitted: String },

    #[error("Node '{0}' cannot be answered directly")]
    InvalidNodeForAnswer(String),

    #[error("Node '{0}' does not exist in the flow")]
    UnknownNode(String),

    #[error("Session is {0} and accepts no further changes")]
    SessionClosed(SessionStatus),

    #[error("Session would visit node '{0}' a second time")]
    CycleDetected(String),

    #[error("Flow resolution failed at runtime: {0}")]
    Graph(#[from] GraphError),

    #[error("Persistence failed: {0}")]
    Persistence(#[from] StoreError),
}

impl SessionError {
    /// Engine invariant violations abandon the session; everything else leaves it as it was.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, SessionError::CycleDetected(_) | SessionError::Graph(_))
    }
}

/// Errors that can occur when saving or loading a flow snapshot.
#[derive(Error, Debug, Clone)]
pub enum ArtifactError {
    #[error("Snapshot I/O failed: {0}")]
    Io(String),

    #[error("Snapshot encoding failed: {0}")]
    Encode(String),

    #[error("Snapshot decoding failed: {0}")]
    Decode(String),
}

/// Errors that can occur when converting a custom user format into a `FlowDocument`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowConversionError {
    #[error("Invalid custom data: {0}")]
    ValidationError(String),

    #[error("Failed to parse flow JSON: {0}")]
    JsonParseError(String),
}
