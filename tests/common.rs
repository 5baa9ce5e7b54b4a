//! Common test utilities for building flows and engines.
use dynaflow::error::StoreError;
use dynaflow::prelude::*;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Two answerable nodes in a row.
///
/// Logic: `name` (text) -> `contact` (email) -> end
#[allow(dead_code)]
pub fn linear_document() -> FlowDocument {
    FlowDocument {
        id: "contact".to_string(),
        name: "Contact details".to_string(),
        entry: "name".to_string(),
        ..Default::default()
    }
    .with_node("name", "text_input", "Your name", true, json!({"max_length": 40}))
    .with_node("contact", "email_input", "Your email", true, json!({}))
    .with_transition("name", "contact")
}

/// Routes on a numeric answer through a conditional node.
///
/// Logic: `age` -> `route`: `$age < 18` -> `minor`, `$age >= 65` -> `senior`, else `adult`
#[allow(dead_code)]
pub fn age_routing_document() -> FlowDocument {
    FlowDocument {
        id: "age-routing".to_string(),
        name: "Age routing".to_string(),
        entry: "age".to_string(),
        ..Default::default()
    }
    .with_node("age", "number_input", "Your age", true, json!({"min": 0, "max": 130}))
    .with_node(
        "route",
        "conditional",
        "",
        false,
        json!({"branches": [
            {"when": {"op": "lt", "answer": "age", "value": 18}, "target": "minor"},
            {"when": {"op": "gte", "answer": "age", "value": 65}, "target": "senior"},
            {"target": "adult"}
        ]}),
    )
    .with_node("minor", "email_input", "Guardian email", true, json!({}))
    .with_node("adult", "text_input", "Occupation", false, json!({}))
    .with_node("senior", "single_choice", "Retired?", true, json!({"options": ["yes", "no"]}))
    .with_transition("age", "route")
}

/// Two nodes that lead back into each other. Structurally valid, but a session
/// would enter `first` twice.
#[allow(dead_code)]
pub fn looping_document() -> FlowDocument {
    FlowDocument {
        id: "loop".to_string(),
        name: "Loop".to_string(),
        entry: "first".to_string(),
        ..Default::default()
    }
    .with_node("first", "text_input", "First", true, json!({}))
    .with_node("second", "text_input", "Second", true, json!({}))
    .with_transition("first", "second")
    .with_transition("second", "first")
}

/// Compiles a document with the default registry, panicking on failure.
#[allow(dead_code)]
pub fn compile(document: FlowDocument) -> Flow {
    FlowCompiler::default()
        .compile(document)
        .expect("test flow should compile")
        .flow
}

/// An engine over fresh in-memory stores with `document` already published.
#[allow(dead_code)]
pub fn engine_with(document: FlowDocument) -> (SessionEngine, Arc<InMemoryFlowStore>, String) {
    let flows = Arc::new(InMemoryFlowStore::new());
    let published = FlowCompiler::default()
        .publish(flows.as_ref(), document)
        .expect("test flow should publish");
    let engine = SessionEngine::builder(flows.clone(), Arc::new(InMemoryResponseStore::new())).build();
    (engine, flows, published.id.flow_id)
}

/// A response store that can be told to fail its writes.
#[allow(dead_code)]
#[derive(Default)]
pub struct FlakyResponseStore {
    inner: InMemoryResponseStore,
    pub fail_appends: AtomicBool,
    pub fail_saves: AtomicBool,
}

#[allow(dead_code)]
impl FlakyResponseStore {
    pub fn fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

impl ResponseStore for FlakyResponseStore {
    fn append_answer(&self, session_id: &str, answer: &Answer) -> Result<(), StoreError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("append refused".to_string()));
        }
        self.inner.append_answer(session_id, answer)
    }

    fn save_session_state(&self, session: &ResponseSession) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("save refused".to_string()));
        }
        self.inner.save_session_state(session)
    }

    fn load_session(&self, session_id: &str) -> Result<ResponseSession, StoreError> {
        self.inner.load_session(session_id)
    }

    fn answers(&self, session_id: &str) -> Result<Vec<Answer>, StoreError> {
        self.inner.answers(session_id)
    }
}
