//! # Dynaflow - Flow Definition and Response Evaluation Engine
//!
//! **Dynaflow** models "dynamic flows": branching sequences of typed prompts (text,
//! email, number, single choice, date, file upload) joined by conditional routing
//! nodes. Operators author a flow once; respondents then walk it in independent
//! sessions that validate every answer and pick the next step from the answers
//! collected so far.
//!
//! ## Core Workflow
//!
//! 1.  **Author**: Describe the flow as a [`flow::FlowDocument`] (usually JSON), or
//!     implement [`flow::IntoFlowDocument`] for your own format.
//! 2.  **Compile & Publish**: A [`compiler::FlowCompiler`] builds typed nodes through the
//!     [`registry::NodeTypeRegistry`], checks the graph structure, and publishes the
//!     result to a [`store::FlowStore`] as an immutable version.
//! 3.  **Respond**: A [`session::SessionEngine`] opens sessions against a published
//!     version and accepts answers one node at a time.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dynaflow::prelude::*;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! fn main() -> Result<()> {
//!     let document = FlowDocument::from_json(r#"{
//!         "id": "signup",
//!         "name": "Sign up",
//!         "entry": "age",
//!         "nodes": [
//!             {"id": "age", "type": "number_input", "required": true, "config": {"min": 0}},
//!             {"id": "route", "type": "conditional", "config": {"branches": [
//!                 {"when": {"op": "lt", "answer": "age", "value": 18}, "target": "guardian"},
//!                 {"target": "email"}
//!             ]}},
//!             {"id": "guardian", "type": "email_input", "required": true},
//!             {"id": "email", "type": "email_input", "required": true}
//!         ],
//!         "transitions": [{"from": "age", "to": "route"}]
//!     }"#)?;
//!
//!     let registry = Arc::new(NodeTypeRegistry::default());
//!     let flows = Arc::new(InMemoryFlowStore::new());
//!     let published = FlowCompiler::new(registry.clone()).publish(flows.as_ref(), document)?;
//!
//!     let engine = SessionEngine::builder(flows, Arc::new(InMemoryResponseStore::new()))
//!         .with_registry(registry)
//!         .build();
//!
//!     let session = engine.start(&published.id.flow_id, None)?;
//!     let next = engine.submit_answer(&session.id, "age", json!(16))?;
//!     assert_eq!(next, NextNode::Node("guardian".to_string()));
//!     engine.submit_answer(&session.id, "guardian", "parent@example.com")?;
//!     assert!(engine.session(&session.id)?.is_completed());
//!     Ok(())
//! }
//! ```

pub mod compiler;
pub mod condition;
pub mod data;
pub mod error;
pub mod flow;
pub mod graph;
pub mod prelude;
pub mod registry;
pub mod session;
pub mod store;
pub mod validation;
