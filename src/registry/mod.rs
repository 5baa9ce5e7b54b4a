//! The node type registry: the single place that knows which node types exist,
//! what configuration they take, and how their answers are validated.

use crate::data::{AnswerValue, RawAnswer};
use crate::error::{AuthoringError, ValidationError};
use crate::flow::{Node, NodeDocument, NodeKind};
use ahash::AHashMap;
use itertools::Itertools;

mod handlers;
pub mod schema;

pub use handlers::{ConditionalHandler, NodeTypeHandler};
pub use schema::{ConfigField, ConfigSchema, FieldType};

use handlers::{create_handler_by_name, register_default_handlers};

pub struct NodeTypeRegistry {
    handlers: AHashMap<String, Box<dyn NodeTypeHandler>>,
}

pub struct NodeTypeRegistryBuilder {
    handlers: AHashMap<String, Box<dyn NodeTypeHandler>>,
}

impl NodeTypeRegistryBuilder {
    pub fn new() -> Self {
        let mut handlers: AHashMap<String, Box<dyn NodeTypeHandler>> = AHashMap::new();
        register_default_handlers(&mut handlers);
        Self { handlers }
    }

    /// Lets documents use `user_type_name` for the built-in `canonical_name` kind.
    /// Unknown canonical names are ignored.
    pub fn with_type_mapping(mut self, user_type_name: &str, canonical_name: &str) -> Self {
        if let Some(handler) = create_handler_by_name(canonical_name) {
            self.handlers.insert(user_type_name.to_string(), handler);
        }
        self
    }

    /// Registers a handler under its own name, replacing any existing one.
    pub fn with_custom_handler(mut self, handler: Box<dyn NodeTypeHandler>) -> Self {
        self.handlers.insert(handler.type_name().to_string(), handler);
        self
    }

    pub fn build(self) -> NodeTypeRegistry {
        NodeTypeRegistry {
            handlers: self.handlers,
        }
    }
}

impl Default for NodeTypeRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeTypeRegistry {
    pub fn builder() -> NodeTypeRegistryBuilder {
        NodeTypeRegistryBuilder::new()
    }

    pub fn handler(&self, type_name: &str) -> Option<&dyn NodeTypeHandler> {
        self.handlers.get(type_name).map(|h| h.as_ref())
    }

    /// Turns an authored node into a typed one through the handler for its type.
    pub fn build_node(&self, doc: &NodeDocument) -> Result<Node, AuthoringError> {
        let handler = self
            .handler(&doc.type_name)
            .ok_or_else(|| AuthoringError::UnknownNodeType {
                node_id: doc.id.clone(),
                type_name: doc.type_name.clone(),
            })?;
        let config = handler
            .parse_config(&doc.config)
            .and_then(|config| config.check().map(|()| config))
            .map_err(|message| AuthoringError::InvalidConfig {
                node_id: doc.id.clone(),
                message,
            })?;
        Ok(Node {
            id: doc.id.clone(),
            type_name: doc.type_name.clone(),
            label: doc.label.clone(),
            required: doc.required,
            config,
        })
    }

    pub fn is_answerable(&self, node: &Node) -> bool {
        self.handler(&node.type_name)
            .map_or(!node.is_conditional(), |h| h.is_answerable())
    }

    /// Validates a submitted answer for `node`.
    ///
    /// Nodes that cannot be answered reject everything. The skip marker is accepted
    /// only by optional nodes and bypasses the type-specific checks.
    pub fn validate_answer(
        &self,
        node: &Node,
        raw: &RawAnswer,
    ) -> Result<AnswerValue, ValidationError> {
        let handler = self
            .handler(&node.type_name)
            .ok_or_else(|| ValidationError::UnknownNodeType {
                node_id: node.id.clone(),
                type_name: node.type_name.clone(),
            })?;

        if !handler.is_answerable() {
            return Err(ValidationError::InvalidNodeForAnswer(node.id.clone()));
        }

        match raw {
            RawAnswer::Skip if node.required => Err(ValidationError::Required(node.id.clone())),
            RawAnswer::Skip => Ok(AnswerValue::Skipped),
            RawAnswer::Value(value) => handler.validate(node, value),
        }
    }

    /// Every registered type name with the kind it produces and its schema, sorted by name.
    pub fn describe(&self) -> Vec<(&str, NodeKind, ConfigSchema)> {
        self.handlers
            .iter()
            .map(|(name, handler)| (name.as_str(), handler.kind(), handler.config_schema()))
            .sorted_by(|a, b| a.0.cmp(b.0))
            .collect()
    }
}

impl Default for NodeTypeRegistry {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_is_registered_under_its_canonical_name() {
        let registry = NodeTypeRegistry::default();
        for kind in NodeKind::ALL {
            let handler = registry.handler(kind.as_str()).unwrap();
            assert_eq!(handler.kind(), kind);
        }
        assert_eq!(registry.describe().len(), NodeKind::ALL.len());
    }

    #[test]
    fn type_mapping_ignores_unknown_targets() {
        let registry = NodeTypeRegistry::builder()
            .with_type_mapping("short_text", "text_input")
            .with_type_mapping("signature", "canvas")
            .build();
        assert!(registry.handler("short_text").is_some());
        assert!(registry.handler("signature").is_none());
    }
}
