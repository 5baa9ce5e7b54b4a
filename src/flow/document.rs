use crate::error::FlowConversionError;
use serde::{Deserialize, Serialize};
use std::fs;

/// The canonical authoring format of a flow, ready for compilation.
/// This is the target structure for any custom data model conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowDocument {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(alias = "entryNodeId", alias = "entry_node_id")]
    pub entry: String,
    pub nodes: Vec<NodeDocument>,
    #[serde(default)]
    pub transitions: Vec<TransitionDocument>,
}

/// A single authored node. `config` is interpreted by the handler registered for `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDocument {
    pub id: String,
    #[serde(rename = "type", alias = "nodeType")]
    pub type_name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub config: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionDocument {
    #[serde(alias = "source", alias = "fromNodeId")]
    pub from: String,
    #[serde(alias = "target", alias = "toNodeId")]
    pub to: String,
}

impl FlowDocument {
    pub fn from_json(json: &str) -> Result<Self, FlowConversionError> {
        serde_json::from_str(json).map_err(|e| FlowConversionError::JsonParseError(e.to_string()))
    }

    /// Load a flow document from a JSON file.
    pub fn from_file(path: &str) -> Result<Self, FlowConversionError> {
        let content = fs::read_to_string(path).map_err(|e| {
            FlowConversionError::JsonParseError(format!("Could not read '{}': {}", path, e))
        })?;
        Self::from_json(&content)
    }

    /// Appends a node and returns the document, for building flows in code.
    pub fn with_node(
        mut self,
        id: &str,
        type_name: &str,
        label: &str,
        required: bool,
        config: serde_json::Value,
    ) -> Self {
        self.nodes.push(NodeDocument {
            id: id.to_string(),
            type_name: type_name.to_string(),
            label: label.to_string(),
            required,
            config,
        });
        self
    }

    pub fn with_transition(mut self, from: &str, to: &str) -> Self {
        self.transitions.push(TransitionDocument {
            from: from.to_string(),
            to: to.to_string(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_camel_case_aliases() {
        let doc = FlowDocument::from_json(
            r#"{
                "id": "signup",
                "entryNodeId": "name",
                "nodes": [{"id": "name", "nodeType": "text_input", "required": true}],
                "transitions": [{"source": "name", "target": "mail"}]
            }"#,
        )
        .unwrap();

        assert_eq!(doc.entry, "name");
        assert_eq!(doc.nodes[0].type_name, "text_input");
        assert!(doc.nodes[0].config.is_null());
        assert_eq!(doc.transitions[0].to, "mail");
    }

    #[test]
    fn reports_malformed_json() {
        let err = FlowDocument::from_json("{\"id\": 1}").unwrap_err();
        assert!(matches!(err, FlowConversionError::JsonParseError(_)));
    }
}
