use super::schema::{ConfigField, ConfigSchema, FieldType};
use crate::condition::{Branch, Predicate};
use crate::data::AnswerValue;
use crate::error::ValidationError;
use crate::flow::{
    ChoiceConfig, ConditionalConfig, DateConfig, EmailConfig, FileConfig, Node, NodeConfig,
    NodeKind, NumberConfig, TextConfig,
};
use crate::validation;
use ahash::AHashMap;
use serde_json::Value as Json;

/// Defines the contract for one node type: how it is configured and how its
/// answers are validated.
pub trait NodeTypeHandler: Send + Sync {
    /// The name this handler registers under.
    fn type_name(&self) -> &str;

    /// The built-in kind whose configuration this handler produces.
    fn kind(&self) -> NodeKind;

    fn config_schema(&self) -> ConfigSchema;

    /// Turns an authored JSON configuration into a typed one.
    fn parse_config(&self, config: &Json) -> Result<NodeConfig, String>;

    /// Validates a (non-skip) raw answer for `node`.
    fn validate(&self, node: &Node, raw: &Json) -> Result<AnswerValue, ValidationError>;

    /// Whether respondents submit answers to nodes of this type.
    fn is_answerable(&self) -> bool {
        true
    }
}

fn config_object(config: &Json) -> Json {
    if config.is_null() {
        Json::Object(serde_json::Map::new())
    } else {
        config.clone()
    }
}

/// Defines the standard input handlers, their registration, and their creation by name.
macro_rules! define_node_handlers {
    ( $( ($struct_name:ident, $kind:expr, $variant:path, $config:ty, $validator:path, [ $( $field:expr ),* ]) ),* $(,)? ) => {
        $(
            pub struct $struct_name;
            impl NodeTypeHandler for $struct_name {
                fn type_name(&self) -> &str { $kind.as_str() }
                fn kind(&self) -> NodeKind { $kind }
                fn config_schema(&self) -> ConfigSchema { ConfigSchema::new(vec![ $( $field ),* ]) }
                fn parse_config(&self, config: &Json) -> Result<NodeConfig, String> {
                    self.config_schema().check(config)?;
                    serde_json::from_value::<$config>(config_object(config))
                        .map($variant)
                        .map_err(|e| e.to_string())
                }
                fn validate(&self, node: &Node, raw: &Json) -> Result<AnswerValue, ValidationError> {
                    match &node.config {
                        $variant(config) => $validator(node, config, raw),
                        _ => Err(ValidationError::ConfigMismatch {
                            node_id: node.id.clone(),
                            type_name: node.type_name.clone(),
                        }),
                    }
                }
            }
        )*

        pub(super) fn register_default_handlers(registry: &mut AHashMap<String, Box<dyn NodeTypeHandler>>) {
            $( registry.insert($kind.as_str().to_string(), Box::new($struct_name)); )*
            registry.insert(NodeKind::Conditional.as_str().to_string(), Box::new(ConditionalHandler));
        }

        pub(super) fn create_handler_by_name(name: &str) -> Option<Box<dyn NodeTypeHandler>> {
            let kind = NodeKind::from_name(name)?;
            $( if kind == $kind { return Some(Box::new($struct_name)); } )*
            if kind == NodeKind::Conditional {
                return Some(Box::new(ConditionalHandler));
            }
            None
        }
    };
}

define_node_handlers! {
    (TextInputHandler, NodeKind::TextInput, NodeConfig::Text, TextConfig, validation::validate_text, [
        ConfigField::optional("max_length", FieldType::Count, "maximum number of characters")
    ]),
    (EmailInputHandler, NodeKind::EmailInput, NodeConfig::Email, EmailConfig, validation::validate_email, []),
    (NumberInputHandler, NodeKind::NumberInput, NodeConfig::Number, NumberConfig, validation::validate_number, [
        ConfigField::optional("min", FieldType::Number, "inclusive lower bound"),
        ConfigField::optional("max", FieldType::Number, "inclusive upper bound")
    ]),
    (SingleChoiceHandler, NodeKind::SingleChoice, NodeConfig::Choice, ChoiceConfig, validation::validate_choice, [
        ConfigField::required("options", FieldType::StringList, "the selectable option labels, in order")
    ]),
    (DatePickerHandler, NodeKind::DatePicker, NodeConfig::Date, DateConfig, validation::validate_date, []),
    (FileUploadHandler, NodeKind::FileUpload, NodeConfig::File, FileConfig, validation::validate_file, [
        ConfigField::optional("max_size_bytes", FieldType::Count, "largest accepted file"),
        ConfigField::optional("allowed_types", FieldType::StringList, "accepted MIME types, `type/*` allowed")
    ]),
}

/// Routes the session by evaluating its branches; never answered directly.
pub struct ConditionalHandler;

impl NodeTypeHandler for ConditionalHandler {
    fn type_name(&self) -> &str {
        NodeKind::Conditional.as_str()
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Conditional
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new(vec![ConfigField::required(
            "branches",
            FieldType::BranchList,
            "ordered branches; the one without `when` is the default and goes last",
        )])
    }

    fn parse_config(&self, config: &Json) -> Result<NodeConfig, String> {
        self.config_schema().check(config)?;
        let raw_branches = config
            .get("branches")
            .and_then(Json::as_array)
            .ok_or_else(|| "missing required field 'branches'".to_string())?;

        let branches = raw_branches
            .iter()
            .enumerate()
            .map(|(index, raw)| {
                let target = raw
                    .get("target")
                    .and_then(Json::as_str)
                    .ok_or_else(|| format!("branch {} has no \"target\" node id", index))?;
                let when = match raw.get("when") {
                    None | Some(Json::Null) => None,
                    Some(predicate) => Some(
                        Predicate::from_json(predicate)
                            .map_err(|e| format!("branch {}: {}", index, e))?,
                    ),
                };
                Ok(Branch {
                    when,
                    target: target.to_string(),
                })
            })
            .collect::<Result<Vec<_>, String>>()?;

        Ok(NodeConfig::Conditional(ConditionalConfig { branches }))
    }

    fn validate(&self, node: &Node, _raw: &Json) -> Result<AnswerValue, ValidationError> {
        Err(ValidationError::InvalidNodeForAnswer(node.id.clone()))
    }

    fn is_answerable(&self) -> bool {
        false
    }
}
