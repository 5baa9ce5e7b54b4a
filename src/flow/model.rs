use crate::condition::Branch;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The built-in node kinds a flow can be assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    TextInput,
    EmailInput,
    NumberInput,
    SingleChoice,
    DatePicker,
    FileUpload,
    Conditional,
}

impl NodeKind {
    pub const ALL: [NodeKind; 7] = [
        NodeKind::TextInput,
        NodeKind::EmailInput,
        NodeKind::NumberInput,
        NodeKind::SingleChoice,
        NodeKind::DatePicker,
        NodeKind::FileUpload,
        NodeKind::Conditional,
    ];

    /// The canonical registry name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::TextInput => "text_input",
            NodeKind::EmailInput => "email_input",
            NodeKind::NumberInput => "number_input",
            NodeKind::SingleChoice => "single_choice",
            NodeKind::DatePicker => "date_picker",
            NodeKind::FileUpload => "file_upload",
            NodeKind::Conditional => "conditional",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextConfig {
    #[serde(default)]
    pub max_length: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmailConfig {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NumberConfig {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChoiceConfig {
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DateConfig {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub max_size_bytes: Option<u64>,
    /// MIME types such as `application/pdf`, or a family wildcard like `image/*`.
    /// Empty means any type.
    #[serde(default)]
    pub allowed_types: Vec<String>,
}

impl FileConfig {
    pub fn is_unconstrained(&self) -> bool {
        self.max_size_bytes.is_none() && self.allowed_types.is_empty()
    }
}

/// Ordered branches; the default (unguarded) branch comes last.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionalConfig {
    pub branches: Vec<Branch>,
}

/// Kind-specific configuration carried by a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeConfig {
    Text(TextConfig),
    Email(EmailConfig),
    Number(NumberConfig),
    Choice(ChoiceConfig),
    Date(DateConfig),
    File(FileConfig),
    Conditional(ConditionalConfig),
}

impl NodeConfig {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeConfig::Text(_) => NodeKind::TextInput,
            NodeConfig::Email(_) => NodeKind::EmailInput,
            NodeConfig::Number(_) => NodeKind::NumberInput,
            NodeConfig::Choice(_) => NodeKind::SingleChoice,
            NodeConfig::Date(_) => NodeKind::DatePicker,
            NodeConfig::File(_) => NodeKind::FileUpload,
            NodeConfig::Conditional(_) => NodeKind::Conditional,
        }
    }

    /// Rejects configurations no answer could ever satisfy.
    pub fn check(&self) -> Result<(), String> {
        match self {
            NodeConfig::Number(NumberConfig {
                min: Some(min),
                max: Some(max),
            }) if min > max => Err(format!("min {} is greater than max {}", min, max)),
            NodeConfig::Choice(config) if config.options.is_empty() => {
                Err("options must not be empty".to_string())
            }
            _ => Ok(()),
        }
    }
}

/// One step of a flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    /// The registry name the node was authored with; answers are validated by the
    /// handler registered under this name.
    pub type_name: String,
    pub label: String,
    pub required: bool,
    pub config: NodeConfig,
}

impl Node {
    pub fn new(id: &str, label: &str, required: bool, config: NodeConfig) -> Self {
        Self {
            id: id.to_string(),
            type_name: config.kind().as_str().to_string(),
            label: label.to_string(),
            required,
            config,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.config.kind()
    }

    pub fn is_conditional(&self) -> bool {
        matches!(self.config, NodeConfig::Conditional(_))
    }

    pub fn branches(&self) -> Option<&[Branch]> {
        match &self.config {
            NodeConfig::Conditional(c) => Some(&c.branches),
            _ => None,
        }
    }
}

/// An unconditional edge between two non-conditional steps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transition {
    pub from: String,
    pub to: String,
}

impl Transition {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

/// Identifies one immutable, published version of a flow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VersionedFlowId {
    pub flow_id: String,
    pub version: u32,
}

impl fmt::Display for VersionedFlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@v{}", self.flow_id, self.version)
    }
}

/// A compiled flow definition. Once published it is shared as an immutable snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    pub id: String,
    pub name: String,
    /// Assigned by the flow store on publish; `0` for an unpublished flow.
    pub version: u32,
    pub nodes: Vec<Node>,
    pub transitions: Vec<Transition>,
    pub entry_node_id: String,
}

impl Flow {
    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    pub fn versioned_id(&self) -> VersionedFlowId {
        VersionedFlowId {
            flow_id: self.id.clone(),
            version: self.version,
        }
    }

    /// Every edge of the graph as `(from, to)`, including the guarded edges of
    /// conditional nodes.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        let plain = self
            .transitions
            .iter()
            .map(|t| (t.from.as_str(), t.to.as_str()));
        let branched = self.nodes.iter().flat_map(|node| {
            node.branches()
                .unwrap_or_default()
                .iter()
                .map(move |b| (node.id.as_str(), b.target.as_str()))
        });
        plain.chain(branched)
    }
}
