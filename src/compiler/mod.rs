use crate::error::{AuthoringError, PublishError, Severity, StructuralError};
use crate::flow::{Flow, IntoFlowDocument, Transition, VersionedFlowId};
use crate::graph::validate_structure;
use crate::registry::NodeTypeRegistry;
use crate::store::FlowStore;
use itertools::Itertools;
use std::sync::Arc;
use tracing::{info, warn};

/// A flow that passed authoring validation, with the warnings that did not block it.
#[derive(Debug, Clone)]
pub struct CompiledFlow {
    pub flow: Flow,
    pub warnings: Vec<StructuralError>,
}

/// The versioned id a flow was published under, with its authoring warnings.
#[derive(Debug, Clone)]
pub struct PublishedFlow {
    pub id: VersionedFlowId,
    pub warnings: Vec<StructuralError>,
}

/// Turns authored flow documents into typed, structurally valid flows.
pub struct FlowCompiler {
    registry: Arc<NodeTypeRegistry>,
}

impl FlowCompiler {
    pub fn new(registry: Arc<NodeTypeRegistry>) -> Self {
        Self { registry }
    }

    /// Builds every node through the registry, then checks the graph structure.
    ///
    /// Unknown node types, invalid configurations and error-severity structural
    /// findings fail compilation. Warnings are logged and returned alongside the flow.
    pub fn compile<D: IntoFlowDocument>(&self, source: D) -> Result<CompiledFlow, AuthoringError> {
        let document = source.into_document()?;

        let nodes = document
            .nodes
            .iter()
            .map(|doc| self.registry.build_node(doc))
            .collect::<Result<Vec<_>, _>>()?;

        let flow = Flow {
            id: document.id,
            name: document.name,
            version: 0,
            nodes,
            transitions: document
                .transitions
                .iter()
                .map(|t| Transition::new(&t.from, &t.to))
                .collect(),
            entry_node_id: document.entry,
        };

        let findings = validate_structure(&flow).err().unwrap_or_default();
        let (errors, warnings): (Vec<_>, Vec<_>) = findings
            .into_iter()
            .partition(|f| f.severity() == Severity::Error);

        if !errors.is_empty() {
            return Err(AuthoringError::Structure(errors));
        }
        for warning in &warnings {
            warn!(flow = %flow.id, "{}", warning);
        }

        Ok(CompiledFlow { flow, warnings })
    }

    /// Compiles `source` and stores it as a new immutable version.
    pub fn publish<D: IntoFlowDocument>(
        &self,
        store: &dyn FlowStore,
        source: D,
    ) -> Result<PublishedFlow, PublishError> {
        let CompiledFlow { flow, warnings } = self.compile(source)?;
        let kinds = flow.nodes.iter().map(|n| n.kind()).counts();
        let id = store.put(flow)?;
        info!(
            flow = %id,
            nodes = kinds.values().sum::<usize>(),
            conditionals = kinds.get(&crate::flow::NodeKind::Conditional).copied().unwrap_or(0),
            warnings = warnings.len(),
            "Published flow"
        );
        Ok(PublishedFlow { id, warnings })
    }
}

impl Default for FlowCompiler {
    fn default() -> Self {
        Self::new(Arc::new(NodeTypeRegistry::default()))
    }
}
