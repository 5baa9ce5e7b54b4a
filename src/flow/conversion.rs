use super::document::FlowDocument;
use crate::error::FlowConversionError;

/// A trait for custom data models that can be converted into a `FlowDocument`.
///
/// This is the primary extension point for keeping the engine format-agnostic. By
/// implementing this trait on your own structs, you provide a translation layer that
/// allows the flow compiler to process your custom authoring format.
///
/// # Example
///
/// ```rust,no_run
/// use dynaflow::error::FlowConversionError;
/// use dynaflow::flow::{FlowDocument, IntoFlowDocument};
///
/// struct Question { key: String, prompt: String }
/// struct Survey { questions: Vec<Question> }
///
/// impl IntoFlowDocument for Survey {
///     fn into_document(self) -> Result<FlowDocument, FlowConversionError> {
///         let first = self
///             .questions
///             .first()
///             .ok_or_else(|| FlowConversionError::ValidationError("empty survey".into()))?
///             .key
///             .clone();
///         let mut doc = FlowDocument { id: "survey".into(), entry: first, ..Default::default() };
///         let keys: Vec<String> = self.questions.iter().map(|q| q.key.clone()).collect();
///         for q in self.questions {
///             doc = doc.with_node(&q.key, "text_input", &q.prompt, true, serde_json::json!({}));
///         }
///         for pair in keys.windows(2) {
///             doc = doc.with_transition(&pair[0], &pair[1]);
///         }
///         Ok(doc)
///     }
/// }
/// ```
pub trait IntoFlowDocument {
    /// Consumes the object and converts it into the canonical authoring format.
    fn into_document(self) -> Result<FlowDocument, FlowConversionError>;
}

impl IntoFlowDocument for FlowDocument {
    fn into_document(self) -> Result<FlowDocument, FlowConversionError> {
        Ok(self)
    }
}
