use crate::condition::{AnswerLookup, CANONICAL_DATE_FORMAT, Value};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An unvalidated answer as submitted by a respondent.
#[derive(Debug, Clone, PartialEq)]
pub enum RawAnswer {
    /// Explicitly leaves an optional node unanswered.
    Skip,
    Value(serde_json::Value),
}

impl RawAnswer {
    pub fn text(value: &str) -> Self {
        RawAnswer::Value(serde_json::Value::String(value.to_string()))
    }
}

impl From<serde_json::Value> for RawAnswer {
    /// JSON `null` is the skip marker.
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => RawAnswer::Skip,
            other => RawAnswer::Value(other),
        }
    }
}

impl From<&str> for RawAnswer {
    fn from(value: &str) -> Self {
        RawAnswer::text(value)
    }
}

impl From<f64> for RawAnswer {
    fn from(value: f64) -> Self {
        RawAnswer::Value(serde_json::json!(value))
    }
}

impl From<i64> for RawAnswer {
    fn from(value: i64) -> Self {
        RawAnswer::Value(serde_json::json!(value))
    }
}

/// A handle to content staged by the upload collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileRef {
    pub handle: String,
    #[serde(default, alias = "size")]
    pub size_bytes: u64,
    #[serde(default, alias = "contentType", alias = "mime")]
    pub content_type: String,
}

/// A validated answer, typed by the node that accepted it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnswerValue {
    Text(String),
    Email(String),
    Number(f64),
    Choice(String),
    Date(NaiveDate),
    File(FileRef),
    Skipped,
}

impl AnswerValue {
    /// The value predicates see for this answer.
    pub fn to_value(&self) -> Value {
        match self {
            AnswerValue::Text(s) | AnswerValue::Email(s) | AnswerValue::Choice(s) => {
                Value::Text(s.clone())
            }
            AnswerValue::Number(n) => Value::Number(*n),
            AnswerValue::Date(d) => Value::Date(*d),
            AnswerValue::File(file) => Value::Text(file.handle.clone()),
            AnswerValue::Skipped => Value::Null,
        }
    }
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerValue::Text(s) | AnswerValue::Email(s) | AnswerValue::Choice(s) => {
                write!(f, "{}", s)
            }
            AnswerValue::Number(n) => write!(f, "{}", Value::Number(*n)),
            AnswerValue::Date(d) => write!(f, "{}", d.format(CANONICAL_DATE_FORMAT)),
            AnswerValue::File(file) => write!(f, "file:{}", file.handle),
            AnswerValue::Skipped => write!(f, "(skipped)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub node_id: String,
    pub value: AnswerValue,
    pub submitted_at: DateTime<Utc>,
}

/// Answers in traversal order, at most one per node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Answers(Vec<Answer>);

impl Answers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, node_id: &str) -> Option<&Answer> {
        self.0.iter().find(|a| a.node_id == node_id)
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.get(node_id).is_some()
    }

    /// Records an answer, replacing an existing one for the same node in place.
    pub fn upsert(&mut self, answer: Answer) {
        match self.0.iter_mut().find(|a| a.node_id == answer.node_id) {
            Some(existing) => *existing = answer,
            None => self.0.push(answer),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Answer> {
        self.0.iter()
    }

    pub fn node_ids(&self) -> Vec<&str> {
        self.0.iter().map(|a| a.node_id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AnswerLookup for Answers {
    fn answer_value(&self, node_id: &str) -> Option<Value> {
        self.get(node_id).map(|a| a.value.to_value())
    }
}
