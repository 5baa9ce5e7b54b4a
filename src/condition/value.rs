use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// The canonical format accepted by `date_picker` nodes and date literals.
pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d";

/// Runtime value types that predicates compare.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Number(f64),
    Bool(bool),
    Text(String),
    Date(NaiveDate),
    Null,
}

// Manual implementation to handle f64
impl Eq for Value {}

// Manual implementation to handle f64 by hashing its bits
impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            Value::Number(n) => n.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Text(s) => s.hash(state),
            Value::Date(d) => d.hash(state),
            Value::Null => {}
        }
    }
}

impl Value {
    /// Converts a JSON literal from an authored predicate into a `Value`.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => Some(Value::Null),
            serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number),
            serde_json::Value::String(s) => Some(Value::Text(s.clone())),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Equality with date coercion: a text value is read as a canonical date when
    /// compared against a date.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Date(d), Value::Text(t)) | (Value::Text(t), Value::Date(d)) => {
                parse_date(t).is_some_and(|parsed| parsed == *d)
            }
            (l, r) => l == r,
        }
    }

    /// Ordering between values of compatible types. `None` means the values
    /// cannot be ordered (type mismatch or null).
    pub fn partial_compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Number(l), Value::Number(r)) => l.partial_cmp(r),
            (Value::Date(l), Value::Date(r)) => Some(l.cmp(r)),
            (Value::Date(l), Value::Text(r)) => parse_date(r).map(|r| l.cmp(&r)),
            (Value::Text(l), Value::Date(r)) => parse_date(l).map(|l| l.cmp(r)),
            (Value::Text(l), Value::Text(r)) => Some(l.cmp(r)),
            _ => None,
        }
    }
}

/// Parses `YYYY-MM-DD` exactly: four-digit year, zero-padded month and day.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let canonical = text.len() == 10
        && text.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !canonical {
        return None;
    }
    NaiveDate::parse_from_str(text, CANONICAL_DATE_FORMAT).ok()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => {
                if n.fract() == 0.0 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Bool(b) => write!(f, "{}", b),
            Value::Text(s) => write!(f, "\"{}\"", s),
            Value::Date(d) => write!(f, "{}", d.format(CANONICAL_DATE_FORMAT)),
            Value::Null => write!(f, "null"),
        }
    }
}

/// Where a predicate operand takes its value from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operand {
    /// The collected answer of a node.
    Answer(String),
    Literal(Value),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Answer(node_id) => write!(f, "${}", node_id),
            Operand::Literal(value) => write!(f, "{}", value),
        }
    }
}
