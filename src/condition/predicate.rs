use super::{Operand, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A boolean expression over previously collected answers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Predicate {
    // Comparison
    Equal(Operand, Operand),
    NotEqual(Operand, Operand),
    GreaterThan(Operand, Operand),
    GreaterThanOrEqual(Operand, Operand),
    SmallerThan(Operand, Operand),
    SmallerThanOrEqual(Operand, Operand),
    /// Text containment, case-insensitive.
    Contains(Operand, Operand),

    /// True when the node has a non-skipped answer.
    Answered(String),

    // Logical
    Not(Box<Predicate>),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    /// Shorthand for `$node == literal`.
    pub fn answer_equals(node_id: &str, value: Value) -> Self {
        Predicate::Equal(Operand::Answer(node_id.to_string()), Operand::Literal(value))
    }

    /// Shorthand for `$node < number`.
    pub fn answer_below(node_id: &str, bound: f64) -> Self {
        Predicate::SmallerThan(
            Operand::Answer(node_id.to_string()),
            Operand::Literal(Value::Number(bound)),
        )
    }

    /// Shorthand for `$node > number`.
    pub fn answer_above(node_id: &str, bound: f64) -> Self {
        Predicate::GreaterThan(
            Operand::Answer(node_id.to_string()),
            Operand::Literal(Value::Number(bound)),
        )
    }

    /// Collects the ids of every node whose answer this predicate reads.
    pub fn referenced_answers(&self, nodes: &mut BTreeSet<String>) {
        match self {
            Predicate::Equal(l, r)
            | Predicate::NotEqual(l, r)
            | Predicate::GreaterThan(l, r)
            | Predicate::GreaterThanOrEqual(l, r)
            | Predicate::SmallerThan(l, r)
            | Predicate::SmallerThanOrEqual(l, r)
            | Predicate::Contains(l, r) => {
                for operand in [l, r] {
                    if let Operand::Answer(id) = operand {
                        nodes.insert(id.clone());
                    }
                }
            }
            Predicate::Answered(id) => {
                nodes.insert(id.clone());
            }
            Predicate::Not(inner) => inner.referenced_answers(nodes),
            Predicate::And(children) | Predicate::Or(children) => {
                for child in children {
                    child.referenced_answers(nodes);
                }
            }
        }
    }

    /// Parses the JSON authoring form of a predicate.
    ///
    /// Comparisons read `{"op": "lt", "answer": "age", "value": 18}`; the right-hand
    /// side may instead name another node with `"other": "node_id"`. Logical forms are
    /// `{"op": "and", "all": [...]}`, `{"op": "or", "any": [...]}` and
    /// `{"op": "not", "predicate": {...}}`. `{"op": "answered", "answer": "x"}` tests
    /// for presence.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, String> {
        let object = json
            .as_object()
            .ok_or_else(|| format!("predicate must be an object, found {}", json))?;
        let op = object
            .get("op")
            .and_then(|v| v.as_str())
            .ok_or_else(|| "predicate is missing its \"op\" field".to_string())?;

        match op {
            "and" | "or" => {
                let key = if op == "and" { "all" } else { "any" };
                let children = object
                    .get(key)
                    .and_then(|v| v.as_array())
                    .ok_or_else(|| format!("\"{}\" predicate requires a \"{}\" array", op, key))?;
                if children.is_empty() {
                    return Err(format!("\"{}\" predicate has no operands", op));
                }
                let parsed = children
                    .iter()
                    .map(Predicate::from_json)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(if op == "and" {
                    Predicate::And(parsed)
                } else {
                    Predicate::Or(parsed)
                })
            }
            "not" => {
                let inner = object
                    .get("predicate")
                    .ok_or_else(|| "\"not\" predicate requires a \"predicate\" field".to_string())?;
                Ok(Predicate::Not(Box::new(Predicate::from_json(inner)?)))
            }
            "answered" => Ok(Predicate::Answered(answer_field(object)?)),
            comparison => {
                let left = Operand::Answer(answer_field(object)?);
                let right = match (object.get("value"), object.get("other")) {
                    (Some(_), Some(_)) => {
                        return Err("comparison takes either \"value\" or \"other\", not both"
                            .to_string());
                    }
                    (Some(literal), None) => Operand::Literal(
                        Value::from_json(literal)
                            .ok_or_else(|| format!("unsupported literal {}", literal))?,
                    ),
                    (None, Some(other)) => Operand::Answer(
                        other
                            .as_str()
                            .ok_or_else(|| "\"other\" must be a node id".to_string())?
                            .to_string(),
                    ),
                    (None, None) => {
                        return Err(format!("\"{}\" comparison requires a \"value\"", comparison));
                    }
                };
                match comparison {
                    "eq" | "==" => Ok(Predicate::Equal(left, right)),
                    "neq" | "!=" => Ok(Predicate::NotEqual(left, right)),
                    "gt" | ">" => Ok(Predicate::GreaterThan(left, right)),
                    "gte" | ">=" => Ok(Predicate::GreaterThanOrEqual(left, right)),
                    "lt" | "<" => Ok(Predicate::SmallerThan(left, right)),
                    "lte" | "<=" => Ok(Predicate::SmallerThanOrEqual(left, right)),
                    "contains" => Ok(Predicate::Contains(left, right)),
                    other => Err(format!("unknown predicate operator '{}'", other)),
                }
            }
        }
    }
}

fn answer_field(object: &serde_json::Map<String, serde_json::Value>) -> Result<String, String> {
    object
        .get("answer")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| "predicate requires an \"answer\" node id".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_nested_logical_predicates() {
        let parsed = Predicate::from_json(&json!({
            "op": "and",
            "all": [
                {"op": "gte", "answer": "age", "value": 18},
                {"op": "not", "predicate": {"op": "eq", "answer": "country", "value": "NL"}}
            ]
        }))
        .unwrap();

        assert_eq!(
            parsed,
            Predicate::And(vec![
                Predicate::GreaterThanOrEqual(
                    Operand::Answer("age".to_string()),
                    Operand::Literal(Value::Number(18.0))
                ),
                Predicate::Not(Box::new(Predicate::answer_equals(
                    "country",
                    Value::Text("NL".to_string())
                ))),
            ])
        );
    }

    #[test]
    fn rejects_unknown_operator_and_missing_fields() {
        assert!(Predicate::from_json(&json!({"op": "between", "answer": "a", "value": 1})).is_err());
        assert!(Predicate::from_json(&json!({"op": "eq", "value": 1})).is_err());
        assert!(Predicate::from_json(&json!({"op": "or", "any": []})).is_err());
        assert!(Predicate::from_json(&json!("eq")).is_err());
    }

    #[test]
    fn collects_references_from_both_sides() {
        let parsed = Predicate::from_json(&json!({"op": "eq", "answer": "a", "other": "b"})).unwrap();
        let mut refs = BTreeSet::new();
        parsed.referenced_answers(&mut refs);
        assert_eq!(refs.into_iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
