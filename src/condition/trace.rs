use super::Value;

/// A record of how a predicate was evaluated, including the answers it read.
///
/// Outcomes are three-valued: `Bool(true)`, `Bool(false)`, or `Null` when the
/// result depends on an answer that has not been collected.
#[derive(Debug, Clone)]
pub enum EvaluationTrace {
    Comparison {
        op_symbol: &'static str,
        left: Box<EvaluationTrace>,
        right: Box<EvaluationTrace>,
        outcome: Value,
    },
    Unary {
        op_symbol: &'static str,
        child: Box<EvaluationTrace>,
        outcome: Value,
    },
    /// An n-ary AND/OR. Operands skipped by short-circuiting are `NotEvaluated`.
    Group {
        op_symbol: &'static str,
        children: Vec<EvaluationTrace>,
        outcome: Value,
    },
    Leaf {
        source: String,
        value: Value,
    },
    NotEvaluated,
}

impl EvaluationTrace {
    pub fn get_outcome(&self) -> Value {
        match self {
            EvaluationTrace::Comparison { outcome, .. } => outcome.clone(),
            EvaluationTrace::Unary { outcome, .. } => outcome.clone(),
            EvaluationTrace::Group { outcome, .. } => outcome.clone(),
            EvaluationTrace::Leaf { value, .. } => value.clone(),
            EvaluationTrace::NotEvaluated => Value::Null,
        }
    }

    /// Only a definite `true` fires a branch.
    pub fn is_true(&self) -> bool {
        matches!(self.get_outcome(), Value::Bool(true))
    }

    pub fn precedence(&self) -> u8 {
        match self {
            EvaluationTrace::Group { op_symbol, .. } => match *op_symbol {
                "OR" => 1,
                "AND" => 2,
                _ => 0,
            },
            EvaluationTrace::Comparison { .. } => 4,
            EvaluationTrace::Unary { .. } => 8,
            EvaluationTrace::Leaf { .. } | EvaluationTrace::NotEvaluated => 9,
        }
    }
}
