use super::{EvaluationTrace, Operand, Predicate, TraceFormatter, Value};
use crate::error::EvaluationError;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Read access to the answers collected so far in a session.
pub trait AnswerLookup {
    /// Returns the answer recorded for `node_id`. Skipped answers read as `Value::Null`.
    fn answer_value(&self, node_id: &str) -> Option<Value>;
}

impl AnswerLookup for AHashMap<String, Value> {
    fn answer_value(&self, node_id: &str) -> Option<Value> {
        self.get(node_id).cloned()
    }
}

/// One outgoing edge of a conditional node. A branch without a predicate is the default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub when: Option<Predicate>,
    pub target: String,
}

impl Branch {
    pub fn guarded(when: Predicate, target: &str) -> Self {
        Self {
            when: Some(when),
            target: target.to_string(),
        }
    }

    pub fn default_to(target: &str) -> Self {
        Self {
            when: None,
            target: target.to_string(),
        }
    }

    pub fn is_default(&self) -> bool {
        self.when.is_none()
    }
}

/// The outcome of resolving a conditional node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchDecision {
    pub target: String,
    /// Index of the guarded branch that fired, `None` when the default was taken.
    pub branch_index: Option<usize>,
    /// A human-readable explanation of why this branch was chosen.
    pub reason: String,
}

/// Resolves conditional branches against collected answers.
///
/// Branches are tried in declaration order and the first predicate that is
/// definitely true wins; nothing after it is evaluated. The default branch only
/// fires once every guarded branch has failed.
pub fn evaluate<A: AnswerLookup + ?Sized>(
    branches: &[Branch],
    answers: &A,
) -> Result<BranchDecision, EvaluationError> {
    let engine = PredicateEngine::new(answers);

    for (index, branch) in branches.iter().enumerate() {
        let Some(predicate) = &branch.when else {
            continue;
        };
        let trace = engine.evaluate(predicate);
        if trace.is_true() {
            return Ok(BranchDecision {
                target: branch.target.clone(),
                branch_index: Some(index),
                reason: TraceFormatter::format_trace(&trace),
            });
        }
    }

    branches
        .iter()
        .find(|b| b.is_default())
        .map(|b| BranchDecision {
            target: b.target.clone(),
            branch_index: None,
            reason: "No branch matched, default taken".to_string(),
        })
        .ok_or(EvaluationError::NoMatchingBranch)
}

/// Evaluates a single predicate and returns its trace.
pub fn evaluate_predicate<A: AnswerLookup + ?Sized>(
    predicate: &Predicate,
    answers: &A,
) -> EvaluationTrace {
    PredicateEngine::new(answers).evaluate(predicate)
}

// Generates a match arm for an ordering comparison.
macro_rules! eval_ordering {
    ($self:ident, $l:ident, $r:ident, $op_str:expr, $accept:expr) => {
        $self.eval_comparison($l, $r, $op_str, |l, r| {
            l.partial_compare(r).is_some_and($accept)
        })
    };
}

/// The recursive engine behind predicate evaluation. Total: never errors.
struct PredicateEngine<'a, A: AnswerLookup + ?Sized> {
    answers: &'a A,
}

impl<'a, A: AnswerLookup + ?Sized> PredicateEngine<'a, A> {
    fn new(answers: &'a A) -> Self {
        Self { answers }
    }

    fn evaluate(&self, predicate: &Predicate) -> EvaluationTrace {
        match predicate {
            Predicate::Equal(l, r) => self.eval_comparison(l, r, "==", |l, r| l.loosely_equals(r)),
            Predicate::NotEqual(l, r) => {
                self.eval_comparison(l, r, "!=", |l, r| !l.loosely_equals(r))
            }
            Predicate::GreaterThan(l, r) => eval_ordering!(self, l, r, ">", |o| o.is_gt()),
            Predicate::GreaterThanOrEqual(l, r) => {
                eval_ordering!(self, l, r, ">=", |o| o.is_ge())
            }
            Predicate::SmallerThan(l, r) => eval_ordering!(self, l, r, "<", |o| o.is_lt()),
            Predicate::SmallerThanOrEqual(l, r) => {
                eval_ordering!(self, l, r, "<=", |o| o.is_le())
            }
            Predicate::Contains(l, r) => self.eval_comparison(l, r, "CONTAINS", |l, r| match (l, r) {
                (Value::Text(haystack), Value::Text(needle)) => haystack
                    .to_lowercase()
                    .contains(&needle.to_lowercase()),
                _ => false,
            }),
            Predicate::Answered(node_id) => {
                let value = self.answers.answer_value(node_id).unwrap_or(Value::Null);
                let outcome = Value::Bool(!value.is_null());
                EvaluationTrace::Unary {
                    op_symbol: "ANSWERED",
                    child: Box::new(EvaluationTrace::Leaf {
                        source: format!("${}", node_id),
                        value,
                    }),
                    outcome,
                }
            }
            Predicate::Not(inner) => {
                let child = self.evaluate(inner);
                let outcome = match child.get_outcome() {
                    Value::Bool(b) => Value::Bool(!b),
                    _ => Value::Null,
                };
                EvaluationTrace::Unary {
                    op_symbol: "NOT",
                    child: Box::new(child),
                    outcome,
                }
            }
            Predicate::And(children) => self.eval_group(children, "AND", false),
            Predicate::Or(children) => self.eval_group(children, "OR", true),
        }
    }

    /// AND short-circuits on the first `false`, OR on the first `true`. Otherwise an
    /// unknown operand makes the whole group unknown.
    fn eval_group(
        &self,
        children: &[Predicate],
        op_symbol: &'static str,
        decisive: bool,
    ) -> EvaluationTrace {
        let mut traces = Vec::with_capacity(children.len());
        let mut unknown = false;
        let mut decided = false;

        for child in children {
            if decided {
                traces.push(EvaluationTrace::NotEvaluated);
                continue;
            }
            let trace = self.evaluate(child);
            match trace.get_outcome() {
                Value::Bool(b) if b == decisive => decided = true,
                Value::Bool(_) => {}
                _ => unknown = true,
            }
            traces.push(trace);
        }

        let outcome = if decided {
            Value::Bool(decisive)
        } else if unknown {
            Value::Null
        } else {
            Value::Bool(!decisive)
        };

        EvaluationTrace::Group {
            op_symbol,
            children: traces,
            outcome,
        }
    }

    fn eval_comparison<F>(
        &self,
        l: &Operand,
        r: &Operand,
        op: &'static str,
        f: F,
    ) -> EvaluationTrace
    where
        F: Fn(&Value, &Value) -> bool,
    {
        let left = self.resolve(l);
        let right = self.resolve(r);
        let (lv, rv) = (left.get_outcome(), right.get_outcome());
        // Comparing against a missing answer is unknown, not false.
        let outcome = if lv.is_null() || rv.is_null() {
            Value::Null
        } else {
            Value::Bool(f(&lv, &rv))
        };
        EvaluationTrace::Comparison {
            op_symbol: op,
            left: Box::new(left),
            right: Box::new(right),
            outcome,
        }
    }

    fn resolve(&self, operand: &Operand) -> EvaluationTrace {
        match operand {
            Operand::Answer(node_id) => EvaluationTrace::Leaf {
                source: format!("${}", node_id),
                value: self.answers.answer_value(node_id).unwrap_or(Value::Null),
            },
            Operand::Literal(value) => EvaluationTrace::Leaf {
                source: value.to_string(),
                value: value.clone(),
            },
        }
    }
}
