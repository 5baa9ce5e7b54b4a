use super::{EvaluationTrace, Value};
use itertools::Itertools;

/// Renders evaluation traces as the reasons attached to branch decisions.
pub struct TraceFormatter;

impl TraceFormatter {
    /// Explains a trace in one line, e.g. `$age (was 12) < 18`.
    pub fn format_trace(trace: &EvaluationTrace) -> String {
        let mut out = String::new();
        Self::render(trace, 0, &mut out);
        out
    }

    // Parenthesize only when the child binds looser than its parent.
    fn render(trace: &EvaluationTrace, parent_precedence: u8, out: &mut String) {
        let precedence = trace.precedence();
        let wrap = precedence < parent_precedence;
        if wrap {
            out.push('(');
        }

        match trace {
            EvaluationTrace::Comparison {
                op_symbol,
                left,
                right,
                ..
            } => {
                Self::render(left, precedence, out);
                out.push_str(&format!(" {} ", op_symbol));
                Self::render(right, precedence, out);
            }
            EvaluationTrace::Unary {
                op_symbol, child, ..
            } => {
                out.push_str(op_symbol);
                out.push(' ');
                Self::render(child, precedence, out);
            }
            EvaluationTrace::Group {
                op_symbol,
                children,
                ..
            } => {
                let separator = format!(" {} ", op_symbol);
                let rendered = children
                    .iter()
                    .filter(|c| !matches!(c, EvaluationTrace::NotEvaluated))
                    .map(|c| {
                        let mut part = String::new();
                        Self::render(c, precedence, &mut part);
                        part
                    })
                    .join(&separator);
                out.push_str(&rendered);
            }
            EvaluationTrace::Leaf { source, value } if source.starts_with('$') => {
                out.push_str(&format!("{} (was {})", source, Self::describe(value)));
            }
            EvaluationTrace::Leaf { source, .. } => out.push_str(source),
            EvaluationTrace::NotEvaluated => {}
        }

        if wrap {
            out.push(')');
        }
    }

    fn describe(value: &Value) -> String {
        if value.is_null() {
            "not answered".to_string()
        } else {
            value.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(source: &str, value: Value) -> EvaluationTrace {
        EvaluationTrace::Leaf {
            source: source.to_string(),
            value,
        }
    }

    #[test]
    fn short_circuited_operands_are_omitted() {
        let trace = EvaluationTrace::Group {
            op_symbol: "OR",
            children: vec![
                EvaluationTrace::Comparison {
                    op_symbol: "<",
                    left: Box::new(leaf("$age", Value::Number(12.0))),
                    right: Box::new(leaf("18", Value::Number(18.0))),
                    outcome: Value::Bool(true),
                },
                EvaluationTrace::NotEvaluated,
            ],
            outcome: Value::Bool(true),
        };
        assert_eq!(TraceFormatter::format_trace(&trace), "$age (was 12) < 18");
    }

    #[test]
    fn nested_groups_get_parentheses() {
        let trace = EvaluationTrace::Group {
            op_symbol: "AND",
            children: vec![
                EvaluationTrace::Group {
                    op_symbol: "OR",
                    children: vec![
                        leaf("$a", Value::Bool(false)),
                        leaf("$b", Value::Null),
                    ],
                    outcome: Value::Null,
                },
                leaf("true", Value::Bool(true)),
            ],
            outcome: Value::Null,
        };
        assert_eq!(
            TraceFormatter::format_trace(&trace),
            "($a (was false) OR $b (was not answered)) AND true"
        );
    }
}
