use crate::ast::{EvaluationTrace, format_number};
use itertools::Itertools;

/// Formats evaluation traces into human-readable cost breakdowns.
pub struct TraceFormatter;

impl TraceFormatter {
    /// Format an evaluation trace, e.g. `width (was 3) * height (was 2)`.
    pub fn format_trace(trace: &EvaluationTrace) -> String {
        Self::format_recursive(trace, 0, false)
    }

    /// Same as [`format_trace`](Self::format_trace) but rounds every input and
    /// call result to `precision` decimals.
    pub fn format_trace_with_precision(trace: &EvaluationTrace, precision: u32) -> String {
        let factor = 10f64.powi(precision as i32);
        let rounded = Self::map_values(trace, &|v| (v * factor).round() / factor);
        Self::format_recursive(&rounded, 0, false)
    }

    fn map_values(trace: &EvaluationTrace, f: &dyn Fn(f64) -> f64) -> EvaluationTrace {
        match trace {
            EvaluationTrace::BinaryOp {
                op_symbol,
                left,
                right,
                outcome,
            } => EvaluationTrace::BinaryOp {
                op_symbol: *op_symbol,
                left: Box::new(Self::map_values(left, f)),
                right: Box::new(Self::map_values(right, f)),
                outcome: *outcome,
            },
            EvaluationTrace::UnaryOp {
                op_symbol,
                child,
                outcome,
            } => EvaluationTrace::UnaryOp {
                op_symbol: *op_symbol,
                child: Box::new(Self::map_values(child, f)),
                outcome: *outcome,
            },
            EvaluationTrace::Call {
                function,
                args,
                outcome,
            } => EvaluationTrace::Call {
                function: function.clone(),
                args: args.iter().map(|a| Self::map_values(a, f)).collect(),
                outcome: f(*outcome),
            },
            EvaluationTrace::Input { source, value } => EvaluationTrace::Input {
                source: source.clone(),
                value: f(*value),
            },
            literal @ EvaluationTrace::Literal { .. } => literal.clone(),
        }
    }

    /// Recursively formats the trace, adding parentheses only when necessary.
    /// `right_operand` forces parentheses at equal precedence, which keeps
    /// `a - (b - c)` from reading as `a - b - c`.
    fn format_recursive(
        trace: &EvaluationTrace,
        parent_precedence: u8,
        right_operand: bool,
    ) -> String {
        let current_precedence = trace.precedence();
        let needs_parens = current_precedence < parent_precedence
            || (right_operand && current_precedence == parent_precedence);

        let mut result = String::new();
        if needs_parens {
            result.push('(');
        }

        match trace {
            EvaluationTrace::BinaryOp {
                op_symbol,
                left,
                right,
                ..
            } => {
                let left_str = Self::format_recursive(left, current_precedence, false);
                let right_str = Self::format_recursive(right, current_precedence, true);
                result.push_str(&format!("{} {} {}", left_str, op_symbol, right_str));
            }
            EvaluationTrace::UnaryOp {
                op_symbol, child, ..
            } => {
                let child_str = Self::format_recursive(child, current_precedence, false);
                result.push_str(&format!("{}{}", op_symbol, child_str));
            }
            EvaluationTrace::Call {
                function,
                args,
                outcome,
            } => {
                let args_str = args
                    .iter()
                    .map(|a| Self::format_recursive(a, 0, false))
                    .join(", ");
                result.push_str(&format!(
                    "{}({}) (was {})",
                    function,
                    args_str,
                    format_number(*outcome)
                ));
            }
            EvaluationTrace::Input { source, value } => {
                result.push_str(&format!("{} (was {})", source, format_number(*value)));
            }
            EvaluationTrace::Literal { value } => result.push_str(&format_number(*value)),
        }

        if needs_parens {
            result.push(')');
        }
        result
    }
}
