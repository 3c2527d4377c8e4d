use crate::ast::{EvaluationTrace, Expression};
use crate::error::FormulaError;
use tracing::debug;

mod context;
mod engine;
pub mod functions;

pub use context::{Binding, DEFAULT_MAX_CALL_DEPTH, EvaluationContext};
use engine::AstEngine;

/// Evaluates formula text against a context and returns its value.
///
/// Evaluation is a pure function of the formula and the context: repeated
/// calls with the same inputs yield bit-identical results. Any failure aborts
/// the whole formula; no partial number is ever returned.
pub fn evaluate(formula: &str, context: &EvaluationContext<'_>) -> Result<f64, FormulaError> {
    evaluate_with_trace(formula, context).map(|trace| trace.get_outcome())
}

/// Like [`evaluate`], but returns the full trace of intermediate values.
pub fn evaluate_with_trace(
    formula: &str,
    context: &EvaluationContext<'_>,
) -> Result<EvaluationTrace, FormulaError> {
    let ast = context.compile(formula)?;
    let result = evaluate_expression(&ast, context);
    match &result {
        Ok(trace) => debug!(formula, value = trace.get_outcome(), "evaluated formula"),
        Err(e) => debug!(formula, error = %e, "formula evaluation failed"),
    }
    result
}

/// Evaluates an already-compiled AST.
pub fn evaluate_expression(
    expression: &Expression,
    context: &EvaluationContext<'_>,
) -> Result<EvaluationTrace, FormulaError> {
    AstEngine::new(context).evaluate(expression)
}
