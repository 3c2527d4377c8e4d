use super::context::{Binding, EvaluationContext};
use super::functions;
use crate::ast::{EvaluationTrace, Expression, FieldValue, InputSource};
use crate::catalog::{CatalogItem, CatalogKind};
use crate::definition::{FieldType, OUTPUT_PREFIX};
use crate::error::{Arity, FormulaError};
use ahash::AHashMap;

/// The core recursive engine for evaluating a single AST against a context.
///
/// Inside a shared function body the engine runs with `locals` set: only the
/// function's parameters, the constants, other functions and catalog items
/// (`pine.weight`) are visible.
pub(super) struct AstEngine<'c, 'a> {
    context: &'c EvaluationContext<'a>,
    locals: Option<&'c AHashMap<String, f64>>,
    depth: usize,
}

impl<'c, 'a> AstEngine<'c, 'a> {
    pub(super) fn new(context: &'c EvaluationContext<'a>) -> Self {
        Self {
            context,
            locals: None,
            depth: 0,
        }
    }

    /// Evaluates the AST and returns a trace of the execution.
    pub(super) fn evaluate(&self, expression: &Expression) -> Result<EvaluationTrace, FormulaError> {
        self.evaluate_recursive(expression)
    }

    fn evaluate_recursive(&self, expr: &Expression) -> Result<EvaluationTrace, FormulaError> {
        match expr {
            Expression::Sum(l, r) => self.eval_binary(expr, l, r, "+", |a, b| Ok(a + b)),
            Expression::Subtract(l, r) => self.eval_binary(expr, l, r, "-", |a, b| Ok(a - b)),
            Expression::Multiply(l, r) => self.eval_binary(expr, l, r, "*", |a, b| Ok(a * b)),
            Expression::Divide(l, r) => self.eval_binary(expr, l, r, "/", |a, b| {
                if b == 0.0 {
                    Err("division by zero")
                } else {
                    Ok(a / b)
                }
            }),
            Expression::Negate(v) => {
                let child_trace = self.evaluate_recursive(v)?;
                let outcome = -child_trace.get_outcome();
                Ok(EvaluationTrace::UnaryOp {
                    op_symbol: "-",
                    child: Box::new(child_trace),
                    outcome,
                })
            }
            Expression::Call { name, args } => self.eval_call(expr, name, args),
            Expression::Literal(value) => Ok(EvaluationTrace::Literal { value: *value }),
            Expression::Input(source) => {
                let value = self.resolve_input(source)?;
                Ok(EvaluationTrace::Input {
                    source: source.to_string(),
                    value,
                })
            }
        }
    }

    fn eval_binary<F>(
        &self,
        expr: &Expression,
        l: &Expression,
        r: &Expression,
        op: &'static str,
        f: F,
    ) -> Result<EvaluationTrace, FormulaError>
    where
        F: Fn(f64, f64) -> Result<f64, &'static str>,
    {
        let left_trace = self.evaluate_recursive(l)?;
        let right_trace = self.evaluate_recursive(r)?;
        let outcome = f(left_trace.get_outcome(), right_trace.get_outcome())
            .map_err(|message| FormulaError::evaluation(message, expr))?;
        self.ensure_finite(outcome, expr)?;
        Ok(EvaluationTrace::BinaryOp {
            op_symbol: op,
            left: Box::new(left_trace),
            right: Box::new(right_trace),
            outcome,
        })
    }

    fn eval_call(
        &self,
        expr: &Expression,
        name: &str,
        args: &[Expression],
    ) -> Result<EvaluationTrace, FormulaError> {
        if let Some(builtin) = functions::builtin(name) {
            if !builtin.arity.accepts(args.len()) {
                return Err(FormulaError::Arity {
                    function: name.to_string(),
                    expected: builtin.arity,
                    found: args.len(),
                });
            }
            let arg_traces = self.evaluate_args(args)?;
            let values: Vec<f64> = arg_traces.iter().map(EvaluationTrace::get_outcome).collect();
            let outcome =
                (builtin.apply)(&values).map_err(|message| FormulaError::evaluation(message, expr))?;
            self.ensure_finite(outcome, expr)?;
            return Ok(EvaluationTrace::Call {
                function: name.to_string(),
                args: arg_traces,
                outcome,
            });
        }

        let Some(function) = self.context.functions().get(name) else {
            return Err(FormulaError::unknown(name));
        };
        if function.parameters.len() != args.len() {
            return Err(FormulaError::Arity {
                function: name.to_string(),
                expected: Arity::Exactly(function.parameters.len()),
                found: args.len(),
            });
        }
        if self.depth >= self.context.max_call_depth() {
            return Err(FormulaError::evaluation(
                format!(
                    "nested function calls exceed the limit of {}",
                    self.context.max_call_depth()
                ),
                expr,
            ));
        }

        let arg_traces = self.evaluate_args(args)?;
        let locals: AHashMap<String, f64> = function
            .parameters
            .iter()
            .cloned()
            .zip(arg_traces.iter().map(EvaluationTrace::get_outcome))
            .collect();
        let body = self.context.compile(&function.body)?;
        let inner = AstEngine {
            context: self.context,
            locals: Some(&locals),
            depth: self.depth + 1,
        };
        let outcome = inner.evaluate_recursive(&body)?.get_outcome();
        Ok(EvaluationTrace::Call {
            function: name.to_string(),
            args: arg_traces,
            outcome,
        })
    }

    fn evaluate_args(&self, args: &[Expression]) -> Result<Vec<EvaluationTrace>, FormulaError> {
        args.iter().map(|a| self.evaluate_recursive(a)).collect()
    }

    fn ensure_finite(&self, outcome: f64, expr: &Expression) -> Result<(), FormulaError> {
        if outcome.is_finite() {
            Ok(())
        } else {
            Err(FormulaError::evaluation("result is not a finite number", expr))
        }
    }

    fn resolve_input(&self, source: &InputSource) -> Result<f64, FormulaError> {
        if let Some(locals) = self.locals {
            return match source {
                InputSource::Variable { name } => locals
                    .get(name)
                    .copied()
                    .or_else(|| functions::constant(name))
                    .ok_or_else(|| FormulaError::unknown(name.as_str())),
                // Parameters are plain numbers, so only catalog items have properties.
                InputSource::Property { target, property } if !locals.contains_key(target) => {
                    self.resolve_catalog_property(target, property)
                }
                InputSource::Property { .. } => Err(FormulaError::unknown(source.to_string())),
            };
        }
        match source {
            InputSource::Variable { name } => self.resolve_variable(name),
            InputSource::Property { target, property } => self.resolve_property(target, property),
        }
    }

    fn resolve_variable(&self, name: &str) -> Result<f64, FormulaError> {
        match self.context.binding(name) {
            Some(Binding::Value { field_type, value }) => self.numeric_value(name, *field_type, value),
            Some(Binding::Missing { field_type }) => Err(missing(name, *field_type)),
            Some(Binding::Broken { reason }) => Err(FormulaError::BrokenLink {
                field: name.to_string(),
                reason: reason.clone(),
            }),
            Some(Binding::Invalid { field_type, raw }) => Err(FormulaError::evaluation(
                format!("stored value '{}' is not a valid {} value", raw, field_type),
                name,
            )),
            None => functions::constant(name).ok_or_else(|| FormulaError::unknown(name)),
        }
    }

    /// Converts a bound value to the number formulas see.
    fn numeric_value(
        &self,
        name: &str,
        field_type: FieldType,
        value: &FieldValue,
    ) -> Result<f64, FormulaError> {
        match value {
            FieldValue::Number(n) => Ok(*n),
            FieldValue::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            FieldValue::Text(text) => match field_type {
                FieldType::Dropdown => text.trim().parse().map_err(|_| {
                    FormulaError::evaluation(
                        format!("dropdown value '{}' is not numeric", text),
                        name,
                    )
                }),
                _ => Err(FormulaError::evaluation(
                    "text fields cannot be used in arithmetic",
                    name,
                )),
            },
            // A bare catalog field reads its selected item's price or hourly cost.
            FieldValue::CatalogRef(_) => {
                let (_, item) = self.selected_item(name, field_type, value)?;
                Ok(item.price)
            }
        }
    }

    fn resolve_property(&self, target: &str, property: &str) -> Result<f64, FormulaError> {
        let qualified = format!("{}.{}", target, property);
        if OUTPUT_PREFIX.strip_suffix('.') == Some(target) {
            return match self.context.binding(&qualified) {
                Some(_) => self.resolve_variable(&qualified),
                None => Err(FormulaError::unknown(qualified)),
            };
        }

        match self.context.binding(target) {
            Some(Binding::Value { field_type, value }) if field_type.is_catalog() => {
                let (kind, item) = self.selected_item(target, *field_type, value)?;
                self.item_property(kind, item, property, &qualified)
            }
            Some(Binding::Missing { field_type }) if field_type.is_catalog() => {
                Err(missing(target, *field_type))
            }
            Some(Binding::Broken { reason }) => Err(FormulaError::BrokenLink {
                field: target.to_string(),
                reason: reason.clone(),
            }),
            Some(_) => Err(FormulaError::unknown(qualified)),
            None => self.resolve_catalog_property(target, property),
        }
    }

    /// `<item variable>.<property>` read straight from the catalog.
    fn resolve_catalog_property(&self, target: &str, property: &str) -> Result<f64, FormulaError> {
        let qualified = format!("{}.{}", target, property);
        match self.context.catalog().by_variable(target) {
            Some((kind, item)) => self.item_property(kind, item, property, &qualified),
            None => Err(FormulaError::unknown(qualified)),
        }
    }

    fn selected_item(
        &self,
        name: &str,
        field_type: FieldType,
        value: &FieldValue,
    ) -> Result<(CatalogKind, &'a CatalogItem), FormulaError> {
        let kind = CatalogKind::for_field(field_type).ok_or_else(|| {
            FormulaError::evaluation("value is not a catalog selection", name)
        })?;
        let id = match value {
            FieldValue::CatalogRef(id) | FieldValue::Text(id) => id,
            _ => return Err(missing(name, field_type)),
        };
        // A selection whose item was deleted from the catalog counts as unselected.
        self.context
            .catalog()
            .item(kind, id)
            .map(|item| (kind, item))
            .ok_or_else(|| missing(name, field_type))
    }

    fn item_property(
        &self,
        kind: CatalogKind,
        item: &CatalogItem,
        property: &str,
        qualified: &str,
    ) -> Result<f64, FormulaError> {
        match item.numeric_property(kind, property) {
            Some(Some(value)) => Ok(value),
            Some(None) => Err(FormulaError::evaluation(
                format!("property '{}' of '{}' is not numeric", property, item.name),
                qualified,
            )),
            None => Err(FormulaError::unknown(qualified)),
        }
    }
}

fn missing(name: &str, field_type: FieldType) -> FormulaError {
    if field_type.is_catalog() {
        FormulaError::MissingCatalogSelection {
            field: name.to_string(),
        }
    } else {
        FormulaError::MissingRequiredInput {
            field: name.to_string(),
        }
    }
}
