//! Sequential evaluation of a module's computed outputs.

use crate::definition::{ModuleDefinition, OUTPUT_PREFIX};
use crate::error::{ErrorKind, FormulaError};
use crate::evaluator::{self, EvaluationContext};
use ahash::AHashMap;
use tracing::warn;

/// Values and failures of one module's computed outputs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComputedOutputs {
    /// Successful outputs keyed by `out.<name>`.
    pub values: AHashMap<String, f64>,
    /// Failed outputs keyed by bare name.
    pub errors: AHashMap<String, FormulaError>,
    /// Output names in declaration order.
    pub order: Vec<String>,
}

impl ComputedOutputs {
    /// Looks up a value by `out.<name>` or by bare name.
    pub fn value(&self, name: &str) -> Option<f64> {
        let bare = name.strip_prefix(OUTPUT_PREFIX).unwrap_or(name);
        self.values.get(&format!("{}{}", OUTPUT_PREFIX, bare)).copied()
    }

    pub fn error(&self, name: &str) -> Option<&FormulaError> {
        let bare = name.strip_prefix(OUTPUT_PREFIX).unwrap_or(name);
        self.errors.get(bare)
    }

    pub fn error_kinds(&self) -> AHashMap<String, ErrorKind> {
        self.errors
            .iter()
            .map(|(name, e)| (name.clone(), e.kind()))
            .collect()
    }

    /// `(name, result)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Result<f64, &FormulaError>)> {
        self.order.iter().filter_map(|name| {
            let result = match self.error(name) {
                Some(e) => Err(e),
                None => Ok(self.value(name)?),
            };
            Some((name.as_str(), result))
        })
    }
}

/// Evaluates the module's outputs in declaration order.
///
/// Each output sees the context's bindings plus every output before it that
/// succeeded. A successful output is bound into `context` as `out.<name>` and
/// as the bare `<name>`; a failing output is recorded and left unbound, and
/// evaluation continues with the next one.
pub fn evaluate_computed_outputs(
    module: &ModuleDefinition,
    context: &mut EvaluationContext<'_>,
) -> ComputedOutputs {
    let mut outputs = ComputedOutputs::default();
    for output in &module.computed_outputs {
        outputs.order.push(output.variable_name.clone());
        match evaluator::evaluate(&output.expression, context) {
            Ok(value) => {
                let qualified = output.qualified_name();
                context.bind_number(&qualified, value);
                context.bind_number(&output.variable_name, value);
                outputs.values.insert(qualified, value);
            }
            Err(error) => {
                warn!(
                    module = %module.id,
                    output = %output.variable_name,
                    %error,
                    "computed output failed"
                );
                outputs.errors.insert(output.variable_name.clone(), error);
            }
        }
    }
    outputs
}
