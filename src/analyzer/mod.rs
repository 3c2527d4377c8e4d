//! Static analysis of formulas: identifier classification, validation and
//! autocomplete suggestions.

use crate::catalog::{Catalog, FunctionRegistry};
use crate::compiler;
use crate::definition::ModuleDefinition;
use crate::error::FormulaError;
use serde::Serialize;

mod scope;
mod suggest;

pub use scope::{Reference, VariableScope};
pub use suggest::levenshtein;

/// A `<target>.<property>` reference found in a formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyRef {
    pub target: String,
    pub property: String,
}

/// Classification of every identifier in a formula, in order of first use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormulaAnalysis {
    /// Every identifier read as a value, resolvable or not.
    pub variables: Vec<String>,
    /// Identifiers (values or function names) that resolve to nothing.
    pub unknown_variables: Vec<String>,
    /// `<field>.<property>` reads through a material or labor field.
    pub field_property_refs: Vec<PropertyRef>,
    /// `<itemVar>.<property>` reads addressing a material or labor item.
    pub material_property_refs: Vec<PropertyRef>,
    pub computed_output_refs: Vec<String>,
    pub math_functions: Vec<String>,
    pub user_functions: Vec<String>,
}

impl FormulaAnalysis {
    pub fn is_resolved(&self) -> bool {
        self.unknown_variables.is_empty()
    }
}

/// Scans a formula's identifiers and classifies each against the scope.
///
/// The scan is lexical, so it also works on formulas that do not parse yet
/// (editor autocomplete and debug views rely on this).
pub fn analyze(formula: &str, scope: &VariableScope<'_>) -> FormulaAnalysis {
    let mut analysis = FormulaAnalysis::default();
    for (name, is_call) in scan_identifiers(formula) {
        if is_call {
            match scope.classify_function(name) {
                Reference::MathFunction { .. } => push_unique(&mut analysis.math_functions, name),
                Reference::UserFunction { .. } => push_unique(&mut analysis.user_functions, name),
                _ => push_unique(&mut analysis.unknown_variables, name),
            }
            continue;
        }

        push_unique(&mut analysis.variables, name);
        match scope.classify_variable(name) {
            Reference::FieldProperty { .. } => {
                push_property(&mut analysis.field_property_refs, name)
            }
            Reference::CatalogProperty { .. } => {
                push_property(&mut analysis.material_property_refs, name)
            }
            Reference::ComputedOutput => push_unique(&mut analysis.computed_output_refs, name),
            Reference::Unknown => push_unique(&mut analysis.unknown_variables, name),
            Reference::Field
            | Reference::Constant
            | Reference::MathFunction { .. }
            | Reference::UserFunction { .. } => {}
        }
    }
    analysis
}

/// Checks that a formula parses and that every identifier resolves, with the
/// right arity for function calls.
///
/// Unknown identifiers are reported with up to `max_suggestions` ranked
/// alternatives.
pub fn validate_formula(
    formula: &str,
    scope: &VariableScope<'_>,
    max_suggestions: usize,
) -> Result<(), FormulaError> {
    let ast = compiler::parse(formula)?;

    let mut inputs = Vec::new();
    ast.collect_inputs(&mut inputs);
    for input in inputs {
        let name = input.qualified_name();
        if scope.classify_variable(&name) == Reference::Unknown {
            return Err(FormulaError::UnknownVariable {
                suggestions: scope.suggestions(&name, max_suggestions),
                name,
            });
        }
    }

    let mut calls = Vec::new();
    ast.collect_calls(&mut calls);
    for (name, found) in calls {
        match scope.classify_function(name) {
            Reference::MathFunction { arity } | Reference::UserFunction { arity } => {
                if !arity.accepts(found) {
                    return Err(FormulaError::Arity {
                        function: name.to_string(),
                        expected: arity,
                        found,
                    });
                }
            }
            _ => {
                return Err(FormulaError::UnknownVariable {
                    name: name.to_string(),
                    suggestions: scope.suggestions(name, max_suggestions),
                });
            }
        }
    }
    Ok(())
}

/// Validates each computed output against the fields and the outputs
/// declared strictly before it.
///
/// A reference to the output itself or to a later one is a
/// [`FormulaError::ForwardReference`], never an evaluation-time failure.
pub fn validate_computed_outputs(
    module: &ModuleDefinition,
    catalog: &Catalog,
    functions: &FunctionRegistry,
    max_suggestions: usize,
) -> Vec<(String, Result<(), FormulaError>)> {
    module
        .computed_outputs
        .iter()
        .enumerate()
        .map(|(index, output)| {
            let scope = VariableScope::for_output(module, index, catalog, functions);
            let result = validate_formula(&output.expression, &scope, max_suggestions)
                .map_err(|e| forward_reference(module, index, e));
            (output.variable_name.clone(), result)
        })
        .collect()
}

fn forward_reference(module: &ModuleDefinition, index: usize, error: FormulaError) -> FormulaError {
    if let FormulaError::UnknownVariable { name, .. } = &error {
        if let Some(referenced) = module.output_index(name).filter(|&i| i >= index) {
            return FormulaError::ForwardReference {
                output: module.computed_outputs[index].variable_name.clone(),
                referenced: module.computed_outputs[referenced].qualified_name(),
            };
        }
    }
    error
}

/// The outcome of validating a module's main formula and all its outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleValidation {
    pub formula: Result<(), FormulaError>,
    pub outputs: Vec<(String, Result<(), FormulaError>)>,
}

impl ModuleValidation {
    pub fn is_valid(&self) -> bool {
        self.formula.is_ok() && self.outputs.iter().all(|(_, r)| r.is_ok())
    }

    /// Every failure, keyed by output name or `"formula"` for the main one.
    pub fn errors(&self) -> Vec<(&str, &FormulaError)> {
        let mut errors: Vec<(&str, &FormulaError)> = self
            .outputs
            .iter()
            .filter_map(|(name, r)| r.as_ref().err().map(|e| (name.as_str(), e)))
            .collect();
        if let Err(e) = &self.formula {
            errors.push(("formula", e));
        }
        errors
    }
}

pub fn validate_module(
    module: &ModuleDefinition,
    catalog: &Catalog,
    functions: &FunctionRegistry,
    max_suggestions: usize,
) -> ModuleValidation {
    let scope = VariableScope::for_module(module, catalog, functions);
    ModuleValidation {
        formula: validate_formula(&module.formula, &scope, max_suggestions),
        outputs: validate_computed_outputs(module, catalog, functions, max_suggestions),
    }
}

/// Yields `(identifier, is_call)` pairs, tolerating malformed input.
fn scan_identifiers(code: &str) -> Vec<(&str, bool)> {
    let bytes = code.as_bytes();
    let is_word = |b: u8| b.is_ascii_alphanumeric() || b == b'_';
    let mut found = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];
        if c.is_ascii_digit() || (c == b'.' && bytes.get(pos + 1).is_some_and(u8::is_ascii_digit))
        {
            // Numbers, including glued suffixes such as `1e3` or `2x`.
            while pos < bytes.len() && (is_word(bytes[pos]) || bytes[pos] == b'.') {
                pos += 1;
            }
            continue;
        }
        if c.is_ascii_alphabetic() || c == b'_' {
            let start = pos;
            while pos < bytes.len()
                && (is_word(bytes[pos])
                    || (bytes[pos] == b'.' && bytes.get(pos + 1).is_some_and(|b| is_word(*b))))
            {
                pos += 1;
            }
            let mut next = pos;
            while next < bytes.len() && bytes[next].is_ascii_whitespace() {
                next += 1;
            }
            let is_call = bytes.get(next) == Some(&b'(');
            found.push((&code[start..pos], is_call));
            continue;
        }
        pos += 1;
    }
    found
}

fn push_unique(list: &mut Vec<String>, name: &str) {
    if !list.iter().any(|n| n == name) {
        list.push(name.to_string());
    }
}

fn push_property(list: &mut Vec<PropertyRef>, name: &str) {
    if let Some((target, property)) = name.split_once('.') {
        let reference = PropertyRef {
            target: target.to_string(),
            property: property.to_string(),
        };
        if !list.contains(&reference) {
            list.push(reference);
        }
    }
}
