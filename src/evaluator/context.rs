use crate::ast::{Expression, FieldValue};
use crate::catalog::{Catalog, FunctionRegistry};
use crate::compiler::{self, FormulaCache};
use crate::definition::{Field, FieldType};
use crate::error::{BrokenLinkReason, FormulaError};
use ahash::AHashMap;
use std::sync::Arc;

pub const DEFAULT_MAX_CALL_DEPTH: usize = 32;

/// What a name in the evaluation context is bound to.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// A value shaped by the declared type of the field that produced it.
    Value {
        field_type: FieldType,
        value: FieldValue,
    },
    /// A field with no stored value, no default and (for catalog fields) no
    /// selection.
    Missing { field_type: FieldType },
    /// A linked field whose link cannot be followed.
    Broken { reason: BrokenLinkReason },
    /// A stored value that does not fit the field's type, such as text in a
    /// number field.
    Invalid { field_type: FieldType, raw: String },
}

/// Everything a formula may read: named bindings, the catalog snapshot, the
/// shared function registry, and an optional cache of parsed formulas.
#[derive(Debug, Clone)]
pub struct EvaluationContext<'a> {
    bindings: AHashMap<String, Binding>,
    catalog: &'a Catalog,
    functions: &'a FunctionRegistry,
    cache: Option<&'a FormulaCache>,
    max_call_depth: usize,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(catalog: &'a Catalog, functions: &'a FunctionRegistry) -> Self {
        Self {
            bindings: AHashMap::new(),
            catalog,
            functions,
            cache: None,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    pub fn with_cache(mut self, cache: &'a FormulaCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn bind(&mut self, name: &str, binding: Binding) {
        self.bindings.insert(name.to_string(), binding);
    }

    pub fn bind_number(&mut self, name: &str, value: f64) {
        self.bind(
            name,
            Binding::Value {
                field_type: FieldType::Number,
                value: FieldValue::Number(value),
            },
        );
    }

    /// Binds a field's resolved raw value, falling back to the field's
    /// default when nothing is stored. A stored value that cannot be read as
    /// the field's type is bound as [`Binding::Invalid`], never defaulted.
    pub fn bind_field(&mut self, field: &Field, value: Option<FieldValue>) {
        let field_type = field.field_type;
        let binding = match value.filter(|v| !v.is_blank()) {
            Some(raw) => match raw.clone().coerce(field_type) {
                Some(value) => Binding::Value { field_type, value },
                None => Binding::Invalid {
                    field_type,
                    raw: raw.to_string(),
                },
            },
            None => match field.fallback_value() {
                Some(value) => Binding::Value { field_type, value },
                None => Binding::Missing { field_type },
            },
        };
        self.bind(&field.variable_name, binding);
    }

    pub fn unbind(&mut self, name: &str) -> Option<Binding> {
        self.bindings.remove(name)
    }

    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    pub fn functions(&self) -> &'a FunctionRegistry {
        self.functions
    }

    pub fn max_call_depth(&self) -> usize {
        self.max_call_depth
    }

    /// Parses a formula through the cache when one is attached.
    pub fn compile(&self, code: &str) -> Result<Arc<Expression>, FormulaError> {
        match self.cache {
            Some(cache) => cache.get_or_compile(code),
            None => compiler::compile(code, true).map(Arc::new),
        }
    }
}
