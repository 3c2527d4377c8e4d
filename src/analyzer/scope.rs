use super::suggest;
use crate::catalog::{Catalog, CatalogKind, FunctionRegistry};
use crate::definition::{Field, ModuleDefinition, OUTPUT_PREFIX};
use crate::error::Arity;
use crate::evaluator::functions;
use ahash::AHashSet;

/// What an identifier in a formula refers to.
#[derive(Debug, Clone, PartialEq)]
pub enum Reference {
    Field,
    /// `<field>.<property>` on a material or labor field.
    FieldProperty { kind: CatalogKind },
    /// `<itemVar>.<property>` addressing a catalog item directly.
    CatalogProperty { kind: CatalogKind },
    ComputedOutput,
    Constant,
    MathFunction { arity: Arity },
    UserFunction { arity: Arity },
    Unknown,
}

/// The universe of names a formula may resolve against.
#[derive(Debug, Clone)]
pub struct VariableScope<'a> {
    fields: Vec<&'a Field>,
    /// Bare names of the computed outputs visible from this formula.
    outputs: Vec<&'a str>,
    extra: AHashSet<String>,
    catalog: &'a Catalog,
    functions: &'a FunctionRegistry,
}

impl<'a> VariableScope<'a> {
    pub fn new(catalog: &'a Catalog, functions: &'a FunctionRegistry) -> Self {
        Self {
            fields: Vec::new(),
            outputs: Vec::new(),
            extra: AHashSet::new(),
            catalog,
            functions,
        }
    }

    /// The scope of a module's main formula: every field and every output.
    pub fn for_module(
        module: &'a ModuleDefinition,
        catalog: &'a Catalog,
        functions: &'a FunctionRegistry,
    ) -> Self {
        Self::for_output(module, module.computed_outputs.len(), catalog, functions)
    }

    /// The scope of the computed output at `index`: every field and the
    /// outputs declared strictly before it.
    pub fn for_output(
        module: &'a ModuleDefinition,
        index: usize,
        catalog: &'a Catalog,
        functions: &'a FunctionRegistry,
    ) -> Self {
        let mut scope = Self::new(catalog, functions).with_fields(&module.fields);
        scope.outputs = module
            .computed_outputs
            .iter()
            .take(index)
            .map(|o| o.variable_name.as_str())
            .collect();
        scope
    }

    pub fn with_fields(mut self, fields: &'a [Field]) -> Self {
        self.fields.extend(fields.iter());
        self
    }

    pub fn with_output(mut self, name: &'a str) -> Self {
        self.outputs.push(name);
        self
    }

    /// Adds a name the host knows to be bound (e.g. a function parameter).
    pub fn with_variable(mut self, name: &str) -> Self {
        self.extra.insert(name.to_string());
        self
    }

    fn field(&self, name: &str) -> Option<&'a Field> {
        self.fields.iter().copied().find(|f| f.variable_name == name)
    }

    fn has_output(&self, name: &str) -> bool {
        self.outputs.contains(&name)
    }

    /// Classifies an identifier that is read as a value.
    pub fn classify_variable(&self, name: &str) -> Reference {
        let Some((target, property)) = name.split_once('.') else {
            if self.field(name).is_some() || self.extra.contains(name) {
                return Reference::Field;
            }
            if self.has_output(name) {
                return Reference::ComputedOutput;
            }
            if functions::constant(name).is_some() {
                return Reference::Constant;
            }
            return Reference::Unknown;
        };

        if OUTPUT_PREFIX.strip_suffix('.') == Some(target) {
            return if self.has_output(property) {
                Reference::ComputedOutput
            } else {
                Reference::Unknown
            };
        }
        if let Some(field) = self.field(target) {
            return match CatalogKind::for_field(field.field_type) {
                Some(kind)
                    if self
                        .catalog
                        .has_property(kind, field.category.as_deref(), property) =>
                {
                    Reference::FieldProperty { kind }
                }
                _ => Reference::Unknown,
            };
        }
        match self.catalog.by_variable(target) {
            Some((kind, item)) if item.numeric_property(kind, property).is_some() => {
                Reference::CatalogProperty { kind }
            }
            _ => Reference::Unknown,
        }
    }

    /// Classifies an identifier used in call position.
    pub fn classify_function(&self, name: &str) -> Reference {
        if let Some(builtin) = functions::builtin(name) {
            return Reference::MathFunction {
                arity: builtin.arity,
            };
        }
        match self.functions.get(name) {
            Some(function) => Reference::UserFunction {
                arity: Arity::Exactly(function.parameters.len()),
            },
            None => Reference::Unknown,
        }
    }

    /// Every identifier a formula in this scope may use.
    pub fn candidates(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for field in &self.fields {
            names.push(field.variable_name.clone());
            if let Some(kind) = CatalogKind::for_field(field.field_type) {
                for property in self.catalog.property_names(kind, field.category.as_deref()) {
                    names.push(format!("{}.{}", field.variable_name, property));
                }
            }
        }
        names.extend(self.extra.iter().cloned());
        for output in &self.outputs {
            names.push(format!("{}{}", OUTPUT_PREFIX, output));
        }
        for (variable, kind) in self.catalog.variables() {
            if let Some((_, item)) = self.catalog.by_variable(variable) {
                let properties = item
                    .properties
                    .iter()
                    .map(|p| p.name.as_str())
                    .chain(kind.price_aliases().iter().copied());
                for property in properties {
                    names.push(format!("{}.{}", variable, property));
                }
            }
        }
        names.extend(functions::builtin_names().map(str::to_string));
        names.extend(self.functions.names().map(str::to_string));
        names.extend(functions::constant_names().map(str::to_string));
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Ranked completions for `partial`, at most `limit` of them.
    pub fn suggestions(&self, partial: &str, limit: usize) -> Vec<String> {
        let candidates = self.candidates();
        suggest::rank(partial, candidates.iter().map(String::as_str), limit)
    }
}
