use crate::definition::is_valid_identifier;
use crate::error::DefinitionError;
use crate::evaluator::functions;
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

/// A named, parameterised formula reusable from any module formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedFunction {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(alias = "formula")]
    pub body: String,
}

impl SharedFunction {
    pub fn new(name: &str, parameters: &[&str], body: &str) -> Self {
        Self {
            id: name.to_string(),
            name: name.to_string(),
            description: None,
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
            body: body.to_string(),
        }
    }
}

/// The shared functions visible to formulas, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: AHashMap<String, SharedFunction>,
}

impl FunctionRegistry {
    /// Indexes the functions, rejecting duplicate names, names that shadow a
    /// built-in, and malformed or repeated parameters.
    pub fn new(functions: Vec<SharedFunction>) -> Result<Self, DefinitionError> {
        let mut registry = Self::default();
        for function in functions {
            registry.insert(function)?;
        }
        Ok(registry)
    }

    pub fn insert(&mut self, function: SharedFunction) -> Result<(), DefinitionError> {
        if !is_valid_identifier(&function.name) {
            return Err(DefinitionError::InvalidVariableName {
                owner: "the shared function registry".to_string(),
                name: function.name,
            });
        }
        if functions::builtin(&function.name).is_some()
            || self.functions.contains_key(&function.name)
        {
            return Err(DefinitionError::DuplicateFunction(function.name));
        }
        let mut seen = AHashSet::new();
        for parameter in &function.parameters {
            if !is_valid_identifier(parameter) || !seen.insert(parameter.as_str()) {
                return Err(DefinitionError::InvalidParameter {
                    function: function.name.clone(),
                    parameter: parameter.clone(),
                });
            }
        }
        self.functions.insert(function.name.clone(), function);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&SharedFunction> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
