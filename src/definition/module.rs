use super::{ComputedOutput, Field, OUTPUT_PREFIX, is_valid_identifier};
use crate::error::DefinitionError;
use crate::units;
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

/// A reusable calculation template: typed fields, ordered computed outputs and
/// the main cost formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub computed_outputs: Vec<ComputedOutput>,
    pub formula: String,
}

impl ModuleDefinition {
    pub fn new(id: &str, formula: &str) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            category: None,
            fields: Vec::new(),
            computed_outputs: Vec::new(),
            formula: formula.to_string(),
        }
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_output(mut self, output: ComputedOutput) -> Self {
        self.computed_outputs.push(output);
        self
    }

    pub fn field(&self, variable_name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.variable_name == variable_name)
    }

    /// Finds a computed output by `out.<name>` or by its bare name.
    pub fn computed_output(&self, name: &str) -> Option<&ComputedOutput> {
        self.output_index(name).map(|i| &self.computed_outputs[i])
    }

    pub fn output_index(&self, name: &str) -> Option<usize> {
        let bare = name.strip_prefix(OUTPUT_PREFIX).unwrap_or(name);
        self.computed_outputs
            .iter()
            .position(|o| o.variable_name == bare)
    }

    /// `true` when `name` denotes a field or an `out.`-prefixed output.
    pub fn defines(&self, name: &str) -> bool {
        match name.strip_prefix(OUTPUT_PREFIX) {
            Some(_) => self.output_index(name).is_some(),
            None => self.field(name).is_some(),
        }
    }

    /// Checks identifier syntax, uniqueness across fields and outputs, and
    /// every unit symbol.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        let owner = format!("module '{}'", self.id);
        let mut seen = AHashSet::new();
        let names = self
            .fields
            .iter()
            .map(|f| &f.variable_name)
            .chain(self.computed_outputs.iter().map(|o| &o.variable_name));
        for name in names {
            if !is_valid_identifier(name) {
                return Err(DefinitionError::InvalidVariableName {
                    owner,
                    name: name.clone(),
                });
            }
            if !seen.insert(name.as_str()) {
                return Err(DefinitionError::DuplicateVariableName {
                    owner,
                    name: name.clone(),
                });
            }
        }

        let units = self
            .fields
            .iter()
            .map(|f| (&f.variable_name, f.unit.as_deref()))
            .chain(
                self.computed_outputs
                    .iter()
                    .map(|o| (&o.variable_name, o.unit.as_deref())),
            );
        for (name, unit) in units {
            units::validate_symbol(unit).map_err(|source| DefinitionError::Unit {
                owner: format!("{} field '{}'", owner, name),
                source,
            })?;
        }
        Ok(())
    }
}

/// The set of module definitions a workspace's instances refer to.
#[derive(Debug, Clone, Default)]
pub struct ModuleLibrary {
    modules: AHashMap<String, ModuleDefinition>,
}

impl ModuleLibrary {
    /// Validates and indexes the definitions. A duplicate id replaces the
    /// earlier definition.
    pub fn new(modules: Vec<ModuleDefinition>) -> Result<Self, DefinitionError> {
        let mut library = Self::default();
        for module in modules {
            library.insert(module)?;
        }
        Ok(library)
    }

    pub fn insert(&mut self, module: ModuleDefinition) -> Result<(), DefinitionError> {
        module.validate()?;
        self.modules.insert(module.id.clone(), module);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&ModuleDefinition> {
        self.modules.get(id)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleDefinition> {
        self.modules.values()
    }
}
