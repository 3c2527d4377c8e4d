use super::OUTPUT_PREFIX;
use crate::ast::FieldValue;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Directs a field to take its value from another instance's field or
/// computed output (`out.<name>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldLink {
    pub target_instance_id: String,
    pub target_variable_name: String,
}

impl FieldLink {
    pub fn new(target_instance_id: &str, target_variable_name: &str) -> Self {
        Self {
            target_instance_id: target_instance_id.to_string(),
            target_variable_name: target_variable_name.to_string(),
        }
    }

    /// The bare output name when the link targets a computed output.
    pub fn target_output(&self) -> Option<&str> {
        self.target_variable_name.strip_prefix(OUTPUT_PREFIX)
    }
}

/// A module placed into a quote or template workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleInstance {
    pub id: String,
    pub module_id: String,
    /// Raw values keyed by variable name; numbers are in base units.
    #[serde(default)]
    pub field_values: AHashMap<String, FieldValue>,
    /// Fields sourced from elsewhere. A linked field's entry in
    /// `field_values` is only a local fallback for display.
    #[serde(default)]
    pub field_links: AHashMap<String, FieldLink>,
    #[serde(default)]
    pub calculated_cost: Option<f64>,
}

impl ModuleInstance {
    pub fn new(id: &str, module_id: &str) -> Self {
        Self {
            id: id.to_string(),
            module_id: module_id.to_string(),
            field_values: AHashMap::new(),
            field_links: AHashMap::new(),
            calculated_cost: None,
        }
    }

    pub fn with_value(mut self, variable_name: &str, value: FieldValue) -> Self {
        self.field_values.insert(variable_name.to_string(), value);
        self
    }

    pub fn with_link(mut self, variable_name: &str, link: FieldLink) -> Self {
        self.field_links.insert(variable_name.to_string(), link);
        self
    }

    pub fn link(&self, variable_name: &str) -> Option<&FieldLink> {
        self.field_links.get(variable_name)
    }
}

/// An ordered list of module instances belonging to one quote or template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    #[serde(default)]
    pub instances: Vec<ModuleInstance>,
}

impl Workspace {
    pub fn new(instances: Vec<ModuleInstance>) -> Self {
        Self { instances }
    }

    pub fn instance(&self, id: &str) -> Option<&ModuleInstance> {
        self.instances.iter().find(|i| i.id == id)
    }

    pub fn instance_mut(&mut self, id: &str) -> Option<&mut ModuleInstance> {
        self.instances.iter_mut().find(|i| i.id == id)
    }

    pub fn add_instance(&mut self, instance: ModuleInstance) {
        self.instances.push(instance);
    }

    /// Removes an instance. Links pointing at it stay in place and resolve as
    /// broken until they are reassigned.
    pub fn remove_instance(&mut self, id: &str) -> Option<ModuleInstance> {
        let index = self.instances.iter().position(|i| i.id == id)?;
        Some(self.instances.remove(index))
    }

    /// Stores a raw value. Returns `false` when the instance does not exist.
    pub fn set_field_value(
        &mut self,
        instance_id: &str,
        variable_name: &str,
        value: FieldValue,
    ) -> bool {
        match self.instance_mut(instance_id) {
            Some(instance) => {
                instance
                    .field_values
                    .insert(variable_name.to_string(), value);
                true
            }
            None => false,
        }
    }

    pub fn unlink_field(&mut self, instance_id: &str, variable_name: &str) -> Option<FieldLink> {
        self.instance_mut(instance_id)?
            .field_links
            .remove(variable_name)
    }
}
