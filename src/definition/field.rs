use crate::ast::FieldValue;
use crate::units::{self, UnitCategory};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Number,
    Text,
    Boolean,
    Dropdown,
    Material,
    Labor,
}

impl FieldType {
    /// Material and labor fields select a catalog item rather than hold a
    /// raw value.
    pub fn is_catalog(self) -> bool {
        matches!(self, FieldType::Material | FieldType::Labor)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Number => "number",
            FieldType::Text => "text",
            FieldType::Boolean => "boolean",
            FieldType::Dropdown => "dropdown",
            FieldType::Material => "material",
            FieldType::Labor => "labor",
        };
        f.write_str(name)
    }
}

/// A single typed input slot on a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: String,
    pub label: String,
    pub variable_name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Display unit; values are stored in the unit category's base unit.
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default_value: Option<FieldValue>,
    /// Choices offered by dropdown fields.
    #[serde(default)]
    pub options: Vec<String>,
    /// Restricts a material/labor field to catalog items of this category.
    #[serde(default)]
    pub category: Option<String>,
}

impl Field {
    pub fn new(variable_name: &str, field_type: FieldType) -> Self {
        Self {
            id: variable_name.to_string(),
            label: variable_name.to_string(),
            variable_name: variable_name.to_string(),
            field_type,
            unit: None,
            required: false,
            default_value: None,
            options: Vec::new(),
            category: None,
        }
    }

    pub fn with_unit(mut self, unit: &str) -> Self {
        self.unit = Some(unit.to_string());
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: FieldValue) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn unit_category(&self) -> Option<UnitCategory> {
        self.unit.as_deref().and_then(units::get_unit_category)
    }

    /// The value used when an instance stores nothing for this field.
    /// Required fields have no implicit value.
    pub fn fallback_value(&self) -> Option<FieldValue> {
        if let Some(default) = &self.default_value {
            return default.clone().coerce(self.field_type);
        }
        if self.required {
            return None;
        }
        match self.field_type {
            FieldType::Number => Some(FieldValue::Number(0.0)),
            FieldType::Boolean => Some(FieldValue::Boolean(false)),
            FieldType::Text => Some(FieldValue::Text(String::new())),
            FieldType::Dropdown => self.options.first().cloned().map(FieldValue::Text),
            FieldType::Material | FieldType::Labor => None,
        }
    }
}

/// A named intermediate formula evaluated in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedOutput {
    pub id: String,
    pub label: String,
    pub variable_name: String,
    pub expression: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub show_in_quote: bool,
}

impl ComputedOutput {
    pub fn new(variable_name: &str, expression: &str) -> Self {
        Self {
            id: variable_name.to_string(),
            label: variable_name.to_string(),
            variable_name: variable_name.to_string(),
            expression: expression.to_string(),
            unit: None,
            show_in_quote: false,
        }
    }

    pub fn with_unit(mut self, unit: &str) -> Self {
        self.unit = Some(unit.to_string());
        self
    }

    /// The key under which the output's value is published: `out.<name>`.
    pub fn qualified_name(&self) -> String {
        format!("{}{}", super::OUTPUT_PREFIX, self.variable_name)
    }

    pub fn unit_category(&self) -> Option<UnitCategory> {
        self.unit.as_deref().and_then(units::get_unit_category)
    }
}
