use crate::ast::FieldValue;
use crate::error::UnitError;
use crate::units::{self, UnitCategory};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    Material,
    Labor,
}

impl CatalogKind {
    /// Property names that read the item's own price (materials) or hourly
    /// cost (labor) when the item does not define them explicitly.
    pub fn price_aliases(self) -> &'static [&'static str] {
        match self {
            CatalogKind::Material => &["price"],
            CatalogKind::Labor => &["cost", "rate", "price"],
        }
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogKind::Material => f.write_str("material"),
            CatalogKind::Labor => f.write_str("labor"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Number,
    Price,
    String,
    Boolean,
}

/// A named value on a catalog item.
///
/// `stored_value` always holds the value normalised to the base unit of the
/// property's unit category whenever a unit is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub name: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub value: FieldValue,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub stored_value: Option<f64>,
}

impl Property {
    pub fn new(
        name: &str,
        property_type: PropertyType,
        value: FieldValue,
        unit: Option<&str>,
    ) -> Result<Self, UnitError> {
        let mut property = Self {
            name: name.to_string(),
            property_type,
            value,
            unit: unit.map(str::to_string),
            stored_value: None,
        };
        property.sync()?;
        Ok(property)
    }

    pub fn number(name: &str, value: f64, unit: Option<&str>) -> Result<Self, UnitError> {
        Self::new(name, PropertyType::Number, FieldValue::Number(value), unit)
    }

    pub fn set_value(&mut self, value: FieldValue) -> Result<(), UnitError> {
        self.value = value;
        self.sync()
    }

    pub fn set_unit(&mut self, unit: Option<&str>) -> Result<(), UnitError> {
        self.unit = unit.map(str::to_string);
        self.sync()
    }

    /// Recomputes `stored_value` from the display value and unit.
    pub fn sync(&mut self) -> Result<(), UnitError> {
        self.stored_value = match &self.unit {
            Some(unit) => {
                let display = self.value.as_number().unwrap_or(0.0);
                Some(units::normalize_to_base(display, unit)?)
            }
            None => None,
        };
        Ok(())
    }

    pub fn unit_category(&self) -> Option<UnitCategory> {
        self.unit.as_deref().and_then(units::get_unit_category)
    }

    /// The value formulas see: base-unit number for numeric properties,
    /// 0/1 for booleans, `None` for string properties.
    pub fn numeric_value(&self) -> Option<f64> {
        match self.property_type {
            PropertyType::String => None,
            PropertyType::Boolean => self.value.as_number(),
            PropertyType::Number | PropertyType::Price => {
                self.stored_value.or_else(|| self.value.as_number())
            }
        }
    }
}

/// A material or labor entry of the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    /// Identifier under which formulas may address this item directly,
    /// as in `lumber.weight`.
    #[serde(default)]
    pub variable_name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Unit price for materials, hourly cost for labor.
    #[serde(alias = "cost", alias = "hourlyRate")]
    pub price: f64,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(skip)]
    property_index: AHashMap<String, usize>,
}

impl CatalogItem {
    pub fn new(id: &str, name: &str, price: f64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            variable_name: None,
            category: None,
            price,
            unit: None,
            properties: Vec::new(),
            property_index: AHashMap::new(),
        }
    }

    pub fn with_variable(mut self, variable_name: &str) -> Self {
        self.variable_name = Some(variable_name.to_string());
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self.reindex();
        self
    }

    /// Rebuilds the name to index lookup over `properties`.
    pub(crate) fn reindex(&mut self) {
        self.property_index = self
            .properties
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name.clone(), i))
            .collect();
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.property_index
            .get(name)
            .map(|&i| &self.properties[i])
            .or_else(|| self.properties.iter().find(|p| p.name == name))
    }

    /// Resolves `item.<name>` for formulas. Explicit properties win over the
    /// implicit price aliases. `Some(None)` marks a property that exists but
    /// is not numeric.
    pub fn numeric_property(&self, kind: CatalogKind, name: &str) -> Option<Option<f64>> {
        if let Some(property) = self.property(name) {
            return Some(property.numeric_value());
        }
        kind.price_aliases()
            .contains(&name)
            .then_some(Some(self.price))
    }
}
