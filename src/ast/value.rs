use crate::definition::FieldType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The stored value of a field, tagged by shape.
///
/// JSON carries no tag, so catalog selections deserialize as `Text` and are
/// re-tagged against the field's declared type by [`FieldValue::coerce`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Boolean(bool),
    Text(String),
    CatalogRef(String),
}

impl FieldValue {
    /// Normalises a raw value to the shape implied by the field's type.
    /// Returns `None` for a value that cannot represent the type (e.g. an empty
    /// catalog selection).
    pub fn coerce(self, field_type: FieldType) -> Option<FieldValue> {
        match (field_type, self) {
            (FieldType::Material | FieldType::Labor, FieldValue::Text(id))
            | (FieldType::Material | FieldType::Labor, FieldValue::CatalogRef(id)) => {
                if id.trim().is_empty() {
                    None
                } else {
                    Some(FieldValue::CatalogRef(id))
                }
            }
            (FieldType::Number, FieldValue::Text(s)) => {
                s.trim().parse().ok().map(FieldValue::Number)
            }
            (FieldType::Boolean, FieldValue::Number(n)) => Some(FieldValue::Boolean(n != 0.0)),
            (FieldType::Text, FieldValue::Number(n)) => Some(FieldValue::Text(format_number(n))),
            (_, value) => Some(value),
        }
    }

    /// `true` for empty or whitespace-only text, which counts as nothing
    /// stored.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(s) | FieldValue::CatalogRef(s) => s.trim().is_empty(),
            FieldValue::Number(_) | FieldValue::Boolean(_) => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            FieldValue::Text(s) => s.trim().parse().ok(),
            FieldValue::CatalogRef(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{}", format_number(*n)),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::CatalogRef(id) => write!(f, "#{}", id),
        }
    }
}

/// Defines what a leaf identifier of the AST refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InputSource {
    /// A bare identifier: a field, a computed output, a constant or a
    /// function parameter.
    Variable { name: String },
    /// A dotted identifier `target.property`. `target` is a catalog-typed
    /// field, a catalog item's variable name, or the `out` namespace.
    Property { target: String, property: String },
}

impl InputSource {
    /// The name as written in the formula.
    pub fn qualified_name(&self) -> String {
        self.to_string()
    }

    /// The part before the dot, or the whole name.
    pub fn root(&self) -> &str {
        match self {
            InputSource::Variable { name } => name,
            InputSource::Property { target, .. } => target,
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputSource::Variable { name } => write!(f, "{}", name),
            InputSource::Property { target, property } => write!(f, "{}.{}", target, property),
        }
    }
}

/// Formats a number without a trailing `.0` for integral values.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
