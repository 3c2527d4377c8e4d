//! Catalog data read by formulas: materials, labor and shared functions.

mod function;
mod item;
mod snapshot;

pub use function::{FunctionRegistry, SharedFunction};
pub use item::{CatalogItem, CatalogKind, Property, PropertyType};
pub use snapshot::Catalog;

use crate::definition::FieldType;

impl CatalogKind {
    /// The catalog a material or labor field selects from.
    pub fn for_field(field_type: FieldType) -> Option<Self> {
        match field_type {
            FieldType::Material => Some(CatalogKind::Material),
            FieldType::Labor => Some(CatalogKind::Labor),
            _ => None,
        }
    }
}
