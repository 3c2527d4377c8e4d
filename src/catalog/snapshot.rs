use super::{CatalogItem, CatalogKind};
use crate::error::DefinitionError;
use ahash::{AHashMap, AHashSet};

/// An immutable, indexed view over the material and labor catalogs.
///
/// All lookups the analyzer and evaluator need are built once here, so no
/// formula check scans the item lists.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    materials: Vec<CatalogItem>,
    labor: Vec<CatalogItem>,
    ids: AHashMap<(CatalogKind, String), usize>,
    variables: AHashMap<String, (CatalogKind, usize)>,
    /// Property names per kind and category; `None` covers every category.
    property_names: AHashMap<(CatalogKind, Option<String>), AHashSet<String>>,
}

impl Catalog {
    pub fn new(
        materials: Vec<CatalogItem>,
        labor: Vec<CatalogItem>,
    ) -> Result<Self, DefinitionError> {
        let mut catalog = Self::default();
        for (kind, items) in [
            (CatalogKind::Material, materials),
            (CatalogKind::Labor, labor),
        ] {
            for item in items {
                catalog.insert(kind, item)?;
            }
        }
        Ok(catalog)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    fn insert(&mut self, kind: CatalogKind, mut item: CatalogItem) -> Result<(), DefinitionError> {
        for property in &mut item.properties {
            property.sync().map_err(|source| DefinitionError::Unit {
                owner: format!("{} '{}' property '{}'", kind, item.id, property.name),
                source,
            })?;
        }
        item.reindex();

        let list = match kind {
            CatalogKind::Material => &mut self.materials,
            CatalogKind::Labor => &mut self.labor,
        };
        let index = list.len();
        if self.ids.insert((kind, item.id.clone()), index).is_some() {
            return Err(DefinitionError::DuplicateCatalogItem(item.id));
        }
        if let Some(variable) = &item.variable_name {
            if !crate::definition::is_valid_identifier(variable) {
                return Err(DefinitionError::InvalidVariableName {
                    owner: format!("{} '{}'", kind, item.id),
                    name: variable.clone(),
                });
            }
            if self.variables.insert(variable.clone(), (kind, index)).is_some() {
                return Err(DefinitionError::DuplicateVariableName {
                    owner: "the catalog".to_string(),
                    name: variable.clone(),
                });
            }
        }

        let mut names: Vec<String> = item.properties.iter().map(|p| p.name.clone()).collect();
        names.extend(kind.price_aliases().iter().map(|s| s.to_string()));
        for key in [(kind, None), (kind, item.category.clone())] {
            self.property_names
                .entry(key)
                .or_default()
                .extend(names.iter().cloned());
        }

        list.push(item);
        Ok(())
    }

    pub fn items(&self, kind: CatalogKind) -> &[CatalogItem] {
        match kind {
            CatalogKind::Material => &self.materials,
            CatalogKind::Labor => &self.labor,
        }
    }

    pub fn item(&self, kind: CatalogKind, id: &str) -> Option<&CatalogItem> {
        self.ids
            .get(&(kind, id.to_string()))
            .map(|&i| &self.items(kind)[i])
    }

    /// Finds an item by the variable name formulas use to address it.
    pub fn by_variable(&self, name: &str) -> Option<(CatalogKind, &CatalogItem)> {
        self.variables
            .get(name)
            .map(|&(kind, i)| (kind, &self.items(kind)[i]))
    }

    pub fn variables(&self) -> impl Iterator<Item = (&str, CatalogKind)> {
        self.variables.iter().map(|(name, (kind, _))| (name.as_str(), *kind))
    }

    /// `true` when at least one item reachable under the category
    /// restriction defines `property`.
    pub fn has_property(&self, kind: CatalogKind, category: Option<&str>, property: &str) -> bool {
        self.property_names
            .get(&(kind, category.map(str::to_string)))
            .is_some_and(|names| names.contains(property))
    }

    /// Sorted property names reachable under the category restriction.
    pub fn property_names(&self, kind: CatalogKind, category: Option<&str>) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .property_names
            .get(&(kind, category.map(str::to_string)))
            .map(|set| set.iter().map(String::as_str).collect())
            .unwrap_or_default();
        names.sort_unstable();
        names
    }
}
