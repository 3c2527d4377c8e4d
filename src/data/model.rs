use crate::catalog::{Catalog, CatalogItem, FunctionRegistry, SharedFunction};
use crate::config::EngineConfig;
use crate::cost::Engine;
use crate::definition::{ModuleDefinition, ModuleLibrary, Workspace};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Everything needed to price a workspace, in one JSON document: the catalog
/// snapshot, shared functions, module definitions and the workspace itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceBundle {
    #[serde(default)]
    pub materials: Vec<CatalogItem>,
    #[serde(default)]
    pub labor: Vec<CatalogItem>,
    #[serde(default)]
    pub functions: Vec<SharedFunction>,
    #[serde(default)]
    pub modules: Vec<ModuleDefinition>,
    #[serde(default)]
    pub workspace: Workspace,
}

impl WorkspaceBundle {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a bundle from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validates the definitions and splits the bundle into an engine, the
    /// module library and the workspace.
    pub fn into_engine(
        self,
        config: EngineConfig,
    ) -> Result<(Engine, ModuleLibrary, Workspace), ConfigError> {
        let catalog = Catalog::new(self.materials, self.labor)?;
        let functions = FunctionRegistry::new(self.functions)?;
        let library = ModuleLibrary::new(self.modules)?;
        let engine = Engine::builder(catalog, functions).with_config(config).build();
        Ok((engine, library, self.workspace))
    }
}
