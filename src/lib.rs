//! # Costwright - Formula and Dependency Resolution for Cost Estimation
//!
//! **Costwright** evaluates parameterized cost-estimation modules. A module
//! declares typed input fields, an ordered list of computed outputs and a main
//! cost formula; module instances placed into a workspace can link their
//! fields to fields or outputs of other instances.
//!
//! ## Core Workflow
//!
//! 1.  **Describe the catalog**: materials and labor items with their prices and
//!     unit-aware properties, plus any shared functions, go into a [`Catalog`](catalog::Catalog)
//!     and a [`FunctionRegistry`](catalog::FunctionRegistry).
//! 2.  **Define modules**: build [`ModuleDefinition`](definition::ModuleDefinition)s and
//!     collect them in a [`ModuleLibrary`](definition::ModuleLibrary). Formulas are checked
//!     while editing with [`Engine::validate_module`](cost::Engine::validate_module), which
//!     also offers "did you mean" suggestions for unknown names.
//! 3.  **Place instances**: add [`ModuleInstance`](definition::ModuleInstance)s to a
//!     [`Workspace`](definition::Workspace) and link fields across instances with
//!     [`links::link_field`].
//! 4.  **Recalculate**: [`Engine::recalculate`](cost::Engine::recalculate) resolves every
//!     link, evaluates computed outputs and main formulas, and reports a cost,
//!     breakdown and field summary per instance. A failing instance never blocks
//!     the others.
//!
//! ## Quick Start
//!
//! ```rust
//! use costwright::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let catalog = Catalog::new(
//!     vec![CatalogItem::new("pine", "Pine 2x4", 5.0)],
//!     Vec::new(),
//! )?;
//! let engine = Engine::builder(catalog, FunctionRegistry::default()).build();
//!
//! let wall = ModuleDefinition::new("wall", "area * lumber")
//!     .with_field(Field::new("width", FieldType::Number).with_unit("m"))
//!     .with_field(Field::new("height", FieldType::Number).with_unit("m"))
//!     .with_field(Field::new("lumber", FieldType::Material))
//!     .with_output(ComputedOutput::new("area", "width * height"));
//! let library = ModuleLibrary::new(vec![wall])?;
//!
//! let mut workspace = Workspace::new(vec![
//!     ModuleInstance::new("north", "wall")
//!         .with_value("width", FieldValue::Number(4.0))
//!         .with_value("height", FieldValue::Number(2.0))
//!         .with_value("lumber", FieldValue::CatalogRef("pine".into())),
//! ]);
//!
//! let report = engine.recalculate(&mut workspace, &library);
//! assert_eq!(report.total, 40.0);
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod ast;
pub mod catalog;
pub mod compiler;
pub mod config;
pub mod cost;
pub mod data;
pub mod definition;
pub mod error;
pub mod evaluator;
pub mod links;
pub mod logging;
pub mod outputs;
pub mod prelude;
pub mod trace;
pub mod units;
