//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types from the costwright
//! crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use costwright::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let bundle = WorkspaceBundle::from_file("path/to/bundle.json")?;
//! let (engine, library, mut workspace) = bundle.into_engine(EngineConfig::default())?;
//!
//! let report = engine.recalculate(&mut workspace, &library);
//! for instance in &report.instances {
//!     println!("{}: {}", instance.instance_id, instance.display_cost(2));
//! }
//! # Ok(())
//! # }
//! ```

// Engine and reports
pub use crate::config::EngineConfig;
pub use crate::cost::{Engine, EngineBuilder, FieldSummaryEntry, InstanceReport, WorkspaceReport};

// Catalog and definitions
pub use crate::catalog::{Catalog, CatalogItem, CatalogKind, FunctionRegistry, Property, SharedFunction};
pub use crate::definition::{
    ComputedOutput, Field, FieldLink, FieldType, ModuleDefinition, ModuleInstance, ModuleLibrary,
    Workspace,
};

// Formulas
pub use crate::analyzer::{FormulaAnalysis, VariableScope};
pub use crate::ast::{EvaluationTrace, Expression, FieldValue, InputSource};
pub use crate::evaluator::EvaluationContext;
pub use crate::outputs::ComputedOutputs;

// Data loading
pub use crate::data::WorkspaceBundle;

// Error types
pub use crate::error::{ErrorKind, FormulaError};

// Trace formatting
pub use crate::trace::TraceFormatter;

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
