//! The module cost evaluator: orchestrates link resolution, computed outputs
//! and the main formula for every instance of a workspace.

use crate::analyzer::{self, FormulaAnalysis, ModuleValidation, VariableScope};
use crate::ast::{FieldValue, format_number};
use crate::catalog::{Catalog, CatalogKind, FunctionRegistry};
use crate::compiler::FormulaCache;
use crate::config::EngineConfig;
use crate::definition::{Field, ModuleDefinition, ModuleInstance, ModuleLibrary, Workspace};
use crate::error::{ErrorKind, FormulaError};
use crate::evaluator::{self, EvaluationContext};
use crate::links::{self, ResolvedField, ResolvedWorkspace};
use crate::outputs::{self, ComputedOutputs};
use crate::trace::TraceFormatter;
use crate::units;
use tracing::{info, warn};

/// One row of an instance's field summary, ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSummaryEntry {
    pub label: String,
    pub variable_name: String,
    /// Numbers are converted to the field's display unit.
    pub display_value: String,
    pub unit: Option<String>,
    pub linked: bool,
    /// The link is broken; `display_value` shows the stale local value.
    pub broken: bool,
}

/// The outcome of evaluating one module instance.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceReport {
    pub instance_id: String,
    pub module_id: String,
    pub cost: Result<f64, FormulaError>,
    pub outputs: ComputedOutputs,
    /// The main formula with every input's value, e.g.
    /// `width (was 3) * height (was 2)`.
    pub breakdown: Option<String>,
    pub field_summary: Vec<FieldSummaryEntry>,
}

impl InstanceReport {
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.cost.as_ref().err().map(FormulaError::kind)
    }

    /// The cost as shown in a quote: the number, or "cannot calculate" with
    /// the reason.
    pub fn display_cost(&self, precision: u32) -> String {
        match &self.cost {
            Ok(cost) => format!("{:.*}", precision as usize, cost),
            Err(e) => format!("cannot calculate ({})", e),
        }
    }
}

/// Per-instance results of a workspace recompute.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceReport {
    pub instances: Vec<InstanceReport>,
    /// Sum of every cost that could be calculated.
    pub total: f64,
    pub failed: usize,
}

impl WorkspaceReport {
    pub fn instance(&self, instance_id: &str) -> Option<&InstanceReport> {
        self.instances.iter().find(|r| r.instance_id == instance_id)
    }
}

/// The formula engine: catalog snapshot, shared functions, configuration and
/// the formula cache.
#[derive(Debug)]
pub struct Engine {
    catalog: Catalog,
    functions: FunctionRegistry,
    config: EngineConfig,
    cache: FormulaCache,
}

pub struct EngineBuilder {
    catalog: Catalog,
    functions: FunctionRegistry,
    config: EngineConfig,
}

impl EngineBuilder {
    pub fn new(catalog: Catalog, functions: FunctionRegistry) -> Self {
        Self {
            catalog,
            functions,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            cache: FormulaCache::new(self.config.cache_formulas, self.config.fold_constants),
            catalog: self.catalog,
            functions: self.functions,
            config: self.config,
        }
    }
}

impl Engine {
    pub fn builder(catalog: Catalog, functions: FunctionRegistry) -> EngineBuilder {
        EngineBuilder::new(catalog, functions)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &FormulaCache {
        &self.cache
    }

    /// An empty evaluation context wired to this engine's catalog, functions,
    /// cache and call-depth limit.
    pub fn context(&self) -> EvaluationContext<'_> {
        EvaluationContext::new(&self.catalog, &self.functions)
            .with_cache(&self.cache)
            .with_max_call_depth(self.config.max_call_depth)
    }

    /// Evaluates a standalone formula with plain numeric variables.
    pub fn evaluate(&self, formula: &str, variables: &[(&str, f64)]) -> Result<f64, FormulaError> {
        let mut context = self.context();
        for (name, value) in variables {
            context.bind_number(name, *value);
        }
        evaluator::evaluate(formula, &context)
    }

    pub fn scope_for<'a>(&'a self, module: &'a ModuleDefinition) -> VariableScope<'a> {
        VariableScope::for_module(module, &self.catalog, &self.functions)
    }

    pub fn analyze(&self, formula: &str, scope: &VariableScope<'_>) -> FormulaAnalysis {
        analyzer::analyze(formula, scope)
    }

    pub fn validate_formula(
        &self,
        formula: &str,
        scope: &VariableScope<'_>,
    ) -> Result<(), FormulaError> {
        analyzer::validate_formula(formula, scope, self.config.max_suggestions)
    }

    /// Validates the main formula and every computed output, applying the
    /// output ordering rule.
    pub fn validate_module(&self, module: &ModuleDefinition) -> ModuleValidation {
        analyzer::validate_module(
            module,
            &self.catalog,
            &self.functions,
            self.config.max_suggestions,
        )
    }

    pub fn resolve_links(&self, workspace: &Workspace, library: &ModuleLibrary) -> ResolvedWorkspace {
        links::resolve_links(workspace, library, &self.context())
    }

    /// Evaluates one instance from already-resolved workspace links.
    pub fn evaluate_instance(
        &self,
        instance: &ModuleInstance,
        library: &ModuleLibrary,
        resolved: &ResolvedWorkspace,
    ) -> InstanceReport {
        let Some(module) = library.get(&instance.module_id) else {
            warn!(instance = %instance.id, module = %instance.module_id, "module definition missing");
            return InstanceReport {
                instance_id: instance.id.clone(),
                module_id: instance.module_id.clone(),
                cost: Err(FormulaError::MissingModule {
                    module_id: instance.module_id.clone(),
                }),
                outputs: ComputedOutputs::default(),
                breakdown: None,
                field_summary: Vec::new(),
            };
        };

        let fields = resolved.instance(&instance.id);
        let mut context = self.context();
        links::bind_resolved_fields(&mut context, module, fields);
        let outputs = outputs::evaluate_computed_outputs(module, &mut context);

        let precision = self.config.display_precision;
        let (cost, breakdown) = match evaluator::evaluate_with_trace(&module.formula, &context) {
            Ok(trace) => (
                Ok(trace.get_outcome()),
                Some(TraceFormatter::format_trace_with_precision(&trace, precision)),
            ),
            Err(error) => {
                warn!(instance = %instance.id, %error, "cannot calculate cost");
                (Err(error), None)
            }
        };

        let field_summary = module
            .fields
            .iter()
            .map(|field| self.summarize_field(field, fields.and_then(|f| f.get(&field.variable_name))))
            .collect();

        InstanceReport {
            instance_id: instance.id.clone(),
            module_id: module.id.clone(),
            cost,
            outputs,
            breakdown,
            field_summary,
        }
    }

    /// Resolves every link, evaluates every instance and writes each
    /// `calculated_cost` back (`None` when it cannot be calculated).
    ///
    /// The whole workspace is recomputed on every call; instances never see
    /// a partially updated set of resolved values.
    pub fn recalculate(&self, workspace: &mut Workspace, library: &ModuleLibrary) -> WorkspaceReport {
        let resolved = self.resolve_links(workspace, library);
        let instances: Vec<InstanceReport> = workspace
            .instances
            .iter()
            .map(|instance| self.evaluate_instance(instance, library, &resolved))
            .collect();

        for (instance, report) in workspace.instances.iter_mut().zip(&instances) {
            instance.calculated_cost = report.cost.as_ref().ok().copied();
        }

        let total = instances.iter().filter_map(|r| r.cost.as_ref().ok()).sum();
        let failed = instances.iter().filter(|r| r.cost.is_err()).count();
        info!(instances = instances.len(), failed, total, "recalculated workspace");

        WorkspaceReport {
            instances,
            total,
            failed,
        }
    }

    fn summarize_field(&self, field: &Field, resolved: Option<&ResolvedField>) -> FieldSummaryEntry {
        let (value, linked, broken) = match resolved {
            Some(ResolvedField::Broken { fallback, .. }) => (fallback.clone(), true, true),
            Some(resolved) => (resolved.value().cloned(), resolved.is_linked(), false),
            None => (None, false, false),
        };
        // An invalid stored value is shown as typed rather than defaulted.
        let value = match value.filter(|v| !v.is_blank()) {
            Some(raw) => Some(raw.clone().coerce(field.field_type).unwrap_or(raw)),
            None => field.fallback_value(),
        };

        FieldSummaryEntry {
            label: field.label.clone(),
            variable_name: field.variable_name.clone(),
            display_value: self.display_value(field, value.as_ref()),
            unit: field.unit.clone(),
            linked,
            broken,
        }
    }

    fn display_value(&self, field: &Field, value: Option<&FieldValue>) -> String {
        let precision = self.config.display_precision;
        match value {
            None => "-".to_string(),
            Some(FieldValue::Number(n)) => {
                let shown = field
                    .unit
                    .as_deref()
                    .and_then(|unit| units::convert_from_base(*n, unit).ok())
                    .unwrap_or(*n);
                let factor = 10f64.powi(precision as i32);
                format_number((shown * factor).round() / factor)
            }
            Some(FieldValue::Boolean(b)) => if *b { "Yes" } else { "No" }.to_string(),
            Some(FieldValue::Text(text)) => text.clone(),
            Some(FieldValue::CatalogRef(id)) => CatalogKind::for_field(field.field_type)
                .and_then(|kind| self.catalog.item(kind, id))
                .map(|item| item.name.clone())
                .unwrap_or_else(|| id.clone()),
        }
    }
}
