use std::fmt;
use thiserror::Error;

/// Errors produced while parsing, validating or evaluating a formula.
///
/// The first four variants (plus `ForwardReference`) are validation-time
/// failures that block acceptance of a formula in the editor. The remaining
/// variants are evaluation-time failures: they degrade a single instance's cost
/// to a "cannot calculate" state and never cross instance boundaries.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    #[error("Syntax error: {message}")]
    Syntax { message: String },

    #[error("Unknown variable '{name}'")]
    UnknownVariable {
        name: String,
        suggestions: Vec<String>,
    },

    #[error("Function '{function}' expects {expected} argument(s), but received {found}")]
    Arity {
        function: String,
        expected: Arity,
        found: usize,
    },

    #[error("Evaluation failed in '{expression}': {message}")]
    Evaluation { message: String, expression: String },

    #[error("Required field '{field}' has no value")]
    MissingRequiredInput { field: String },

    #[error("No catalog item is selected for field '{field}'")]
    MissingCatalogSelection { field: String },

    #[error("Field '{field}' is linked, but the link is broken: {reason}")]
    BrokenLink {
        field: String,
        reason: BrokenLinkReason,
    },

    #[error("Link rejected: {0}")]
    IncompatibleLink(LinkRejection),

    #[error(
        "Computed output '{output}' references '{referenced}', which is not evaluated before it"
    )]
    ForwardReference { output: String, referenced: String },

    #[error("Module definition '{module_id}' was not found in the library")]
    MissingModule { module_id: String },
}

impl FormulaError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FormulaError::Syntax { .. } => ErrorKind::Syntax,
            FormulaError::UnknownVariable { .. } => ErrorKind::UnknownVariable,
            FormulaError::Arity { .. } => ErrorKind::Arity,
            FormulaError::Evaluation { .. } => ErrorKind::Evaluation,
            FormulaError::MissingRequiredInput { .. } => ErrorKind::MissingRequiredInput,
            FormulaError::MissingCatalogSelection { .. } => ErrorKind::MissingCatalogSelection,
            FormulaError::BrokenLink { .. } => ErrorKind::BrokenLink,
            FormulaError::IncompatibleLink(_) => ErrorKind::IncompatibleLink,
            FormulaError::ForwardReference { .. } => ErrorKind::ForwardReference,
            FormulaError::MissingModule { .. } => ErrorKind::MissingModule,
        }
    }

    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        FormulaError::Syntax {
            message: message.into(),
        }
    }

    pub(crate) fn unknown(name: impl Into<String>) -> Self {
        FormulaError::UnknownVariable {
            name: name.into(),
            suggestions: Vec::new(),
        }
    }

    pub(crate) fn evaluation(message: impl Into<String>, expression: impl fmt::Display) -> Self {
        FormulaError::Evaluation {
            message: message.into(),
            expression: expression.to_string(),
        }
    }
}

/// A cheap discriminant of [`FormulaError`], used in per-output error tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    Syntax,
    UnknownVariable,
    Arity,
    Evaluation,
    MissingRequiredInput,
    MissingCatalogSelection,
    BrokenLink,
    IncompatibleLink,
    ForwardReference,
    MissingModule,
}

impl ErrorKind {
    /// `true` for errors that are reported while editing and block acceptance
    /// of a formula or link.
    pub fn is_validation(self) -> bool {
        matches!(
            self,
            ErrorKind::Syntax
                | ErrorKind::UnknownVariable
                | ErrorKind::Arity
                | ErrorKind::IncompatibleLink
                | ErrorKind::ForwardReference
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::UnknownVariable => "UnknownVariable",
            ErrorKind::Arity => "ArityError",
            ErrorKind::Evaluation => "EvaluationError",
            ErrorKind::MissingRequiredInput => "MissingRequiredInput",
            ErrorKind::MissingCatalogSelection => "MissingCatalogSelection",
            ErrorKind::BrokenLink => "BrokenLink",
            ErrorKind::IncompatibleLink => "IncompatibleLink",
            ErrorKind::ForwardReference => "ForwardReference",
            ErrorKind::MissingModule => "MissingModule",
        };
        f.write_str(name)
    }
}

/// The number of arguments a function accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    Range(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => count == n,
            Arity::Range(lo, hi) => (lo..=hi).contains(&count),
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "{}", n),
            Arity::Range(lo, hi) => write!(f, "{} to {}", lo, hi),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}

/// Why a link that was accepted earlier no longer produces a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokenLinkReason {
    TargetInstanceMissing { instance_id: String },
    TargetFieldMissing { instance_id: String, name: String },
    Cycle,
    TargetUnavailable { instance_id: String, name: String },
}

impl fmt::Display for BrokenLinkReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrokenLinkReason::TargetInstanceMissing { instance_id } => {
                write!(f, "instance '{}' is no longer in the workspace", instance_id)
            }
            BrokenLinkReason::TargetFieldMissing { instance_id, name } => write!(
                f,
                "instance '{}' no longer defines '{}'",
                instance_id, name
            ),
            BrokenLinkReason::Cycle => write!(f, "the link chain forms a cycle"),
            BrokenLinkReason::TargetUnavailable { instance_id, name } => write!(
                f,
                "'{}' on instance '{}' could not be calculated",
                name, instance_id
            ),
        }
    }
}

/// Why a proposed link was refused by `can_link_fields`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkRejection {
    SelfLink,
    CatalogFieldSource { field: String },
    CatalogFieldTarget { field: String },
    TypeMismatch { source: String, target: String },
    UnitCategoryMismatch { source: String, target: String },
    WouldCreateCycle,
    UnknownSourceField { field: String },
    UnknownTargetInstance { instance_id: String },
    UnknownTarget { instance_id: String, name: String },
}

impl fmt::Display for LinkRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkRejection::SelfLink => write!(f, "a field cannot link to itself"),
            LinkRejection::CatalogFieldSource { field } => write!(
                f,
                "field '{}' selects a catalog item and cannot be linked",
                field
            ),
            LinkRejection::CatalogFieldTarget { field } => write!(
                f,
                "field '{}' selects a catalog item and cannot be a link target",
                field
            ),
            LinkRejection::TypeMismatch { source, target } => write!(
                f,
                "field types differ (source is {}, target is {})",
                source, target
            ),
            LinkRejection::UnitCategoryMismatch { source, target } => write!(
                f,
                "unit categories differ (source is {}, target is {})",
                source, target
            ),
            LinkRejection::WouldCreateCycle => {
                write!(f, "the target is already linked back to this field")
            }
            LinkRejection::UnknownSourceField { field } => {
                write!(f, "source field '{}' does not exist", field)
            }
            LinkRejection::UnknownTargetInstance { instance_id } => {
                write!(f, "target instance '{}' does not exist", instance_id)
            }
            LinkRejection::UnknownTarget { instance_id, name } => write!(
                f,
                "instance '{}' has no field or computed output named '{}'",
                instance_id, name
            ),
        }
    }
}

/// Errors raised by the unit registry. An unknown unit is a configuration
/// error and is reported when definitions are built, not per evaluation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    #[error("Unknown unit symbol '{0}'")]
    UnknownUnit(String),

    #[error("Cannot convert between '{from}' ({from_category}) and '{to}' ({to_category})")]
    CategoryMismatch {
        from: String,
        from_category: String,
        to: String,
        to_category: String,
    },
}

/// Errors found while building module definitions, catalog snapshots or the
/// shared function registry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DefinitionError {
    #[error("'{name}' in {owner} is not a valid variable name")]
    InvalidVariableName { owner: String, name: String },

    #[error("Variable name '{name}' is used more than once in {owner}")]
    DuplicateVariableName { owner: String, name: String },

    #[error("{owner}: {source}")]
    Unit {
        owner: String,
        #[source]
        source: UnitError,
    },

    #[error("Shared function '{0}' is defined more than once")]
    DuplicateFunction(String),

    #[error("Shared function '{function}' has an invalid parameter '{parameter}'")]
    InvalidParameter { function: String, parameter: String },

    #[error("Catalog item '{0}' is defined more than once")]
    DuplicateCatalogItem(String),
}

/// Errors raised while loading the engine configuration or a data bundle.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid bundle JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Definition(#[from] DefinitionError),
}
