//! Turns formula text into optimized ASTs.

use crate::ast::Expression;
use crate::error::FormulaError;
use ahash::AHashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, trace};

mod lexer;
mod optimizer;
mod parser;

pub use lexer::{Token, tokenize};
pub use optimizer::AstOptimizer;
pub use parser::parse;

/// Parses a formula and, when `fold_constants` is set, folds its constant
/// sub-expressions.
pub fn compile(code: &str, fold_constants: bool) -> Result<Expression, FormulaError> {
    let ast = parse(code)?;
    if fold_constants {
        Ok(AstOptimizer::optimize(ast))
    } else {
        Ok(ast)
    }
}

/// Memoizes compiled formulas by their source text.
///
/// Parse failures are not cached; they are cheap to reproduce and callers
/// usually fix the text before asking again.
#[derive(Debug)]
pub struct FormulaCache {
    enabled: bool,
    fold_constants: bool,
    entries: RwLock<AHashMap<String, Arc<Expression>>>,
}

impl FormulaCache {
    pub fn new(enabled: bool, fold_constants: bool) -> Self {
        Self {
            enabled,
            fold_constants,
            entries: RwLock::new(AHashMap::new()),
        }
    }

    pub fn get_or_compile(&self, code: &str) -> Result<Arc<Expression>, FormulaError> {
        if self.enabled {
            if let Ok(entries) = self.entries.read() {
                if let Some(ast) = entries.get(code) {
                    trace!(formula = code, "formula cache hit");
                    return Ok(Arc::clone(ast));
                }
            }
        }

        let ast = Arc::new(compile(code, self.fold_constants)?);
        debug!(formula = code, compiled = %ast, "compiled formula");
        if self.enabled {
            if let Ok(mut entries) = self.entries.write() {
                entries.insert(code.to_string(), Arc::clone(&ast));
            }
        }
        Ok(ast)
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }
}

impl Default for FormulaCache {
    fn default() -> Self {
        Self::new(true, true)
    }
}
