//! Module definitions, placed instances and the workspace they live in.

pub mod field;
pub mod instance;
pub mod module;

pub use field::*;
pub use instance::*;
pub use module::*;

/// Namespace under which computed outputs are published to formulas and links.
pub const OUTPUT_PREFIX: &str = "out.";

/// `true` when `name` matches `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
