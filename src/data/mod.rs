//! Loading and saving of workspace bundles.

mod model;

pub use model::WorkspaceBundle;
