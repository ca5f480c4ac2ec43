//! Declaration-file model and persistence.
//!
//! Every template carries a sidecar declaration file (`.stencil`,
//! `.stencil.json`, or `.stencil.jsonc`) whose `template.variables` section
//! declares the placeholder variables the tree may reference. Sections other
//! than `template.variables` are preserved opaquely across rewrites.

pub mod loader;
pub mod types;

pub use loader::{ConfigError, ConfigIssue, is_declaration_file, resolve_declaration_path};
pub use types::{DuplicateVariable, TemplateConfig, VariableSet, VariableSpec};
