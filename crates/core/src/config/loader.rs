//! Declaration-file discovery, loading, validation, and rewriting.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::{fs, io};

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::config::types::TemplateConfig;

/// Base name of the declaration file within a template root.
pub const DECLARATION_BASE: &str = ".stencil";

/// Extension candidates tried in order when resolving the declaration file.
pub const DECLARATION_EXTENSIONS: [&str; 3] = ["", ".json", ".jsonc"];

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read declaration {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse declaration {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("invalid declaration {path}: {source}")]
    Schema {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize declaration: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to write declaration {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A schema problem in an otherwise parseable declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    /// Dotted path of the offending property, e.g. `template.variables.foo`.
    pub property: String,
    pub reason: String,
}

/// True if `name` may be declared as a variable.
///
/// The same rule gates both `validate` and the auto-fixer, so a fix never
/// writes a name that validation would then reject.
pub fn is_valid_variable_name(name: &str) -> bool {
    NAME_RE.is_match(name)
}

/// True if `file_name` is one of the declaration-file candidate names.
pub fn is_declaration_file(file_name: &str) -> bool {
    match file_name.strip_prefix(DECLARATION_BASE) {
        Some(rest) => DECLARATION_EXTENSIONS.contains(&rest),
        None => false,
    }
}

/// Locate the declaration file for a template root.
///
/// Candidates are tried in extension order; the first that exists as a
/// regular file wins. Returns `None` when the root has no declaration.
pub fn resolve_declaration_path(root: &Path) -> Option<PathBuf> {
    DECLARATION_EXTENSIONS
        .iter()
        .map(|ext| root.join(format!("{DECLARATION_BASE}{ext}")))
        .find(|candidate| candidate.is_file())
}

/// Load and parse a declaration file (JSON, optionally with comments).
pub fn load(path: &Path) -> Result<TemplateConfig, ConfigError> {
    let text = fs::read_to_string(path)
        .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;

    let value = jsonc_parser::parse_to_serde_value(&text, &Default::default())
        .map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .ok_or_else(|| ConfigError::Parse {
            path: path.to_path_buf(),
            message: "empty declaration".to_string(),
        })?;

    let config = serde_json::from_value(value)
        .map_err(|source| ConfigError::Schema { path: path.to_path_buf(), source })?;

    debug!(path = %path.display(), "loaded declaration");
    Ok(config)
}

/// Write `config` back to `path` as pretty-printed JSON.
///
/// Comments from a JSONC input do not survive a rewrite; declared variables
/// keep their order, other sections keep their content.
pub fn save(path: &Path, config: &TemplateConfig) -> Result<(), ConfigError> {
    let mut text = serde_json::to_string_pretty(config).map_err(ConfigError::Serialize)?;
    text.push('\n');
    fs::write(path, text)
        .map_err(|source| ConfigError::Write { path: path.to_path_buf(), source })
}

/// Schema checks beyond what deserialization enforces.
///
/// A non-empty result is fatal to the invoking command: the declaration
/// parsed but cannot be trusted.
pub fn validate(config: &TemplateConfig) -> Vec<ConfigIssue> {
    let mut issues = Vec::new();

    for spec in config.variables() {
        let property = format!("template.variables.{}", spec.name);
        if !is_valid_variable_name(&spec.name) {
            issues.push(ConfigIssue {
                property: property.clone(),
                reason: "name is not a valid identifier".to_string(),
            });
        }
        if let Some(ref pattern) = spec.pattern
            && let Err(e) = Regex::new(pattern)
        {
            issues.push(ConfigIssue {
                property: format!("{property}.pattern"),
                reason: format!("invalid regex: {e}"),
            });
        }
    }

    issues
}
