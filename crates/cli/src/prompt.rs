//! Interactive collection of variable values.
//!
//! Values come from three places, in priority order: `--var` flags, an
//! interactive prompt (when stdin is a terminal and `--batch` is off), and
//! the declaration's defaults. Declared patterns are enforced at the edge,
//! so the render layer only ever sees accepted values.

use std::collections::HashMap;
use std::io::{self, IsTerminal};

use dialoguer::{Input, theme::ColorfulTheme};
use regex::Regex;
use stencil_core::config::{VariableSet, VariableSpec};
use stencil_core::render::ValueMap;
use tracing::debug;

/// Options for prompting behavior.
#[derive(Debug, Clone, Default)]
pub struct PromptOptions {
    /// If true, never prompt, even on a terminal.
    pub batch_mode: bool,
}

/// Result of value collection.
#[derive(Debug)]
pub struct CollectedValues {
    /// All collected values, keyed by variable name.
    pub values: ValueMap,
    /// Variables the user was prompted for.
    pub prompted: Vec<String>,
    /// Variables that fell back to their declared default.
    pub defaulted: Vec<String>,
}

/// Error type for value collection.
#[derive(Debug)]
pub enum PromptError {
    /// Missing value for a declared variable in batch mode.
    MissingValue(String),
    /// A value does not match the variable's declared pattern.
    InvalidValue { name: String, pattern: String },
    /// A `--var` argument is not of the form `name=value`.
    MalformedVar(String),
    /// The same name was passed to `--var` twice.
    DuplicateVar(String),
    /// IO error during prompting.
    Io(io::Error),
    /// User cancelled input.
    Cancelled,
}

impl std::fmt::Display for PromptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PromptError::MissingValue(name) => {
                write!(
                    f,
                    "missing value for variable: {name}\n  Hint: use --var {name}=\"...\" or remove --batch"
                )
            }
            PromptError::InvalidValue { name, pattern } => {
                write!(f, "value for `{name}` does not match pattern `{pattern}`")
            }
            PromptError::MalformedVar(arg) => {
                write!(f, "malformed --var argument: `{arg}` (expected name=value)")
            }
            PromptError::DuplicateVar(name) => {
                write!(f, "duplicate --var argument: {name}")
            }
            PromptError::Io(e) => write!(f, "IO error: {e}"),
            PromptError::Cancelled => write!(f, "input cancelled by user"),
        }
    }
}

impl std::error::Error for PromptError {}

impl From<io::Error> for PromptError {
    fn from(e: io::Error) -> Self {
        PromptError::Io(e)
    }
}

/// Parse `--var` arguments of the form `name=value`.
pub fn parse_var_args(args: &[String]) -> Result<HashMap<String, String>, PromptError> {
    let mut map = HashMap::new();
    for arg in args {
        let Some((key, value)) = arg.split_once('=') else {
            return Err(PromptError::MalformedVar(arg.clone()));
        };
        if map.insert(key.to_string(), value.to_string()).is_some() {
            return Err(PromptError::DuplicateVar(key.to_string()));
        }
    }
    Ok(map)
}

/// Collect a value for every declared variable, in declaration order.
///
/// Fails with [`PromptError::MissingValue`] when a variable has no provided
/// value, no prompt available, and no default.
pub fn collect_values(
    variables: &VariableSet,
    provided: &HashMap<String, String>,
    options: &PromptOptions,
) -> Result<CollectedValues, PromptError> {
    collect_inner(variables, provided, options, true)
}

/// Like [`collect_values`], but variables without a value are skipped
/// instead of failing. Preview uses this: a skipped variable just leaves
/// its placeholders unresolved.
pub fn collect_values_lenient(
    variables: &VariableSet,
    provided: &HashMap<String, String>,
    options: &PromptOptions,
) -> Result<CollectedValues, PromptError> {
    collect_inner(variables, provided, options, false)
}

fn collect_inner(
    variables: &VariableSet,
    provided: &HashMap<String, String>,
    options: &PromptOptions,
    strict: bool,
) -> Result<CollectedValues, PromptError> {
    let mut values = ValueMap::new();
    let mut prompted = Vec::new();
    let mut defaulted = Vec::new();

    // Check if stdin is a terminal (interactive)
    let is_interactive = io::stdin().is_terminal() && !options.batch_mode;

    for spec in variables {
        let name = spec.name.as_str();

        if let Some(value) = provided.get(name) {
            check_pattern(spec, value)?;
            values.insert(name.to_string(), value.clone());
            continue;
        }

        if is_interactive {
            let value = prompt_for_value(spec)?;
            if spec.default.as_deref() == Some(value.as_str()) {
                defaulted.push(name.to_string());
            } else {
                prompted.push(name.to_string());
            }
            values.insert(name.to_string(), value);
        } else if let Some(ref default) = spec.default {
            check_pattern(spec, default)?;
            defaulted.push(name.to_string());
            values.insert(name.to_string(), default.clone());
        } else if strict {
            return Err(PromptError::MissingValue(name.to_string()));
        }
    }

    Ok(CollectedValues { values, prompted, defaulted })
}

fn check_pattern(spec: &VariableSpec, value: &str) -> Result<(), PromptError> {
    let Some(pattern) = spec.pattern.as_deref() else {
        return Ok(());
    };
    // An uncompilable pattern is a declaration problem; lint reports it,
    // collection does not re-refuse the value here.
    let Ok(re) = Regex::new(pattern) else {
        debug!(name = %spec.name, pattern, "skipping uncompilable pattern");
        return Ok(());
    };
    if re.is_match(value) {
        Ok(())
    } else {
        Err(PromptError::InvalidValue {
            name: spec.name.clone(),
            pattern: pattern.to_string(),
        })
    }
}

/// Prompt for one variable, re-asking until the value matches the pattern.
fn prompt_for_value(spec: &VariableSpec) -> Result<String, PromptError> {
    let theme = ColorfulTheme::default();

    // Show description if available
    if let Some(ref description) = spec.description {
        eprintln!("  {description}");
    }

    loop {
        let mut input = Input::<String>::with_theme(&theme).with_prompt(&spec.name);
        if let Some(ref default) = spec.default {
            input = input.default(default.clone()).allow_empty(true);
        }
        let value = input.interact_text().map_err(dialoguer_error_to_prompt_error)?;

        match check_pattern(spec, &value) {
            Ok(()) => return Ok(value),
            Err(PromptError::InvalidValue { pattern, .. }) => {
                eprintln!("  value must match pattern `{pattern}`");
            }
            Err(other) => return Err(other),
        }
    }
}

/// Convert dialoguer error to our PromptError.
fn dialoguer_error_to_prompt_error(e: dialoguer::Error) -> PromptError {
    match e {
        dialoguer::Error::IO(io_err) => {
            if io_err.kind() == io::ErrorKind::UnexpectedEof {
                PromptError::Cancelled
            } else {
                PromptError::Io(io_err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variables(specs: Vec<VariableSpec>) -> VariableSet {
        let mut set = VariableSet::new();
        for spec in specs {
            set.insert(spec).unwrap();
        }
        set
    }

    fn batch() -> PromptOptions {
        PromptOptions { batch_mode: true }
    }

    #[test]
    fn test_parse_var_args() {
        let args = vec![
            "title=Hello".to_string(),
            "author=World".to_string(),
            "empty=".to_string(),
        ];
        let map = parse_var_args(&args).unwrap();
        assert_eq!(map.get("title"), Some(&"Hello".to_string()));
        assert_eq!(map.get("author"), Some(&"World".to_string()));
        assert_eq!(map.get("empty"), Some(&String::new()));
    }

    #[test]
    fn test_parse_var_args_rejects_malformed() {
        let err = parse_var_args(&["no-equals".to_string()]).unwrap_err();
        assert!(matches!(err, PromptError::MalformedVar(_)));
        assert!(err.to_string().contains("name=value"));
    }

    #[test]
    fn test_parse_var_args_rejects_duplicate() {
        let args = vec!["k=1".to_string(), "k=2".to_string()];
        let err = parse_var_args(&args).unwrap_err();
        assert!(matches!(err, PromptError::DuplicateVar(name) if name == "k"));
    }

    #[test]
    fn test_collect_merges_provided_and_defaults() {
        let mut with_default = VariableSpec::named("version");
        with_default.default = Some("0.1.0".to_string());
        let vars = variables(vec![VariableSpec::named("name"), with_default]);

        let mut provided = HashMap::new();
        provided.insert("name".to_string(), "demo".to_string());

        let collected = collect_values(&vars, &provided, &batch()).unwrap();
        assert_eq!(collected.values.get("name"), Some(&"demo".to_string()));
        assert_eq!(collected.values.get("version"), Some(&"0.1.0".to_string()));
        assert_eq!(collected.defaulted, vec!["version"]);
        assert!(collected.prompted.is_empty());
    }

    #[test]
    fn test_collect_missing_value_in_batch() {
        let vars = variables(vec![VariableSpec::named("name")]);
        let err = collect_values(&vars, &HashMap::new(), &batch()).unwrap_err();
        assert!(matches!(err, PromptError::MissingValue(name) if name == "name"));
    }

    #[test]
    fn test_collect_lenient_skips_missing() {
        let vars = variables(vec![VariableSpec::named("name")]);
        let collected = collect_values_lenient(&vars, &HashMap::new(), &batch()).unwrap();
        assert!(collected.values.is_empty());
    }

    #[test]
    fn test_collect_rejects_value_outside_pattern() {
        let mut spec = VariableSpec::named("version");
        spec.pattern = Some(r"^\d+\.\d+$".to_string());
        let vars = variables(vec![spec]);

        let mut provided = HashMap::new();
        provided.insert("version".to_string(), "one.two".to_string());

        let err = collect_values(&vars, &provided, &batch()).unwrap_err();
        assert!(matches!(err, PromptError::InvalidValue { ref name, .. } if name == "version"));
    }

    #[test]
    fn test_collect_validates_defaults_too() {
        let mut spec = VariableSpec::named("port");
        spec.default = Some("http".to_string());
        spec.pattern = Some(r"^\d+$".to_string());
        let vars = variables(vec![spec]);

        let err = collect_values(&vars, &HashMap::new(), &batch()).unwrap_err();
        assert!(matches!(err, PromptError::InvalidValue { .. }));
    }

    #[test]
    fn test_collect_keeps_declaration_order() {
        let mut first = VariableSpec::named("zeta");
        first.default = Some("z".to_string());
        let mut second = VariableSpec::named("alpha");
        second.default = Some("a".to_string());
        let vars = variables(vec![first, second]);

        let collected = collect_values(&vars, &HashMap::new(), &batch()).unwrap();
        assert_eq!(collected.defaulted, vec!["zeta", "alpha"]);
    }
}
