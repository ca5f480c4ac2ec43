//! Declaration auto-fix.

use std::collections::HashSet;
use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::config::loader;
use crate::config::{ConfigError, DuplicateVariable, TemplateConfig, VariableSpec};
use crate::lint::Classification;

#[derive(Debug, Error)]
pub enum FixError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Duplicate(#[from] DuplicateVariable),
}

/// What a fix pass changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixOutcome {
    /// Names newly declared, in first-reference order.
    pub added: Vec<String>,
    /// Names dropped from the declaration, in declaration order.
    pub removed: Vec<String>,
    /// Referenced names that cannot be declared, in first-reference order.
    pub skipped: Vec<String>,
    /// Issue count before the rewrite.
    pub before: usize,
    /// Issue count after the rewrite; references to skipped names remain.
    pub after: usize,
}

impl FixOutcome {
    /// Issues the rewrite resolved.
    pub fn fixed(&self) -> usize {
        self.before.saturating_sub(self.after)
    }
}

/// Rewrite the declaration to match the classified scan, then persist it.
///
/// Every undeclared name gains an entry with a placeholder description and
/// every unreferenced entry is dropped. A name `loader::validate` would
/// reject is skipped rather than declared, so the rewritten file always
/// passes validation; references to skipped names stay open issues.
pub fn fix_declarations(
    classification: &Classification,
    config: &mut TemplateConfig,
    path: &Path,
) -> Result<FixOutcome, FixError> {
    let before = classification.issue_count();

    let mut added = Vec::new();
    let mut skipped = Vec::new();
    let mut seen = HashSet::new();
    for reference in &classification.undeclared {
        if !seen.insert(reference.name.clone()) {
            continue;
        }
        if !loader::is_valid_variable_name(&reference.name) {
            skipped.push(reference.name.clone());
            continue;
        }
        let mut spec = VariableSpec::named(reference.name.as_str());
        spec.description = Some(format!("TODO: describe {}", reference.name));
        config.variables_mut().insert(spec)?;
        added.push(reference.name.clone());
    }

    let mut removed = Vec::new();
    for name in classification.unreferenced() {
        if config.variables_mut().remove(name).is_some() {
            removed.push(name.to_owned());
        }
    }

    let after = classification
        .undeclared
        .iter()
        .filter(|reference| skipped.contains(&reference.name))
        .count();

    loader::save(path, config)?;
    info!(
        path = %path.display(),
        added = added.len(),
        removed = removed.len(),
        skipped = skipped.len(),
        "rewrote declaration"
    );

    Ok(FixOutcome { added, removed, skipped, before, after })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use tempfile::TempDir;

    use crate::lint::classify;
    use crate::scan::scan_template;

    #[test]
    fn test_fix_round_trip() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::write(root.join("{{a}}.txt"), "{{b}}\n").unwrap();

        let declaration = root.join(".stencil.json");
        let mut config = TemplateConfig::default();
        config.variables_mut().insert(VariableSpec::named("b")).unwrap();
        config.variables_mut().insert(VariableSpec::named("c")).unwrap();
        loader::save(&declaration, &config).unwrap();

        let references = scan_template(root).unwrap();
        let classification = classify(&references, config.variables());
        assert_eq!(classification.issue_count(), 2);

        let outcome = fix_declarations(&classification, &mut config, &declaration).unwrap();
        assert_eq!(outcome.added, vec!["a"]);
        assert_eq!(outcome.removed, vec!["c"]);
        assert!(outcome.skipped.is_empty());
        assert_eq!(outcome.before, 2);
        assert_eq!(outcome.after, 0);
        assert_eq!(outcome.fixed(), 2);

        let names: Vec<&str> = config.variables().names().collect();
        assert_eq!(names, vec!["b", "a"]);

        let reloaded = loader::load(&declaration).unwrap();
        let reloaded_names: Vec<&str> = reloaded.variables().names().collect();
        assert_eq!(reloaded_names, vec!["b", "a"]);
        assert_eq!(
            reloaded.variables().get("a").and_then(|spec| spec.description.as_deref()),
            Some("TODO: describe a")
        );

        assert!(classify(&references, config.variables()).is_clean());
    }

    #[test]
    fn test_fix_declares_repeated_undeclared_name_once() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::write(root.join("one.txt"), "{{ghost}}\n").unwrap();
        fs::write(root.join("two.txt"), "{{ghost}}\n").unwrap();

        let declaration = root.join(".stencil");
        let mut config = TemplateConfig::default();
        loader::save(&declaration, &config).unwrap();

        let references = scan_template(root).unwrap();
        let classification = classify(&references, config.variables());
        assert_eq!(classification.undeclared.len(), 2);

        let outcome = fix_declarations(&classification, &mut config, &declaration).unwrap();
        assert_eq!(outcome.added, vec!["ghost"]);
        assert_eq!(outcome.before, 2);
        assert!(classify(&references, config.variables()).is_clean());
    }

    #[test]
    fn test_fix_skips_undeclarable_name() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::write(root.join("notes.txt"), "{{my-var}} and {{kept}}\n").unwrap();

        let declaration = root.join(".stencil.json");
        let mut config = TemplateConfig::default();
        loader::save(&declaration, &config).unwrap();

        let references = scan_template(root).unwrap();
        let classification = classify(&references, config.variables());
        assert_eq!(classification.issue_count(), 2);

        let outcome = fix_declarations(&classification, &mut config, &declaration).unwrap();
        assert_eq!(outcome.added, vec!["kept"]);
        assert_eq!(outcome.skipped, vec!["my-var"]);
        assert_eq!(outcome.after, 1);
        assert_eq!(outcome.fixed(), 1);

        // The rewritten file never names `my-var` and still validates clean,
        // so a following lint run parses it instead of failing on it.
        let reloaded = loader::load(&declaration).unwrap();
        assert!(!reloaded.variables().contains("my-var"));
        assert!(loader::validate(&reloaded).is_empty());
        assert!(!classify(&references, config.variables()).is_clean());
    }

    #[test]
    fn test_fix_without_issues_changes_nothing() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::write(root.join("{{name}}.txt"), "").unwrap();

        let declaration = root.join(".stencil.json");
        let mut config = TemplateConfig::default();
        config.variables_mut().insert(VariableSpec::named("name")).unwrap();
        loader::save(&declaration, &config).unwrap();

        let references = scan_template(root).unwrap();
        let classification = classify(&references, config.variables());
        let outcome = fix_declarations(&classification, &mut config, &declaration).unwrap();

        assert!(outcome.added.is_empty());
        assert!(outcome.removed.is_empty());
        assert_eq!(outcome.fixed(), 0);
    }
}
