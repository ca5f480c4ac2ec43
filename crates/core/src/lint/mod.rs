//! Cross-referencing of scanned references against declared variables.
//!
//! [`classify`] partitions a scan into declared and undeclared references.
//! Every declared variable gets a bucket up front, so a zero-length bucket
//! after classification means the variable is never referenced. Lint turns
//! the partition into [`LintIssue`]s; the fixer rewrites the declaration
//! until the partition is clean.

pub mod fixer;

pub use fixer::{FixError, FixOutcome, fix_declarations};

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::config::VariableSet;
use crate::scan::{ReferenceKind, VariableReference};

/// References grouped under the declared variable they resolve to.
///
/// Iteration follows declaration order, not reference order.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    names: Vec<String>,
    refs: HashMap<String, Vec<VariableReference>>,
}

impl ReferenceTable {
    fn seeded(variables: &VariableSet) -> Self {
        let names: Vec<String> = variables.names().map(str::to_owned).collect();
        let refs = names.iter().map(|name| (name.clone(), Vec::new())).collect();
        Self { names, refs }
    }

    /// Whether `name` is declared, regardless of reference count.
    pub fn contains(&self, name: &str) -> bool {
        self.refs.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&[VariableReference]> {
        self.refs.get(name).map(Vec::as_slice)
    }

    /// Declared names with their references, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[VariableReference])> {
        self.names
            .iter()
            .filter_map(|name| self.refs.get(name).map(|refs| (name.as_str(), refs.as_slice())))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Files the reference under its name, or hands it back when undeclared.
    fn push(&mut self, reference: VariableReference) -> Option<VariableReference> {
        match self.refs.get_mut(&reference.name) {
            Some(bucket) => {
                bucket.push(reference);
                None
            }
            None => Some(reference),
        }
    }
}

/// Result of matching a scan against a declaration.
#[derive(Debug, Clone)]
pub struct Classification {
    pub table: ReferenceTable,
    /// References to names absent from the declaration, in scan order.
    /// Repeated occurrences of the same name are all kept.
    pub undeclared: Vec<VariableReference>,
}

impl Classification {
    /// Declared names with zero references, in declaration order.
    pub fn unreferenced(&self) -> Vec<&str> {
        self.table
            .iter()
            .filter(|(_, refs)| refs.is_empty())
            .map(|(name, _)| name)
            .collect()
    }

    pub fn issue_count(&self) -> usize {
        self.undeclared.len() + self.unreferenced().len()
    }

    pub fn is_clean(&self) -> bool {
        self.issue_count() == 0
    }

    /// Render the partition as lint issues, undeclared references first in
    /// scan order, then unreferenced declarations in declaration order.
    pub fn issues(&self, declaration: &Path) -> Vec<LintIssue> {
        let declaration_name = declaration
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| declaration.display().to_string());

        let mut issues = Vec::new();
        for reference in &self.undeclared {
            let path = reference.source_path.display();
            let issue = match reference.kind {
                ReferenceKind::DirectoryName => LintIssue {
                    location: path.to_string(),
                    message: format!(
                        "`{{{{ {} }}}}` in directory name but missing from {declaration_name}",
                        reference.name
                    ),
                },
                ReferenceKind::FileName => LintIssue {
                    location: path.to_string(),
                    message: format!(
                        "`{{{{ {} }}}}` in file name but missing from {declaration_name}",
                        reference.name
                    ),
                },
                ReferenceKind::ContentLine(line) => LintIssue {
                    location: format!("{path} line {line}"),
                    message: format!(
                        "`{{{{ {} }}}}` is missing from {declaration_name}",
                        reference.name
                    ),
                },
            };
            issues.push(issue);
        }

        for name in self.unreferenced() {
            issues.push(LintIssue {
                location: declaration_name.clone(),
                message: format!("variable `{name}` is declared but never referenced"),
            });
        }
        issues
    }
}

/// One reportable lint finding with a human-readable location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintIssue {
    pub location: String,
    pub message: String,
}

impl fmt::Display for LintIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// Match every scanned reference against the declared variables.
pub fn classify(references: &[VariableReference], variables: &VariableSet) -> Classification {
    let mut table = ReferenceTable::seeded(variables);
    let mut undeclared = Vec::new();
    for reference in references {
        if let Some(orphan) = table.push(reference.clone()) {
            undeclared.push(orphan);
        }
    }
    Classification { table, undeclared }
}
