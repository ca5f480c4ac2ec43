//! Template-tree scanning for placeholder references.
//!
//! The scanner walks a template root in a deterministic pre-order (parents
//! before children, entries sorted by name within each directory) and emits
//! one [`VariableReference`] per name found in a directory name, a file name,
//! or a content line. Two scans of an unmodified tree yield identical
//! sequences, which lint output and tests rely on.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use crate::config::loader::is_declaration_file;
use crate::placeholder;

/// Where in the tree a placeholder occurrence was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// In a directory's base name.
    DirectoryName,
    /// In a file's base name.
    FileName,
    /// In file content, with the 1-indexed line number.
    ContentLine(u32),
}

/// One placeholder occurrence in the template tree.
///
/// Created fresh by each scan and consumed by the classifier; never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableReference {
    /// The referenced variable name, already trimmed.
    pub name: String,
    /// Path of the referencing entry, relative to the template root.
    pub source_path: PathBuf,
    pub kind: ReferenceKind,
}

impl VariableReference {
    /// Content-line number, if this is a content reference.
    pub fn line(&self) -> Option<u32> {
        match self.kind {
            ReferenceKind::ContentLine(line) => Some(line),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("template root not found: {0}")]
    MissingRoot(PathBuf),
}

/// Scan a template tree for placeholder references.
///
/// Binary (non-UTF-8) and unreadable files contribute zero references rather
/// than failing the scan; their names are still scanned. The declaration
/// file at the template root is excluded so it cannot reference itself into
/// the lint report; a candidate-named file deeper in the tree is ordinary
/// template content.
pub fn scan_template(root: &Path) -> Result<Vec<VariableReference>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::MissingRoot(root.to_path_buf()));
    }

    let mut references = Vec::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                debug!(error = %err, "skipping unreadable entry");
                continue;
            }
        };

        let Some(base_name) = entry.file_name().to_str() else {
            debug!(path = %entry.path().display(), "skipping non-UTF-8 name");
            continue;
        };
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };

        if entry.file_type().is_dir() {
            collect_segment(base_name, relative, ReferenceKind::DirectoryName, &mut references);
        } else if entry.file_type().is_file() {
            if entry.depth() == 1 && is_declaration_file(base_name) {
                continue;
            }
            collect_segment(base_name, relative, ReferenceKind::FileName, &mut references);
            scan_content(entry.path(), relative, &mut references);
        }
    }

    Ok(references)
}

fn collect_segment(
    segment: &str,
    relative: &Path,
    kind: ReferenceKind,
    out: &mut Vec<VariableReference>,
) {
    for name in placeholder::parse_names(segment) {
        out.push(VariableReference { name, source_path: relative.to_path_buf(), kind });
    }
}

fn scan_content(path: &Path, relative: &Path, out: &mut Vec<VariableReference>) {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            debug!(path = %relative.display(), error = %err, "skipping content scan");
            return;
        }
    };

    for (idx, line) in content.lines().enumerate() {
        for name in placeholder::parse_names(line) {
            out.push(VariableReference {
                name,
                source_path: relative.to_path_buf(),
                kind: ReferenceKind::ContentLine((idx + 1) as u32),
            });
        }
    }
}
