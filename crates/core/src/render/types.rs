//! Rendering plan, preview, and error types.

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::scan::VariableReference;

/// One staged rename, both sides relative to the render root.
///
/// `new_rel` carries substitution on every segment, so it differs from
/// `old_rel` whenever the entry itself or any ancestor directory renames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameOp {
    pub old_rel: PathBuf,
    pub new_rel: PathBuf,
}

impl RenameOp {
    pub fn is_noop(&self) -> bool {
        self.old_rel == self.new_rel
    }
}

/// One substituted content line, terminator excluded on both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentChange {
    /// 1-indexed line number.
    pub line: u32,
    pub raw: String,
    pub parsed: String,
}

/// One staged file rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEdit {
    /// Pre-rename path relative to the render root.
    pub old_rel: PathBuf,
    /// Full replacement content, line terminators preserved.
    pub content: String,
    pub changes: Vec<ContentChange>,
}

/// Everything one render pass would do, computed without touching the tree.
#[derive(Debug, Clone, Default)]
pub struct RenderPlan {
    /// Directory renames in pre-order, parents before children.
    pub directories: Vec<RenameOp>,
    /// File renames, in walk order. Entries whose parent renames are
    /// included even when the file's own name is unchanged.
    pub files: Vec<RenameOp>,
    /// Content rewrites keyed by pre-rename path, files with changes only.
    pub edits: Vec<FileEdit>,
    /// References whose variable has no value, in walk order.
    pub unresolved: Vec<VariableReference>,
}

impl RenderPlan {
    /// Sparse view of the plan: entries that actually change, nothing else.
    pub fn preview(&self) -> ProjectPreview {
        let mut preview = ProjectPreview::default();
        for op in &self.directories {
            if !op.is_noop() {
                preview.directory_preview.insert(op.old_rel.clone(), op.new_rel.clone());
            }
        }
        for op in &self.files {
            if !op.is_noop() {
                preview.file_preview.insert(op.old_rel.clone(), op.new_rel.clone());
            }
        }
        for edit in &self.edits {
            preview.content_preview.insert(edit.old_rel.clone(), edit.changes.clone());
        }
        preview
    }
}

/// What a render would change, keyed by pre-rename relative paths.
///
/// Unchanged entries never appear, so an empty preview means the values
/// leave the tree exactly as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectPreview {
    pub directory_preview: BTreeMap<PathBuf, PathBuf>,
    pub file_preview: BTreeMap<PathBuf, PathBuf>,
    pub content_preview: BTreeMap<PathBuf, Vec<ContentChange>>,
}

impl ProjectPreview {
    pub fn is_empty(&self) -> bool {
        self.directory_preview.is_empty()
            && self.file_preview.is_empty()
            && self.content_preview.is_empty()
    }

    /// Total previewed changes, counting each content line separately.
    pub fn change_count(&self) -> usize {
        self.directory_preview.len()
            + self.file_preview.len()
            + self.content_preview.values().map(Vec::len).sum::<usize>()
    }
}

/// Counts of applied filesystem operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub directories_renamed: usize,
    pub files_renamed: usize,
    pub files_rewritten: usize,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template root not found: {0}")]
    MissingRoot(PathBuf),
    #[error("path collision: `{first}` and `{second}` both render to `{target}`")]
    PathCollision { target: PathBuf, first: PathBuf, second: PathBuf },
    #[error("no value for `{{{{ {name} }}}}` referenced by {path}")]
    UnresolvedPlaceholder { name: String, path: PathBuf },
    #[error("failed to rename {from} to {to}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
