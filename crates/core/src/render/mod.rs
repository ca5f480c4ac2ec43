//! Plan-then-commit template rendering.
//!
//! [`plan_render`] walks the tree once and stages every rename and content
//! rewrite the given values imply, validating staged target paths against
//! each other as it goes. [`preview_project`] reports the plan without
//! touching the tree; [`render_project`] refuses to start while any
//! placeholder is unresolved, then applies the plan parents-first so child
//! paths stay valid throughout.

pub mod types;

pub use types::{
    ContentChange, FileEdit, ProjectPreview, RenameOp, RenderError, RenderPlan, RenderSummary,
};

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::loader::is_declaration_file;
use crate::placeholder;
use crate::scan::{ReferenceKind, VariableReference};

/// Variable values keyed by declared name.
pub type ValueMap = HashMap<String, String>;

/// Stage every change `values` implies for the tree at `root`.
///
/// Fails on a staged path collision; unresolved placeholders are recorded
/// in the plan rather than failing, so callers choose how strict to be.
pub fn plan_render(root: &Path, values: &ValueMap) -> Result<RenderPlan, RenderError> {
    if !root.is_dir() {
        return Err(RenderError::MissingRoot(root.to_path_buf()));
    }

    let mut plan = RenderPlan::default();
    // Old relative directory path to its substituted path, so descendants
    // can splice renamed ancestors into their own targets.
    let mut dir_map: HashMap<PathBuf, PathBuf> = HashMap::new();

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
        let Ok(old_rel) = entry.path().strip_prefix(root) else {
            continue;
        };

        let parent_old = old_rel.parent().unwrap_or(Path::new(""));
        let parent_new =
            dir_map.get(parent_old).cloned().unwrap_or_else(|| parent_old.to_path_buf());

        if entry.file_type().is_dir() {
            let new_base = substitute_tracked(
                base_name,
                values,
                old_rel,
                ReferenceKind::DirectoryName,
                &mut plan.unresolved,
            );
            let new_rel = parent_new.join(new_base);
            dir_map.insert(old_rel.to_path_buf(), new_rel.clone());
            plan.directories.push(RenameOp { old_rel: old_rel.to_path_buf(), new_rel });
        } else if entry.file_type().is_file() {
            if entry.depth() == 1 && is_declaration_file(base_name) {
                continue;
            }
            let new_base = substitute_tracked(
                base_name,
                values,
                old_rel,
                ReferenceKind::FileName,
                &mut plan.unresolved,
            );
            let new_rel = parent_new.join(new_base);
            plan.files.push(RenameOp { old_rel: old_rel.to_path_buf(), new_rel });
            plan_content(entry.path(), old_rel, values, &mut plan.edits, &mut plan.unresolved);
        }
    }

    // Two staged paths landing on one target is unrecoverable, and that
    // includes a rename landing on a sibling that does not change.
    let mut targets: HashMap<PathBuf, PathBuf> = HashMap::new();
    for op in plan.directories.iter().chain(plan.files.iter()) {
        if let Some(first) = targets.insert(op.new_rel.clone(), op.old_rel.clone()) {
            return Err(RenderError::PathCollision {
                target: op.new_rel.clone(),
                first,
                second: op.old_rel.clone(),
            });
        }
    }

    Ok(plan)
}

/// Plan a render and report it without touching the tree.
///
/// Unresolved placeholders stay literal here, so they simply do not show
/// up as changes.
pub fn preview_project(root: &Path, values: &ValueMap) -> Result<ProjectPreview, RenderError> {
    Ok(plan_render(root, values)?.preview())
}

/// Apply a render to the tree at `root`.
///
/// Nothing is modified until the whole plan validates: an unresolved
/// placeholder or a path collision aborts before the first rename.
pub fn render_project(root: &Path, values: &ValueMap) -> Result<RenderSummary, RenderError> {
    let plan = plan_render(root, values)?;
    if let Some(reference) = plan.unresolved.first() {
        return Err(RenderError::UnresolvedPlaceholder {
            name: reference.name.clone(),
            path: reference.source_path.clone(),
        });
    }

    let mut summary = RenderSummary::default();
    for op in &plan.directories {
        if apply_rename(root, op)? {
            summary.directories_renamed += 1;
        }
    }
    for op in &plan.files {
        if apply_rename(root, op)? {
            summary.files_renamed += 1;
        }
    }

    let file_targets: HashMap<&Path, &Path> =
        plan.files.iter().map(|op| (op.old_rel.as_path(), op.new_rel.as_path())).collect();
    for edit in &plan.edits {
        // Renames are done, so the edit lands at the file's final path.
        let rel = file_targets.get(edit.old_rel.as_path()).copied().unwrap_or(&edit.old_rel);
        let target = root.join(rel);
        fs::write(&target, &edit.content)
            .map_err(|source| RenderError::Write { path: target.clone(), source })?;
        summary.files_rewritten += 1;
    }

    info!(
        directories = summary.directories_renamed,
        files = summary.files_renamed,
        rewritten = summary.files_rewritten,
        "rendered template"
    );
    Ok(summary)
}

fn substitute_tracked(
    input: &str,
    values: &ValueMap,
    source_path: &Path,
    kind: ReferenceKind,
    unresolved: &mut Vec<VariableReference>,
) -> String {
    for name in placeholder::parse_names(input) {
        if !values.contains_key(&name) {
            unresolved.push(VariableReference {
                name,
                source_path: source_path.to_path_buf(),
                kind,
            });
        }
    }
    placeholder::substitute(input, values)
}

fn plan_content(
    path: &Path,
    old_rel: &Path,
    values: &ValueMap,
    edits: &mut Vec<FileEdit>,
    unresolved: &mut Vec<VariableReference>,
) {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            debug!(path = %old_rel.display(), error = %err, "skipping content rewrite");
            return;
        }
    };

    let mut rendered = String::with_capacity(content.len());
    let mut changes = Vec::new();
    for (idx, piece) in content.split_inclusive('\n').enumerate() {
        let (body, terminator) = split_line_terminator(piece);
        let parsed = substitute_tracked(
            body,
            values,
            old_rel,
            ReferenceKind::ContentLine((idx + 1) as u32),
            unresolved,
        );
        if parsed != body {
            changes.push(ContentChange {
                line: (idx + 1) as u32,
                raw: body.to_string(),
                parsed: parsed.clone(),
            });
        }
        rendered.push_str(&parsed);
        rendered.push_str(terminator);
    }

    if !changes.is_empty() {
        edits.push(FileEdit { old_rel: old_rel.to_path_buf(), content: rendered, changes });
    }
}

fn split_line_terminator(piece: &str) -> (&str, &str) {
    if let Some(body) = piece.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = piece.strip_suffix('\n') {
        (body, "\n")
    } else {
        (piece, "")
    }
}

/// Rename one staged entry, resolving its current location through the
/// already-renamed ancestors. Returns whether a rename actually happened.
fn apply_rename(root: &Path, op: &RenameOp) -> Result<bool, RenderError> {
    let Some(old_base) = op.old_rel.file_name() else {
        return Ok(false);
    };
    let parent_new = op.new_rel.parent().unwrap_or(Path::new(""));
    let from = root.join(parent_new).join(old_base);
    let to = root.join(&op.new_rel);
    if from == to {
        return Ok(false);
    }
    fs::rename(&from, &to).map_err(|source| RenderError::Rename {
        from: from.clone(),
        to: to.clone(),
        source,
    })?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn values(pairs: &[(&str, &str)]) -> ValueMap {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn welcome_tree(root: &Path) {
        touch(
            &root.join("{{project_name}}/README.md"),
            "Welcome to {{project_name}}, version {{version}}.\n",
        );
    }

    #[test]
    fn test_preview_reports_all_three_change_kinds() {
        let tmp = TempDir::new().unwrap();
        welcome_tree(tmp.path());

        let preview = preview_project(
            tmp.path(),
            &values(&[("project_name", "widget"), ("version", "1.0")]),
        )
        .unwrap();

        let mut expected = ProjectPreview::default();
        expected
            .directory_preview
            .insert(PathBuf::from("{{project_name}}"), PathBuf::from("widget"));
        expected
            .file_preview
            .insert(PathBuf::from("{{project_name}}/README.md"), PathBuf::from("widget/README.md"));
        expected.content_preview.insert(
            PathBuf::from("{{project_name}}/README.md"),
            vec![ContentChange {
                line: 1,
                raw: "Welcome to {{project_name}}, version {{version}}.".into(),
                parsed: "Welcome to widget, version 1.0.".into(),
            }],
        );
        assert_eq!(preview, expected);
    }

    #[test]
    fn test_preview_leaves_tree_untouched() {
        let tmp = TempDir::new().unwrap();
        welcome_tree(tmp.path());

        preview_project(tmp.path(), &values(&[("project_name", "widget")])).unwrap();

        assert!(tmp.path().join("{{project_name}}/README.md").is_file());
        let content = fs::read_to_string(tmp.path().join("{{project_name}}/README.md")).unwrap();
        assert!(content.contains("{{version}}"));
    }

    #[test]
    fn test_preview_is_repeatable() {
        let tmp = TempDir::new().unwrap();
        welcome_tree(tmp.path());
        let vals = values(&[("project_name", "widget")]);

        let first = preview_project(tmp.path(), &vals).unwrap();
        let second = preview_project(tmp.path(), &vals).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_preview_without_values_is_empty() {
        let tmp = TempDir::new().unwrap();
        welcome_tree(tmp.path());

        let preview = preview_project(tmp.path(), &ValueMap::new()).unwrap();
        assert!(preview.is_empty());
    }

    #[test]
    fn test_commit_renders_in_place() {
        let tmp = TempDir::new().unwrap();
        welcome_tree(tmp.path());

        let summary = render_project(
            tmp.path(),
            &values(&[("project_name", "widget"), ("version", "1.0")]),
        )
        .unwrap();

        assert_eq!(summary.directories_renamed, 1);
        assert_eq!(summary.files_renamed, 0);
        assert_eq!(summary.files_rewritten, 1);
        assert!(!tmp.path().join("{{project_name}}").exists());
        let content = fs::read_to_string(tmp.path().join("widget/README.md")).unwrap();
        assert_eq!(content, "Welcome to widget, version 1.0.\n");
    }

    #[test]
    fn test_commit_refuses_unresolved_placeholder() {
        let tmp = TempDir::new().unwrap();
        welcome_tree(tmp.path());

        let err =
            render_project(tmp.path(), &values(&[("project_name", "widget")])).unwrap_err();
        match err {
            RenderError::UnresolvedPlaceholder { name, .. } => assert_eq!(name, "version"),
            other => panic!("unexpected error: {other:?}"),
        }

        // Nothing moved, nothing rewrote.
        assert!(tmp.path().join("{{project_name}}/README.md").is_file());
        let content = fs::read_to_string(tmp.path().join("{{project_name}}/README.md")).unwrap();
        assert_eq!(content, "Welcome to {{project_name}}, version {{version}}.\n");
    }

    #[test]
    fn test_collision_aborts_before_any_change() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("{{a}}.txt"), "staged\n");
        touch(&tmp.path().join("b.txt"), "already here\n");

        let err = render_project(tmp.path(), &values(&[("a", "b")])).unwrap_err();
        match err {
            RenderError::PathCollision { target, .. } => {
                assert_eq!(target, PathBuf::from("b.txt"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert_eq!(fs::read_to_string(tmp.path().join("{{a}}.txt")).unwrap(), "staged\n");
        assert_eq!(fs::read_to_string(tmp.path().join("b.txt")).unwrap(), "already here\n");
    }

    #[test]
    fn test_collision_also_fails_preview() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("{{a}}"), "");
        touch(&tmp.path().join("{{b}}"), "");

        let err = preview_project(tmp.path(), &values(&[("a", "same"), ("b", "same")]))
            .unwrap_err();
        assert!(matches!(err, RenderError::PathCollision { .. }));
    }

    #[test]
    fn test_nested_renames_apply_parent_first() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("{{outer}}/{{inner}}.txt"), "{{outer}}\n");

        let summary =
            render_project(tmp.path(), &values(&[("outer", "lib"), ("inner", "mod")])).unwrap();

        assert_eq!(summary.directories_renamed, 1);
        assert_eq!(summary.files_renamed, 1);
        assert_eq!(fs::read_to_string(tmp.path().join("lib/mod.txt")).unwrap(), "lib\n");
    }

    #[test]
    fn test_line_terminators_preserved() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("mixed.txt"), "one {{x}}\r\nlast {{x}}");

        let plan = plan_render(tmp.path(), &values(&[("x", "1")])).unwrap();
        assert_eq!(plan.edits.len(), 1);
        assert_eq!(plan.edits[0].changes[0].raw, "one {{x}}");
        assert_eq!(plan.edits[0].changes[0].parsed, "one 1");

        render_project(tmp.path(), &values(&[("x", "1")])).unwrap();
        assert_eq!(fs::read_to_string(tmp.path().join("mixed.txt")).unwrap(), "one 1\r\nlast 1");
    }

    #[test]
    fn test_declaration_file_left_alone() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join(".stencil.json"), "{\"template\": {\"variables\": {}}}\n");
        touch(&tmp.path().join("{{name}}.txt"), "");

        render_project(tmp.path(), &values(&[("name", "out")])).unwrap();

        assert!(tmp.path().join(".stencil.json").is_file());
        assert!(tmp.path().join("out.txt").is_file());
    }
}
