//! Shared output formatting for preview-style reports.

use serde::Serialize;
use stencil_core::render::ProjectPreview;

/// Print the preview sections in a fixed order, skipping empty ones.
///
/// Paths are the pre-rename ones, so a reader can find every line in the
/// template as it exists on disk.
pub fn print_preview_sections(preview: &ProjectPreview) {
    if !preview.directory_preview.is_empty() {
        println!("directory change(s) ({})", preview.directory_preview.len());
        for (old, new) in &preview.directory_preview {
            println!("{} -> {}", old.display(), new.display());
        }
    }

    if !preview.file_preview.is_empty() {
        println!("file change(s) ({})", preview.file_preview.len());
        for (old, new) in &preview.file_preview {
            println!("{} -> {}", old.display(), new.display());
        }
    }

    if !preview.content_preview.is_empty() {
        println!("content change(s) ({})", preview.content_preview.len());
        for (path, changes) in &preview.content_preview {
            for change in changes {
                println!("{} line {}", path.display(), change.line);
                println!("- {}", change.raw);
                println!("+ {}", change.parsed);
            }
        }
    }
}

/// Print any report as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}
