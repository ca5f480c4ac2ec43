//! `stn new`: instantiate a template into a fresh destination directory.
//!
//! The template tree is copied first and rendered second, so the source
//! template is never mutated. A failure after the copy removes the partial
//! destination rather than leaving a half-rendered tree behind.

use std::fs;
use std::path::{Path, PathBuf};

use stencil_core::config::loader::is_declaration_file;
use stencil_core::config::{TemplateConfig, loader};
use stencil_core::render::{RenderError, plan_render, render_project};
use tracing::debug;
use walkdir::WalkDir;

use crate::NewArgs;
use crate::cmd::{expand_path, output};
use crate::prompt::{self, PromptOptions};

pub fn run(args: NewArgs) {
    debug!("running new");
    let template = expand_path(&args.template);
    if !template.is_dir() {
        println!("FAIL stn new");
        println!("template root not found: {}", template.display());
        std::process::exit(1);
    }

    let config = match loader::resolve_declaration_path(&template) {
        Some(declaration) => match loader::load(&declaration) {
            Ok(config) => config,
            Err(e) => {
                println!("FAIL stn new");
                println!("{e}");
                std::process::exit(1);
            }
        },
        None => TemplateConfig::default(),
    };

    let config_issues = loader::validate(&config);
    if !config_issues.is_empty() {
        println!("FAIL stn new");
        for issue in &config_issues {
            println!("{} {}", issue.property, issue.reason);
        }
        std::process::exit(1);
    }

    let dest = match args.dest.as_deref() {
        Some(dest) => expand_path(dest),
        None => {
            let Some(base) = template.file_name() else {
                println!("FAIL stn new");
                println!(
                    "cannot derive a destination from {}: pass DEST explicitly",
                    template.display()
                );
                std::process::exit(1);
            };
            std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(base)
        }
    };
    if dest.exists() {
        println!("FAIL stn new");
        println!("destination already exists: {}", dest.display());
        std::process::exit(1);
    }
    // A destination under the template root would make the copy walk into
    // its own output.
    if resolve_unchecked(&dest).starts_with(resolve_unchecked(&template)) {
        println!("FAIL stn new");
        println!(
            "destination {} is inside the template {}",
            dest.display(),
            template.display()
        );
        std::process::exit(1);
    }

    let provided = match prompt::parse_var_args(&args.vars) {
        Ok(provided) => provided,
        Err(e) => {
            println!("FAIL stn new");
            println!("{e}");
            std::process::exit(1);
        }
    };
    for name in provided.keys() {
        if !config.variables().contains(name) {
            eprintln!("Warning: --var {name} does not match a declared variable");
        }
    }

    let options = PromptOptions { batch_mode: args.batch };
    let collected = match prompt::collect_values(config.variables(), &provided, &options) {
        Ok(collected) => collected,
        Err(e) => {
            println!("FAIL stn new");
            println!("{e}");
            std::process::exit(1);
        }
    };
    debug!(
        prompted = ?collected.prompted,
        defaulted = ?collected.defaulted,
        "collected values"
    );

    // Plan against the source tree before copying anything, so collisions
    // and unresolved placeholders surface while the filesystem is untouched.
    let plan = match plan_render(&template, &collected.values) {
        Ok(plan) => plan,
        Err(e) => {
            println!("FAIL stn new");
            println!("{e}");
            std::process::exit(1);
        }
    };

    if args.dry_run {
        output::print_preview_sections(&plan.preview());
        return;
    }

    if let Some(reference) = plan.unresolved.first() {
        let err = RenderError::UnresolvedPlaceholder {
            name: reference.name.clone(),
            path: reference.source_path.clone(),
        };
        println!("FAIL stn new");
        println!("{err}");
        println!("hint: run `stn lint` to list undeclared placeholders");
        std::process::exit(1);
    }

    if let Err(e) = fs::create_dir_all(&dest) {
        println!("FAIL stn new");
        println!("cannot create {}: {e}", dest.display());
        std::process::exit(1);
    }
    if let Err(message) = copy_template(&template, &dest) {
        println!("FAIL stn new");
        println!("{message}");
        let _ = fs::remove_dir_all(&dest);
        std::process::exit(1);
    }

    match render_project(&dest, &collected.values) {
        Ok(summary) => {
            println!("OK   stn new");
            println!("template: {}", template.display());
            println!("output:   {}", dest.display());
            println!(
                "renamed {} directory(ies), {} file(s); rewrote {} file(s)",
                summary.directories_renamed, summary.files_renamed, summary.files_rewritten
            );
        }
        Err(e) => {
            println!("FAIL stn new");
            println!("{e}");
            let _ = fs::remove_dir_all(&dest);
            std::process::exit(1);
        }
    }
}

/// Resolve a path that need not exist yet into an absolute, symlink-free
/// form by canonicalizing its closest existing ancestor.
fn resolve_unchecked(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join(path)
    };
    for ancestor in absolute.ancestors() {
        if ancestor.exists() {
            let Ok(rest) = absolute.strip_prefix(ancestor) else { break };
            let resolved =
                ancestor.canonicalize().unwrap_or_else(|_| ancestor.to_path_buf());
            return resolved.join(rest);
        }
    }
    absolute
}

/// Copy the template tree into `dest`, leaving the declaration file behind.
fn copy_template(template: &Path, dest: &Path) -> Result<(), String> {
    let walker = WalkDir::new(template)
        .min_depth(1)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()));
    for entry in walker {
        let entry =
            entry.map_err(|e| format!("cannot walk {}: {e}", template.display()))?;
        if entry.depth() == 1
            && entry.file_type().is_file()
            && is_declaration_file(entry.file_name().to_string_lossy().as_ref())
        {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(template)
            .map_err(|e| e.to_string())?;
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .map_err(|e| format!("cannot create {}: {e}", target.display()))?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| format!("cannot create {}: {e}", parent.display()))?;
            }
            fs::copy(entry.path(), &target)
                .map_err(|e| format!("cannot copy {}: {e}", entry.path().display()))?;
        }
    }
    Ok(())
}
