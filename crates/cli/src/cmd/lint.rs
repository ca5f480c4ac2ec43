//! `stn lint`: check the declaration file against the template tree.

use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;
use stencil_core::config::loader;
use stencil_core::lint::{Classification, FixOutcome, LintIssue, classify, fix_declarations};
use stencil_core::scan::scan_template;
use tracing::debug;

use crate::LintArgs;
use crate::cmd::expand_path;

pub fn run(args: LintArgs) {
    debug!("running lint");
    let dir = expand_path(args.dir.as_deref().unwrap_or(Path::new(".")));

    let Some(declaration) = loader::resolve_declaration_path(&dir) else {
        println!("no declaration file found in {}: nothing to lint", dir.display());
        return;
    };

    let mut config = match loader::load(&declaration) {
        Ok(config) => config,
        Err(e) => {
            println!("FAIL stn lint");
            println!("{e}");
            std::process::exit(1);
        }
    };

    let config_issues = loader::validate(&config);
    if !config_issues.is_empty() {
        println!("FAIL stn lint");
        for issue in &config_issues {
            println!("{} {}", issue.property, issue.reason);
        }
        std::process::exit(1);
    }

    let references = match scan_template(&dir) {
        Ok(references) => references,
        Err(e) => {
            println!("FAIL stn lint");
            println!("{e}");
            std::process::exit(1);
        }
    };

    let mut classification = classify(&references, config.variables());
    let mut outcome = None;

    if args.fix && !classification.is_clean() {
        match fix_declarations(&classification, &mut config, &declaration) {
            Ok(fixed) => {
                // Report against the rewritten declaration.
                classification = classify(&references, config.variables());
                outcome = Some(fixed);
            }
            Err(e) => {
                println!("FAIL stn lint");
                println!("{e}");
                std::process::exit(1);
            }
        }
    }

    let issues = classification.issues(&declaration);

    if args.json {
        print_json(&declaration, &classification, outcome.as_ref(), &issues);
    } else if args.quiet {
        for issue in &issues {
            println!("{}", issue.location);
        }
    } else {
        print_text(&dir, &declaration, args.fix, outcome.as_ref(), &issues);
    }

    if !issues.is_empty() {
        std::process::exit(1);
    }
}

fn print_text(
    dir: &Path,
    declaration: &Path,
    fix_requested: bool,
    outcome: Option<&FixOutcome>,
    issues: &[LintIssue],
) {
    if let Some(outcome) = outcome {
        if issues.is_empty() {
            println!("OK   stn lint");
            println!("fixed {} / {} issue(s)", outcome.fixed(), outcome.before);
            return;
        }
        // A fix cannot declare every name; say what it had to leave open.
        println!("FAIL stn lint");
        println!("fixed {} / {} issue(s)", outcome.fixed(), outcome.before);
        for name in &outcome.skipped {
            println!("cannot declare `{name}`: not a valid identifier");
        }
        for issue in issues {
            println!("  {issue}");
        }
        return;
    }
    if fix_requested {
        println!("OK   stn lint");
        println!("no issue to fix in template {}", dir.display());
        return;
    }
    if issues.is_empty() {
        let declaration_name = declaration
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| declaration.display().to_string());
        println!("OK   stn lint");
        println!("{declaration_name}: no errors found");
        return;
    }

    println!("FAIL stn lint");
    for issue in issues {
        println!("  {issue}");
    }
    println!("you can fix these issues with stn lint --fix");
}

#[derive(Serialize)]
struct FixedOutput {
    added: Vec<String>,
    removed: Vec<String>,
    skipped: Vec<String>,
    fixed: usize,
    total: usize,
}

#[derive(Serialize)]
struct LintOutput<'a> {
    declaration: String,
    undeclared: Vec<&'a str>,
    unreferenced: Vec<&'a str>,
    issues: &'a [LintIssue],
    #[serde(skip_serializing_if = "Option::is_none")]
    fixed: Option<FixedOutput>,
}

fn print_json(
    declaration: &Path,
    classification: &Classification,
    outcome: Option<&FixOutcome>,
    issues: &[LintIssue],
) {
    let mut seen = HashSet::new();
    let undeclared: Vec<&str> = classification
        .undeclared
        .iter()
        .map(|reference| reference.name.as_str())
        .filter(|name| seen.insert(*name))
        .collect();

    let output = LintOutput {
        declaration: declaration.display().to_string(),
        undeclared,
        unreferenced: classification.unreferenced(),
        issues,
        fixed: outcome.map(|o| FixedOutput {
            added: o.added.clone(),
            removed: o.removed.clone(),
            skipped: o.skipped.clone(),
            fixed: o.fixed(),
            total: o.before,
        }),
    };
    println!("{}", serde_json::to_string_pretty(&output).unwrap_or_default());
}
