//! `stn preview`: report what rendering would change, without touching
//! anything.

use std::path::Path;

use stencil_core::config::loader;
use stencil_core::render::preview_project;
use tracing::debug;

use crate::PreviewArgs;
use crate::cmd::{expand_path, output};
use crate::prompt::{self, PromptOptions};

pub fn run(args: PreviewArgs) {
    debug!("running preview");
    let dir = expand_path(args.dir.as_deref().unwrap_or(Path::new(".")));

    let Some(declaration) = loader::resolve_declaration_path(&dir) else {
        println!("no declaration file found in {}: nothing to preview", dir.display());
        return;
    };

    let config = match loader::load(&declaration) {
        Ok(config) => config,
        Err(e) => {
            println!("FAIL stn preview");
            println!("{e}");
            std::process::exit(1);
        }
    };

    let config_issues = loader::validate(&config);
    if !config_issues.is_empty() {
        println!("FAIL stn preview");
        for issue in &config_issues {
            println!("{} {}", issue.property, issue.reason);
        }
        std::process::exit(1);
    }

    let provided = match prompt::parse_var_args(&args.vars) {
        Ok(provided) => provided,
        Err(e) => {
            println!("FAIL stn preview");
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
    let collected =
        match prompt::collect_values_lenient(config.variables(), &provided, &options) {
            Ok(collected) => collected,
            Err(e) => {
                println!("FAIL stn preview");
                println!("{e}");
                std::process::exit(1);
            }
        };
    debug!(
        prompted = ?collected.prompted,
        defaulted = ?collected.defaulted,
        "collected values"
    );

    let preview = match preview_project(&dir, &collected.values) {
        Ok(preview) => preview,
        Err(e) => {
            println!("FAIL stn preview");
            println!("{e}");
            std::process::exit(1);
        }
    };

    if args.json {
        output::print_json(&preview);
    } else {
        output::print_preview_sections(&preview);
    }
}
