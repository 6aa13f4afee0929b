//! Template discovery, expansion, and version checks
//!
//! This module provides:
//! - Template catalogs built from one or more template roots
//! - The expansion orchestrator that turns a template into a project
//! - Version compatibility checking against a template's script

pub mod catalog;
pub mod expand;
pub mod version;

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

pub use catalog::{Catalog, TemplateRef};
pub use expand::{expand, ExpandReport, Expanded, Expansion};
pub use version::check_compatibility;

/// Print every template found under `roots`, grouped by category
pub fn print_catalog(roots: &[PathBuf]) -> Result<()> {
    let catalog = catalog::discover(roots)?;

    if catalog.is_empty() {
        let searched: Vec<String> = roots.iter().map(|r| r.display().to_string()).collect();
        eprintln!(
            "{} No templates found in {}",
            "Warning:".yellow(),
            searched.join(", ")
        );
        return Ok(());
    }

    let total: usize = catalog.values().map(Vec::len).sum();
    println!("{}", format!("{} template(s)", total).cyan().bold());

    for (category, templates) in &catalog {
        println!();
        println!("  {}", category.bold());
        for template in templates {
            let version = crate::script::load(&template.path)
                .ok()
                .flatten()
                .and_then(|s| s.version_requirement().map(str::to_string));
            match version {
                Some(v) => println!(
                    "    {} {} {}",
                    "->".blue(),
                    template.id(),
                    format!("(blueprint >= {})", v).dimmed()
                ),
                None => println!("    {} {}", "->".blue(), template.id()),
            }
        }
    }

    Ok(())
}
