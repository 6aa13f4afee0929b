//! Charm-style CLI prompts using cliclack

use super::fill::PromptEngine;
use crate::script;
use crate::session::{FillInEngine, PlaceholderEngine, Step};
use crate::templates::{catalog, version, Expansion, TemplateRef};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const UPGRADE_COMMAND: &str = "cargo install blueprint --force";

/// CLI arguments for the create command
#[derive(Debug, Clone, Default)]
pub struct CreateArgs {
    /// Directories searched for `<category>/<name>` templates, earlier wins
    pub template_dirs: Vec<PathBuf>,

    /// Template to use, as `category/name`
    pub template: Option<String>,

    /// Project directory to create
    pub directory: Option<PathBuf>,

    /// Auto-confirm all prompts and fill placeholders with their defaults
    pub yes: bool,
}

/// Run the CLI with interactive prompts
pub async fn run(args: CreateArgs, cli_version: &str) -> Result<()> {
    cliclack::intro("blueprint")?;

    // Step 1: Select template
    let template = select_template(&args)?;

    // Check version compatibility
    if let Some(required) = script::load(&template.path)?
        .as_ref()
        .and_then(|s| s.version_requirement())
    {
        if let Some(warning) = version::check_compatibility(cli_version, required, UPGRADE_COMMAND)
        {
            cliclack::log::warning(format!(
                "Version warning: {}",
                warning.lines().next().unwrap_or(&warning)
            ))?;
        }
    }

    // Step 2: Select directory
    let project_dir = select_directory(&args)?;

    // Step 3: Expand
    let prompt_engine = Arc::new(PromptEngine::new());
    let engine: Arc<dyn FillInEngine> = if args.yes {
        Arc::new(PlaceholderEngine)
    } else {
        prompt_engine.clone()
    };
    let step = create_project(&template, &project_dir, engine).await?;

    // Step 4: Fill-ins
    drive_fill_ins(step, &prompt_engine, &project_dir, args.yes)?;

    // Step 5: Show next steps
    print_next_steps(&project_dir)?;

    Ok(())
}

fn select_template(args: &CreateArgs) -> Result<TemplateRef> {
    let spinner = cliclack::spinner();
    spinner.start("Loading templates...");

    let catalog = catalog::discover(&args.template_dirs)?;
    let mut templates: Vec<TemplateRef> = catalog.values().flatten().cloned().collect();

    // If a template was specified via --template flag, use it directly
    if let Some(id) = args.template.as_deref() {
        let Some(template) = catalog::find(&catalog, id) else {
            spinner.stop("Failed to load templates");
            let available: Vec<String> = templates.iter().map(TemplateRef::id).collect();
            anyhow::bail!(
                "Template '{}' not found. Available templates: {}",
                id,
                available.join(", ")
            );
        };
        spinner.stop(format!("Template: {}", template.id()));
        return Ok(template.clone());
    }

    spinner.stop("Templates loaded");

    if templates.len() <= 1 {
        let Some(template) = templates.pop() else {
            anyhow::bail!("No templates found.");
        };
        cliclack::log::info(format!("Using template: {}", template.id()))?;
        return Ok(template);
    }

    let mut select = cliclack::select("Select a template");
    for (idx, template) in templates.iter().enumerate() {
        select = select.item(idx, template.id(), template.path.display().to_string());
    }
    let selected_idx: usize = select.interact()?;

    Ok(templates.swap_remove(selected_idx))
}

fn select_directory(args: &CreateArgs) -> Result<PathBuf> {
    let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    // Use --directory flag if provided
    let path = if let Some(dir) = &args.directory {
        let p = current_dir.join(dir);
        cliclack::log::info(format!("Using directory: {}", p.display()))?;
        p
    } else {
        let input: String = cliclack::input("Project directory")
            .placeholder("my-project")
            .validate(|input: &String| {
                if input.trim().is_empty() {
                    Err("Please enter a directory name")
                } else {
                    Ok(())
                }
            })
            .interact()?;
        current_dir.join(input.trim())
    };

    // Validate parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.exists() && parent != Path::new("") {
            anyhow::bail!("Parent directory does not exist: {}", parent.display());
        }
    }

    // The project directory is always created fresh
    if path.exists() {
        anyhow::bail!("Directory already exists: {}", path.display());
    }

    Ok(path)
}

async fn create_project(
    template: &TemplateRef,
    project_dir: &Path,
    engine: Arc<dyn FillInEngine>,
) -> Result<Step> {
    let spinner = cliclack::spinner();
    spinner.start("Creating project...");

    let dropped = Arc::new(Mutex::new(Vec::new()));
    let sink = dropped.clone();
    let result = Expansion::new(&template.path, project_dir)
        .engine(engine)
        .on_duplicate(move |entry| {
            if let Ok(mut sink) = sink.lock() {
                sink.push(entry.source.to_string());
            }
        })
        .run()
        .await;

    let expanded = match result {
        Ok(expanded) => expanded,
        Err(e) => {
            spinner.stop("Failed to create project");
            return Err(e.into());
        }
    };

    let report = &expanded.report;
    spinner.stop(format!(
        "Created {} files in {}",
        report.copied.len(),
        project_dir.display()
    ));

    let dropped = dropped.lock().map(|d| d.clone()).unwrap_or_default();
    if !dropped.is_empty() {
        cliclack::log::warning(format!(
            "Skipped {} file(s) with a duplicate destination: {}",
            dropped.len(),
            dropped.join(", ")
        ))?;
    }
    if report.fill_ins > 0 {
        cliclack::log::info(format!("{} file(s) to fill in", report.fill_ins))?;
    }

    Ok(expanded.step)
}

fn drive_fill_ins(
    mut step: Step,
    engine: &PromptEngine,
    project_dir: &Path,
    auto_confirm: bool,
) -> Result<()> {
    while let Step::Presenting(surface) = step {
        // Placeholder engine already wrote the file
        if auto_confirm {
            step = surface.advance()?;
            continue;
        }

        let display = surface
            .destination()
            .strip_prefix(project_dir)
            .unwrap_or(surface.destination())
            .display()
            .to_string();
        let remaining = surface.session().pending();

        let mut select = cliclack::select(format!("Fill in {}", display))
            .item("now", "Fill in now", "");
        if remaining > 0 {
            select = select.item("later", "Later", format!("{} more queued", remaining));
        }
        let action: &str = select.interact()?;

        step = match action {
            "later" => surface.defer()?,
            _ => {
                engine.fill(&surface)?;
                cliclack::log::success(format!("Wrote {}", display))?;
                surface.advance()?
            }
        };
    }

    Ok(())
}

fn print_next_steps(project_dir: &Path) -> Result<()> {
    println!();
    println!("  Next steps");
    println!();
    println!("  1.  cd {}", project_dir.display());

    cliclack::outro("Happy building!")?;

    Ok(())
}
