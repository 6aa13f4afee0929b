//! Template expansion: resolve the mapping, copy plain files, start fill-ins

use crate::error::{Error, Result};
use crate::mapping::{self, Mapping, MappingEntry};
use crate::script::env::{SOURCE_DIR_VAR, TARGET_DIR_VAR};
use crate::script::hooks::{HookContext, Phase};
use crate::script::{self, Script, ScriptContext, ScriptOutcome};
use crate::session::{FillInEngine, PendingFillIn, PlaceholderEngine, Session, Step};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

type DuplicateFn = dyn FnMut(&MappingEntry) + Send;

/// Summary of what an expansion wrote
#[derive(Debug, Clone, Default)]
pub struct ExpandReport {
    /// Directories created from directory entries
    pub directories: usize,
    /// Destination paths of plain copies, in mapping order
    pub copied: Vec<PathBuf>,
    /// Number of files queued for fill-in
    pub fill_ins: usize,
    /// Version requirement declared by the template script
    pub template_version: Option<String>,
}

/// Outcome of [`Expansion::run`]
#[derive(Debug)]
pub struct Expanded {
    pub report: ExpandReport,
    /// The first fill-in being presented, or `Finished` when there were none
    pub step: Step,
}

/// One expansion of a template directory into a new project directory
pub struct Expansion {
    source_root: PathBuf,
    destination_root: PathBuf,
    scripts: Vec<Script>,
    engine: Arc<dyn FillInEngine>,
    on_duplicate: Option<Box<DuplicateFn>>,
}

impl Expansion {
    pub fn new(source_root: impl Into<PathBuf>, destination_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            destination_root: destination_root.into(),
            scripts: Vec::new(),
            engine: Arc::new(PlaceholderEngine),
            on_duplicate: None,
        }
    }

    /// Add a script applied after the template's own `.blueprint.yaml`
    pub fn script(mut self, script: Script) -> Self {
        self.scripts.push(script);
        self
    }

    pub fn engine(mut self, engine: Arc<dyn FillInEngine>) -> Self {
        self.engine = engine;
        self
    }

    /// Observe entries dropped because another entry claimed their destination.
    /// Drops are always logged as warnings as well.
    pub fn on_duplicate(mut self, f: impl FnMut(&MappingEntry) + Send + 'static) -> Self {
        self.on_duplicate = Some(Box::new(f));
        self
    }

    /// Run the expansion.
    ///
    /// Fails with [`Error::DestinationExists`] before touching the filesystem
    /// if the project directory exists. A script, copy, or hook failure aborts
    /// the rest of the expansion; whatever was already written stays on disk.
    pub async fn run(mut self) -> Result<Expanded> {
        let source_root = self.source_root.clone();
        let destination_root = self.destination_root.clone();

        if fs::try_exists(&destination_root)
            .await
            .map_err(|e| Error::io(&destination_root, e))?
        {
            return Err(Error::DestinationExists {
                path: destination_root,
            });
        }
        fs::create_dir_all(&destination_root)
            .await
            .map_err(|e| Error::io(&destination_root, e))?;
        tracing::info!(
            source = %source_root.display(),
            destination = %destination_root.display(),
            "expanding template"
        );

        let (mapping, outcome, template_version) = self.resolve()?;

        let mut environment = outcome.environment;
        environment.push(SOURCE_DIR_VAR, source_root.display().to_string());
        environment.push(TARGET_DIR_VAR, destination_root.display().to_string());

        let mut report = ExpandReport {
            template_version,
            ..ExpandReport::default()
        };
        let fill_ins = copy_entries(&mapping, &source_root, &destination_root, &mut report).await?;
        report.fill_ins = fill_ins.len();

        let hooks = outcome.hooks;
        let ctx = HookContext {
            source_root: &source_root,
            destination_root: &destination_root,
            environment: &environment,
        };
        hooks.run(Phase::AfterCopy, &ctx)?;

        if fill_ins.is_empty() {
            hooks.run(Phase::Finalize, &ctx)?;
            tracing::info!(copied = report.copied.len(), "expansion complete");
            return Ok(Expanded {
                report,
                step: Step::Finished,
            });
        }

        hooks.run(Phase::BeforeFillIn, &ctx)?;
        tracing::info!(
            copied = report.copied.len(),
            fill_ins = report.fill_ins,
            "starting fill-ins"
        );
        let session = Session::new(
            fill_ins,
            environment,
            hooks,
            &source_root,
            &destination_root,
            self.engine.clone(),
        );
        let step = session.advance()?;
        Ok(Expanded { report, step })
    }

    // Discovery, the script pipeline, and destination deduplication.
    fn resolve(&mut self) -> Result<(Mapping, ScriptOutcome, Option<String>)> {
        let mut scripts = Vec::new();
        if let Some(own) = script::load(&self.source_root)? {
            scripts.push(own);
        }
        scripts.append(&mut self.scripts);
        let template_version = scripts
            .iter()
            .rev()
            .find_map(|s| s.version_requirement().map(str::to_string));

        let user = &mut self.on_duplicate;
        let mut on_dropped = |entry: &MappingEntry| {
            tracing::warn!(
                source = %entry.source,
                destination = %entry.destination,
                "dropping entry with duplicate destination"
            );
            if let Some(f) = user.as_mut() {
                f(entry);
            }
        };

        let mut mapping = mapping::discover(&self.source_root)?;
        let outcome = {
            let mut ctx = ScriptContext::new(
                &self.source_root,
                &self.destination_root,
                &mut mapping,
                &mut on_dropped,
            );
            script::run_pipeline(scripts, &mut ctx)?
        };
        mapping.dedup_destinations(&mut on_dropped);
        Ok((mapping, outcome, template_version))
    }
}

/// Expand `source_root` into `destination_root` with the defaults: the
/// template's own script and the non-interactive placeholder engine
pub async fn expand(source_root: &Path, destination_root: &Path) -> Result<Expanded> {
    Expansion::new(source_root, destination_root).run().await
}

/// Create directories, copy plain files, and collect fill-ins in discovery order
async fn copy_entries(
    mapping: &Mapping,
    source_root: &Path,
    destination_root: &Path,
    report: &mut ExpandReport,
) -> Result<Vec<PendingFillIn>> {
    let mut fill_ins = Vec::new();

    for entry in mapping {
        let source = entry.source.to_path(source_root);
        let target = entry.destination.to_path(destination_root);

        if entry.is_dir() {
            fs::create_dir_all(&target)
                .await
                .map_err(|e| Error::io(&target, e))?;
            report.directories += 1;
            continue;
        }

        // Only the containing directory is created for files.
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::io(parent, e))?;
        }

        if mapping::is_fill_in(&entry.source) {
            fill_ins.push(PendingFillIn {
                source,
                destination: target,
            });
            continue;
        }

        tracing::debug!(source = %entry.source, destination = %entry.destination, "copy");
        fs::copy(&source, &target)
            .await
            .map_err(|e| Error::io(&source, e))?;
        report.copied.push(target);
    }

    // Scripts reorder the mapping; fill-ins are queued in discovery order.
    fill_ins.sort_by(|a, b| a.source.cmp(&b.source));
    Ok(fill_ins)
}
