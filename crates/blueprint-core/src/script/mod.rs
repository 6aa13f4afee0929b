//! Template customization scripts
//!
//! A script is a set of declarations grouped by phase. However the
//! declarations were written, [`run_pipeline`] applies them in a fixed order:
//!
//! 1. ignore patterns
//! 2. subdirectories flattened onto the template root
//! 3. init steps (mapping mutations, variable assignments, custom code)
//! 4. phase hooks
//! 5. snippet-environment declarations
//!
//! Several scripts compose by concatenating each phase in order.

pub mod context;
pub mod env;
pub mod file;
pub mod hooks;

pub use context::ScriptContext;
pub use env::Environment;
pub use file::{load, ScriptFile};
pub use hooks::{Hook, HookContext, Hooks, Phase};

use crate::error::{Error, Result};
use anyhow::Context;
use std::fmt;
use std::sync::Arc;

type InitFn = dyn Fn(&mut ScriptContext<'_>) -> anyhow::Result<()> + Send + Sync;

/// One statement of the free-form init phase
#[derive(Clone)]
pub enum InitStep {
    /// `from`/`to` may reference `${var}`s
    Map(String, String),
    Remap(String, String),
    RemapRecursive(String, String),
    Ignore(Vec<String>),
    Include(Vec<String>),
    IncludeOverride(Vec<String>),
    /// Assign a script variable; the value may reference `${var}`s
    Set(String, String),
    /// Arbitrary code with full access to the script context
    Custom(Arc<InitFn>),
}

impl InitStep {
    fn apply(&self, ctx: &mut ScriptContext<'_>) -> anyhow::Result<()> {
        match self {
            InitStep::Map(from, to) => {
                let (from, to) = (ctx.interpolate(from)?, ctx.interpolate(to)?);
                ctx.map(&from, &to)?
            }
            InitStep::Remap(from, to) => {
                let (from, to) = (ctx.interpolate(from)?, ctx.interpolate(to)?);
                ctx.remap(&from, &to)?
            }
            InitStep::RemapRecursive(from, to) => {
                let (from, to) = (ctx.interpolate(from)?, ctx.interpolate(to)?);
                ctx.remap_recursive(&from, &to)?
            }
            InitStep::Ignore(patterns) => ctx.ignore(patterns)?,
            InitStep::Include(dirs) => ctx.include(dirs)?,
            InitStep::IncludeOverride(dirs) => ctx.include_override(dirs)?,
            InitStep::Set(name, value) => {
                let value = ctx.interpolate(value)?;
                ctx.set_var(name.clone(), value);
            }
            InitStep::Custom(f) => f(ctx)?,
        }
        Ok(())
    }
}

impl fmt::Debug for InitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitStep::Map(a, b) => write!(f, "Map({a:?}, {b:?})"),
            InitStep::Remap(a, b) => write!(f, "Remap({a:?}, {b:?})"),
            InitStep::RemapRecursive(a, b) => write!(f, "RemapRecursive({a:?}, {b:?})"),
            InitStep::Ignore(p) => write!(f, "Ignore({p:?})"),
            InitStep::Include(d) => write!(f, "Include({d:?})"),
            InitStep::IncludeOverride(d) => write!(f, "IncludeOverride({d:?})"),
            InitStep::Set(n, v) => write!(f, "Set({n:?}, {v:?})"),
            InitStep::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// A snippet-environment variable declaration
#[derive(Debug, Clone)]
pub struct EnvDecl {
    pub name: String,
    pub value: Option<String>,
}

/// Declarations of one customization script
#[derive(Debug, Clone, Default)]
pub struct Script {
    version: Option<String>,
    ignore: Vec<String>,
    subdirs: Vec<String>,
    init: Vec<InitStep>,
    hooks: Hooks,
    env: Vec<EnvDecl>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn ignore(mut self, pattern: impl Into<String>) -> Self {
        self.ignore.push(pattern.into());
        self
    }

    pub fn subdir(mut self, dir: impl Into<String>) -> Self {
        self.subdirs.push(dir.into());
        self
    }

    pub fn step(mut self, step: InitStep) -> Self {
        self.init.push(step);
        self
    }

    pub fn init<F>(self, f: F) -> Self
    where
        F: Fn(&mut ScriptContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.step(InitStep::Custom(Arc::new(f)))
    }

    pub fn on(mut self, phase: Phase, hook: Hook) -> Self {
        self.hooks.register(phase, hook);
        self
    }

    /// Declare `name` for the fill-in environment; `None` takes its ambient value
    pub fn env(mut self, name: impl Into<String>, value: Option<String>) -> Self {
        self.env.push(EnvDecl {
            name: name.into(),
            value,
        });
        self
    }

    /// Append every declaration of `other` after this script's own
    pub fn extend(&mut self, other: Script) {
        if other.version.is_some() {
            self.version = other.version;
        }
        self.ignore.extend(other.ignore);
        self.subdirs.extend(other.subdirs);
        self.init.extend(other.init);
        self.hooks.extend(other.hooks);
        self.env.extend(other.env);
    }

    pub fn version_requirement(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn ignore_patterns(&self) -> &[String] {
        &self.ignore
    }

    pub fn subdirs(&self) -> &[String] {
        &self.subdirs
    }

    pub fn init_steps(&self) -> &[InitStep] {
        &self.init
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    pub fn env_decls(&self) -> &[EnvDecl] {
        &self.env
    }
}

/// What the pipeline hands to the orchestrator
#[derive(Debug, Default)]
pub struct ScriptOutcome {
    pub hooks: Hooks,
    /// Declared snippet variables, in declaration order
    pub environment: Environment,
}

/// Apply `scripts` to the context's mapping in pipeline order.
///
/// Any failure is reported as [`Error::ScriptFailure`]; the mapping is left
/// in whatever state the failing step produced.
pub fn run_pipeline(scripts: Vec<Script>, ctx: &mut ScriptContext<'_>) -> Result<ScriptOutcome> {
    let mut merged = Script::new();
    for script in scripts {
        merged.extend(script);
    }

    apply(merged, ctx).map_err(Error::ScriptFailure)
}

fn apply(script: Script, ctx: &mut ScriptContext<'_>) -> anyhow::Result<ScriptOutcome> {
    ctx.ignore(&script.ignore).context("ignore")?;

    if !script.subdirs.is_empty() {
        let rooted: Vec<String> = script.subdirs.iter().map(|d| format!("/{}", d)).collect();
        ctx.ignore(&rooted).context("subdirs")?;
        // Later subdirectories win, and the root template wins over all of them.
        for dir in script.subdirs.iter().rev() {
            ctx.include(std::slice::from_ref(dir))
                .with_context(|| format!("subdir '{}'", dir))?;
        }
    }

    for (index, step) in script.init.iter().enumerate() {
        step.apply(ctx)
            .with_context(|| format!("init step {} ({:?})", index + 1, step))?;
    }

    let mut environment = Environment::new();
    for decl in &script.env {
        let value = match &decl.value {
            Some(expr) => ctx
                .interpolate(expr)
                .with_context(|| format!("env '{}'", decl.name))?,
            None => ctx
                .var(&decl.name)
                .with_context(|| format!("env '{}': variable is not bound", decl.name))?,
        };
        environment.push(decl.name.clone(), value);
    }

    Ok(ScriptOutcome {
        hooks: script.hooks,
        environment,
    })
}
