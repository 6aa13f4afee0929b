//! Phase callbacks registered by customization scripts

use super::env::Environment;
use crate::error::{Error, Result};
use anyhow::Context;
use std::fmt;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;

/// When a hook runs during an expansion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Right before the first fill-in is presented
    BeforeFillIn,
    /// After every plain file has been copied
    AfterCopy,
    /// Once the fill-in queue is empty (or immediately, without fill-ins)
    Finalize,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::BeforeFillIn => "before-fill-in",
            Phase::AfterCopy => "after-copy",
            Phase::Finalize => "finalize",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// What a hook gets to see
#[derive(Debug, Clone, Copy)]
pub struct HookContext<'a> {
    pub source_root: &'a Path,
    pub destination_root: &'a Path,
    pub environment: &'a Environment,
}

type HookFn = dyn Fn(&HookContext<'_>) -> anyhow::Result<()> + Send + Sync;

/// A named callback
#[derive(Clone)]
pub struct Hook {
    name: String,
    run: Arc<HookFn>,
}

impl Hook {
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&HookContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            run: Arc::new(f),
        }
    }

    /// Run `command` through the shell inside the project root, with every
    /// environment binding exported
    pub fn command(command: impl Into<String>) -> Self {
        let command = command.into();
        let name = command.clone();
        Self::new(name, move |ctx| run_shell(&command, ctx))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, ctx: &HookContext<'_>) -> anyhow::Result<()> {
        (self.run)(ctx)
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook").field("name", &self.name).finish()
    }
}

fn run_shell(command: &str, ctx: &HookContext<'_>) -> anyhow::Result<()> {
    let (shell, flag) = if cfg!(windows) { ("cmd", "/C") } else { ("sh", "-c") };

    let mut cmd = Command::new(shell);
    cmd.arg(flag).arg(command).current_dir(ctx.destination_root);
    for (name, value) in ctx.environment.resolved() {
        cmd.env(name, value);
    }

    let status = cmd
        .status()
        .with_context(|| format!("Failed to run '{}'", command))?;
    if !status.success() {
        anyhow::bail!(
            "'{}' exited with code {}",
            command,
            status.code().unwrap_or(-1)
        );
    }
    Ok(())
}

/// Hook lists for every phase, in registration order
#[derive(Debug, Clone, Default)]
pub struct Hooks {
    before_fill_in: Vec<Hook>,
    after_copy: Vec<Hook>,
    finalize: Vec<Hook>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, phase: Phase, hook: Hook) {
        self.list_mut(phase).push(hook);
    }

    /// Append every hook of `other` after the ones already registered
    pub fn extend(&mut self, other: Hooks) {
        self.before_fill_in.extend(other.before_fill_in);
        self.after_copy.extend(other.after_copy);
        self.finalize.extend(other.finalize);
    }

    pub fn get(&self, phase: Phase) -> &[Hook] {
        match phase {
            Phase::BeforeFillIn => &self.before_fill_in,
            Phase::AfterCopy => &self.after_copy,
            Phase::Finalize => &self.finalize,
        }
    }

    /// Remove and return the hooks of `phase`
    pub fn take(&mut self, phase: Phase) -> Vec<Hook> {
        std::mem::take(self.list_mut(phase))
    }

    /// Run the hooks of `phase` in order; the first failure stops the rest
    pub fn run(&self, phase: Phase, ctx: &HookContext<'_>) -> Result<()> {
        run_all(phase, self.get(phase), ctx)
    }

    fn list_mut(&mut self, phase: Phase) -> &mut Vec<Hook> {
        match phase {
            Phase::BeforeFillIn => &mut self.before_fill_in,
            Phase::AfterCopy => &mut self.after_copy,
            Phase::Finalize => &mut self.finalize,
        }
    }
}

pub(crate) fn run_all(phase: Phase, hooks: &[Hook], ctx: &HookContext<'_>) -> Result<()> {
    for hook in hooks {
        tracing::debug!(phase = %phase, hook = hook.name(), "running hook");
        hook.call(ctx).map_err(|cause| Error::HookFailure {
            phase: phase.name(),
            name: hook.name().to_string(),
            cause,
        })?;
    }
    Ok(())
}
