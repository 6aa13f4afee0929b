//! The `.blueprint.yaml` customization script format

use super::hooks::{Hook, Phase};
use super::{InitStep, Script};
use crate::error::{Error, Result};
use crate::mapping::SCRIPT_FILE;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A `from`/`to` pair used by the mapping steps
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathPair {
    pub from: String,
    pub to: String,
}

/// A script variable assignment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetVar {
    pub name: String,
    pub value: String,
}

/// One `init` step; exactly one field must be present
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InitStepFile {
    #[serde(default)]
    pub map: Option<PathPair>,

    #[serde(default)]
    pub remap: Option<PathPair>,

    #[serde(default)]
    pub remap_recursive: Option<PathPair>,

    #[serde(default)]
    pub ignore: Option<Vec<String>>,

    #[serde(default)]
    pub include: Option<Vec<String>>,

    #[serde(default)]
    pub include_override: Option<Vec<String>>,

    #[serde(default)]
    pub set: Option<SetVar>,
}

impl InitStepFile {
    fn into_step(self, index: usize) -> Result<InitStep> {
        let mut steps = Vec::new();
        if let Some(p) = self.map {
            steps.push(InitStep::Map(p.from, p.to));
        }
        if let Some(p) = self.remap {
            steps.push(InitStep::Remap(p.from, p.to));
        }
        if let Some(p) = self.remap_recursive {
            steps.push(InitStep::RemapRecursive(p.from, p.to));
        }
        if let Some(patterns) = self.ignore {
            steps.push(InitStep::Ignore(patterns));
        }
        if let Some(dirs) = self.include {
            steps.push(InitStep::Include(dirs));
        }
        if let Some(dirs) = self.include_override {
            steps.push(InitStep::IncludeOverride(dirs));
        }
        if let Some(s) = self.set {
            steps.push(InitStep::Set(s.name, s.value));
        }

        if steps.len() != 1 {
            return Err(Error::ScriptFailure(anyhow::anyhow!(
                "init step {} must contain exactly one operation, found {}",
                index + 1,
                steps.len()
            )));
        }
        Ok(steps.remove(0))
    }
}

/// A snippet-environment declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvFile {
    pub name: String,

    /// `${var}` expression; when absent the ambient value of `name` is used.
    ///
    /// Both forms resolve names against script variables, then the
    /// `source_directory`/`target_directory` bindings, then the process
    /// environment.
    #[serde(default)]
    pub value: Option<String>,
}

/// Parsed `.blueprint.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptFile {
    /// Minimum tool version the template was written for
    #[serde(default)]
    pub version: Option<String>,

    /// Patterns pruned before anything else runs
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Subdirectories flattened onto the template root
    #[serde(default)]
    pub subdirs: Vec<String>,

    #[serde(default)]
    pub init: Vec<InitStepFile>,

    /// Shell commands, run in the project directory
    #[serde(default)]
    pub before_fill_in: Vec<String>,

    #[serde(default)]
    pub after_copy: Vec<String>,

    #[serde(default)]
    pub finalize: Vec<String>,

    #[serde(default)]
    pub env: Vec<EnvFile>,
}

impl ScriptFile {
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|source| Error::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn into_script(self) -> Result<Script> {
        let mut script = Script::new();
        if let Some(version) = self.version {
            script = script.version(version);
        }
        for pattern in self.ignore {
            script = script.ignore(pattern);
        }
        for dir in self.subdirs {
            script = script.subdir(dir);
        }
        for (index, step) in self.init.into_iter().enumerate() {
            script = script.step(step.into_step(index)?);
        }
        for (phase, commands) in [
            (Phase::BeforeFillIn, self.before_fill_in),
            (Phase::AfterCopy, self.after_copy),
            (Phase::Finalize, self.finalize),
        ] {
            for command in commands {
                script = script.on(phase, Hook::command(command));
            }
        }
        for decl in self.env {
            script = script.env(decl.name, decl.value);
        }
        Ok(script)
    }
}

/// Load the customization script of the template at `source_root`, if any
pub fn load(source_root: &Path) -> Result<Option<Script>> {
    let path = source_root.join(SCRIPT_FILE);
    if !path.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
    let script = ScriptFile::parse(&content, &path)?.into_script()?;
    tracing::debug!(path = %path.display(), "loaded template script");
    Ok(Some(script))
}
