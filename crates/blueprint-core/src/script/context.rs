//! The capability surface handed to customization scripts

use super::env::{self, SOURCE_DIR_VAR, TARGET_DIR_VAR};
use crate::error::Result;
use crate::mapping::{self, IgnorePattern, Mapping, MappingEntry, RelPath};
use std::collections::BTreeMap;
use std::path::Path;

/// Callback observing entries dropped by a destination collision
pub type DroppedFn<'a> = dyn FnMut(&MappingEntry) + 'a;

/// Read access to both roots, full mapping mutation, and script variables.
///
/// Paths passed in are normalized before they reach the mapping.
pub struct ScriptContext<'a> {
    source_root: &'a Path,
    destination_root: &'a Path,
    mapping: &'a mut Mapping,
    vars: BTreeMap<String, String>,
    on_dropped: &'a mut DroppedFn<'a>,
}

impl<'a> ScriptContext<'a> {
    pub fn new(
        source_root: &'a Path,
        destination_root: &'a Path,
        mapping: &'a mut Mapping,
        on_dropped: &'a mut DroppedFn<'a>,
    ) -> Self {
        Self {
            source_root,
            destination_root,
            mapping,
            vars: BTreeMap::new(),
            on_dropped,
        }
    }

    pub fn source_root(&self) -> &Path {
        self.source_root
    }

    pub fn destination_root(&self) -> &Path {
        self.destination_root
    }

    pub fn mapping(&self) -> &Mapping {
        self.mapping
    }

    /// Map `src` (template-relative) to `dst` (project-relative)
    pub fn map(&mut self, src: &str, dst: &str) -> Result<()> {
        let (source, destination) = self.pair(src, dst)?;
        self.mapping.add(source, destination);
        Ok(())
    }

    pub fn remap(&mut self, src: &str, dst: &str) -> Result<()> {
        let (source, destination) = self.pair(src, dst)?;
        self.mapping.remap(source, destination);
        Ok(())
    }

    pub fn remap_recursive(&mut self, src_dir: &str, dst_dir: &str) -> Result<()> {
        let src_dir = RelPath::parse(src_dir)?;
        let dst_dir = RelPath::parse(dst_dir)?;
        self.mapping.remap_recursive(&src_dir, &dst_dir);
        Ok(())
    }

    pub fn ignore<S: AsRef<str>>(&mut self, patterns: &[S]) -> Result<()> {
        let patterns = patterns
            .iter()
            .map(|p| IgnorePattern::parse(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        self.mapping.ignore(&patterns);
        Ok(())
    }

    /// Add the files under each template directory, mapped relative to it.
    /// Entries already in the mapping win collisions.
    pub fn include<S: AsRef<str>>(&mut self, dirs: &[S]) -> Result<()> {
        for dir in dirs {
            let listed = mapping::list_dir(self.source_root, &RelPath::parse(dir.as_ref())?)?;
            self.mapping.include(listed, &mut *self.on_dropped);
        }
        Ok(())
    }

    /// Like [`include`](Self::include), but the listed files win collisions
    pub fn include_override<S: AsRef<str>>(&mut self, dirs: &[S]) -> Result<()> {
        for dir in dirs {
            let listed = mapping::list_dir(self.source_root, &RelPath::parse(dir.as_ref())?)?;
            self.mapping.include_override(listed, &mut *self.on_dropped);
        }
        Ok(())
    }

    /// Set a script-scoped variable, visible to later steps and `env` declarations
    pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Script variable, then root binding, then the process environment.
    ///
    /// The process environment is the only ambient source a script can read;
    /// it is how templates pick up values like `${USER}`.
    pub fn var(&self, name: &str) -> Option<String> {
        if let Some(value) = self.vars.get(name) {
            return Some(value.clone());
        }
        match name {
            SOURCE_DIR_VAR => Some(self.source_root.display().to_string()),
            TARGET_DIR_VAR => Some(self.destination_root.display().to_string()),
            _ => std::env::var(name).ok(),
        }
    }

    /// Expand `${name}` references using [`var`](Self::var)
    pub fn interpolate(&self, input: &str) -> anyhow::Result<String> {
        env::interpolate(input, |name| self.var(name))
            .map_err(|name| anyhow::anyhow!("variable '{}' is not bound", name))
    }

    // A source naming a template directory is mapped as a directory.
    fn pair(&self, src: &str, dst: &str) -> Result<(RelPath, RelPath)> {
        let mut source = RelPath::parse(src)?;
        let mut destination = RelPath::parse(dst)?;
        if !source.is_dir() && source.to_path(self.source_root).is_dir() {
            source = source.into_dir();
            destination = destination.into_dir();
        }
        Ok((source, destination))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn dests(m: &Mapping) -> Vec<String> {
        m.iter().map(|e| e.destination.to_string()).collect()
    }

    #[test]
    fn test_operations_normalize_paths() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("assets")).unwrap();
        let mut mapping = Mapping::new();
        let mut dropped = |_: &MappingEntry| {};
        let mut ctx = ScriptContext::new(dir.path(), Path::new("/out"), &mut mapping, &mut dropped);

        ctx.map("./notes//todo.txt", "docs/todo.txt").unwrap();
        ctx.map("assets", "static").unwrap();
        assert!(ctx.map("../escape", "x").is_err());

        assert_eq!(dests(ctx.mapping()), vec!["static/", "docs/todo.txt"]);
    }

    #[test]
    fn test_include_reports_collisions() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("shared")).unwrap();
        fs::write(dir.path().join("shared/readme.md"), "").unwrap();

        let mut mapping = Mapping::new();
        mapping.add(
            RelPath::parse("readme.md").unwrap(),
            RelPath::parse("readme.md").unwrap(),
        );
        let mut dropped = Vec::new();
        {
            let mut record = |e: &MappingEntry| dropped.push(e.source.to_string());
            let mut ctx =
                ScriptContext::new(dir.path(), Path::new("/out"), &mut mapping, &mut record);
            ctx.include(&["shared"]).unwrap();
        }
        assert_eq!(dropped, vec!["shared/readme.md"]);
        assert_eq!(dests(&mapping), vec!["readme.md"]);
    }

    #[test]
    fn test_var_lookup_order() {
        let mut mapping = Mapping::new();
        let mut dropped = |_: &MappingEntry| {};
        let mut ctx = ScriptContext::new(
            Path::new("/tpl"),
            Path::new("/out"),
            &mut mapping,
            &mut dropped,
        );
        assert_eq!(ctx.var(TARGET_DIR_VAR).as_deref(), Some("/out"));
        ctx.set_var(TARGET_DIR_VAR, "shadowed");
        assert_eq!(ctx.var(TARGET_DIR_VAR).as_deref(), Some("shadowed"));
        assert_eq!(
            ctx.interpolate("${source_directory}/x").unwrap(),
            "/tpl/x"
        );
        assert!(ctx.interpolate("${blueprint_surely_unbound_var}").is_err());
    }

    #[test]
    fn test_var_falls_back_to_process_env() {
        let mut mapping = Mapping::new();
        let mut dropped = |_: &MappingEntry| {};
        let mut ctx = ScriptContext::new(
            Path::new("/tpl"),
            Path::new("/out"),
            &mut mapping,
            &mut dropped,
        );
        assert_eq!(ctx.var("PATH"), std::env::var("PATH").ok());
        ctx.set_var("PATH", "/script/bin");
        assert_eq!(ctx.var("PATH").as_deref(), Some("/script/bin"));
    }
}
