//! Template file discovery and the default auto-mapping rule

use super::path::RelPath;
use super::{Mapping, MappingEntry};
use crate::error::{Error, Result};
use std::path::Path;
use walkdir::WalkDir;

/// Reserved customization script at the template root
pub const SCRIPT_FILE: &str = ".blueprint.yaml";

/// Marker stripped from the destination name on copy
pub const KEEP_EXT: &str = ".keep";

/// Marker excluding a file from the auto-mapping
pub const NOCOPY_EXT: &str = ".nocopy";

/// Marker queueing a file for interactive fill-in
pub const FILL_EXT: &str = ".fill";

/// Destination name for a discovered file, or `None` if it is never copied
pub fn auto_map_name(name: &str) -> Option<&str> {
    if marker_stem(name, NOCOPY_EXT).is_some() {
        return None;
    }
    Some(strip_markers(name))
}

/// Strip the keep/fill marker, leaving any other name untouched
pub fn strip_markers(name: &str) -> &str {
    marker_stem(name, KEEP_EXT)
        .or_else(|| marker_stem(name, FILL_EXT))
        .unwrap_or(name)
}

/// Whether the source file must go through the fill-in engine
pub fn is_fill_in(source: &RelPath) -> bool {
    !source.is_dir()
        && source
            .file_name()
            .is_some_and(|name| marker_stem(name, FILL_EXT).is_some())
}

// A bare ".keep" is a regular dotfile, not a marker on an empty name.
fn marker_stem<'a>(name: &'a str, marker: &str) -> Option<&'a str> {
    name.strip_suffix(marker).filter(|stem| !stem.is_empty())
}

/// Walk `source_root` and build the initial mapping.
///
/// Directories map to themselves so empty ones survive the copy. Symlinks
/// are followed. The customization script and `.nocopy` files are left out.
pub fn discover(source_root: &Path) -> Result<Mapping> {
    let script = RelPath::parse(SCRIPT_FILE)?;
    let mut entries = Vec::new();

    for entry in walk(source_root) {
        let entry = entry?;
        let is_dir = entry.file_type().is_dir();
        let source = relative(source_root, entry.path(), is_dir)?;

        if is_dir {
            entries.push(MappingEntry::new(source.clone(), source));
            continue;
        }
        if source.same_location(&script) {
            continue;
        }

        let Some(name) = source.file_name() else {
            continue;
        };
        if let Some(dest_name) = auto_map_name(name) {
            let destination = source.with_file_name(dest_name);
            entries.push(MappingEntry::new(source, destination));
        }
    }

    tracing::debug!(
        root = %source_root.display(),
        entries = entries.len(),
        "discovered template files"
    );
    Ok(Mapping::from_entries(entries))
}

/// List every file under `dir`, mapped relative to `dir` itself.
///
/// Unlike [`discover`], nothing is excluded: the script file and `.nocopy`
/// files are listed too. Only the keep/fill markers are stripped.
pub fn list_dir(source_root: &Path, dir: &RelPath) -> Result<Mapping> {
    let base = dir.to_path(source_root);
    if !base.is_dir() {
        return Err(Error::invalid_path(
            &dir.to_string(),
            "not a directory in the template",
        ));
    }

    let mut entries = Vec::new();
    for entry in walk(&base) {
        let entry = entry?;
        if entry.file_type().is_dir() {
            continue;
        }
        let local = relative(&base, entry.path(), false)?;
        let source = dir.join(local.segments(), false);
        let destination = match local.file_name() {
            Some(name) => local.with_file_name(strip_markers(name)),
            None => continue,
        };
        entries.push(MappingEntry::new(source, destination));
    }
    Ok(Mapping::from_entries(entries))
}

fn walk(root: &Path) -> impl Iterator<Item = Result<walkdir::DirEntry>> + '_ {
    WalkDir::new(root)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .map(move |entry| {
            entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
                Error::io(path, source)
            })
        })
}

fn relative(root: &Path, path: &Path, is_dir: bool) -> Result<RelPath> {
    let rel = path
        .strip_prefix(root)
        .map_err(|_| Error::invalid_path(&path.to_string_lossy(), "outside of the template"))?;
    RelPath::from_relative(rel, is_dir)
}
