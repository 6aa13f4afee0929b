//! Template discovery over `<root>/<category>/<name>/` directories

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A template found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRef {
    pub category: String,
    pub name: String,
    pub path: PathBuf,
}

impl TemplateRef {
    /// `category/name`, as accepted by [`find`]
    pub fn id(&self) -> String {
        format!("{}/{}", self.category, self.name)
    }
}

/// Templates grouped by category, both levels sorted by name
pub type Catalog = BTreeMap<String, Vec<TemplateRef>>;

/// Scan `roots` for templates. Earlier roots win on an equal `category/name`;
/// missing roots are skipped.
pub fn discover(roots: &[PathBuf]) -> Result<Catalog> {
    let mut catalog = Catalog::new();

    for root in roots {
        if !root.is_dir() {
            tracing::debug!(root = %root.display(), "template root does not exist");
            continue;
        }
        for (category, category_path) in visible_dirs(root)? {
            let templates = catalog.entry(category.clone()).or_default();
            for (name, path) in visible_dirs(&category_path)? {
                if templates.iter().any(|t| t.name == name) {
                    continue;
                }
                templates.push(TemplateRef {
                    category: category.clone(),
                    name,
                    path,
                });
            }
            templates.sort_by(|a, b| a.name.cmp(&b.name));
        }
    }

    catalog.retain(|_, templates| !templates.is_empty());
    Ok(catalog)
}

/// Resolve `category/name` in a catalog
pub fn find<'a>(catalog: &'a Catalog, id: &str) -> Option<&'a TemplateRef> {
    let (category, name) = id.split_once('/')?;
    catalog.get(category)?.iter().find(|t| t.name == name)
}

fn visible_dirs(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut dirs = Vec::new();
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to read {}", dir.display()))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || !entry.path().is_dir() {
            continue;
        }
        dirs.push((name, entry.path()));
    }
    dirs.sort();
    Ok(dirs)
}
