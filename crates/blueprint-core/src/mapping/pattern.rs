//! Ignore patterns for pruning a mapping

use super::path::RelPath;
use crate::error::{Error, Result};
use glob::Pattern;

/// A pattern selecting mapping entries by source path
///
/// - `name` or `*.bak` matches any path component, so ignoring
///   `node_modules` drops everything below such a directory.
/// - `/docs/api` is rooted: it matches `docs/api` and everything under it.
#[derive(Debug, Clone)]
pub enum IgnorePattern {
    Basename(Pattern),
    Rooted(RelPath),
}

impl IgnorePattern {
    pub fn parse(input: &str) -> Result<Self> {
        if let Some(rooted) = input.strip_prefix('/') {
            let path = RelPath::parse(rooted)?;
            if path.is_root() {
                return Err(Error::InvalidPattern {
                    pattern: input.to_string(),
                    reason: "a rooted pattern must name a path".to_string(),
                });
            }
            return Ok(IgnorePattern::Rooted(path));
        }

        let trimmed = input.trim_end_matches('/');
        if trimmed.is_empty() || trimmed.contains('/') {
            return Err(Error::InvalidPattern {
                pattern: input.to_string(),
                reason: "use a single name, or prefix with '/' for a rooted path".to_string(),
            });
        }

        Pattern::new(trimmed)
            .map(IgnorePattern::Basename)
            .map_err(|e| Error::InvalidPattern {
                pattern: input.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn matches(&self, path: &RelPath) -> bool {
        match self {
            IgnorePattern::Basename(pattern) => {
                path.segments().iter().any(|segment| pattern.matches(segment))
            }
            IgnorePattern::Rooted(prefix) => path.starts_with(prefix),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> RelPath {
        RelPath::parse(s).unwrap()
    }

    #[test]
    fn test_basename_matches_any_component() {
        let pattern = IgnorePattern::parse("node_modules").unwrap();
        assert!(pattern.matches(&path("node_modules/left-pad/index.js")));
        assert!(pattern.matches(&path("web/node_modules/x.js")));
        assert!(!pattern.matches(&path("web/node_modules_old/x.js")));
    }

    #[test]
    fn test_basename_glob() {
        let pattern = IgnorePattern::parse("*.bak").unwrap();
        assert!(pattern.matches(&path("src/main.rs.bak")));
        assert!(!pattern.matches(&path("src/main.rs")));
    }

    #[test]
    fn test_rooted_is_prefix_match() {
        let pattern = IgnorePattern::parse("/docs").unwrap();
        assert!(pattern.matches(&path("docs/readme.md")));
        assert!(pattern.matches(&path("docs")));
        assert!(!pattern.matches(&path("src/docs/readme.md")));
        assert!(!pattern.matches(&path("docs-old/readme.md")));
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(IgnorePattern::parse("/").is_err());
        assert!(IgnorePattern::parse("a/b").is_err());
        assert!(IgnorePattern::parse("[").is_err());
    }
}
