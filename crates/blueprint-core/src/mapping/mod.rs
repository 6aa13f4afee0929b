//! Template file mapping
//!
//! A [`Mapping`] is the ordered list of source → destination pairs for one
//! expansion. Sources are relative to the template root, destinations to the
//! project root. Scripts mutate it through the operations here; once frozen it
//! has unique destinations, resolved by [`Mapping::merge_override`].

pub mod discovery;
pub mod path;
pub mod pattern;

pub use discovery::{discover, is_fill_in, list_dir, SCRIPT_FILE};
pub use path::RelPath;
pub use pattern::IgnorePattern;

use std::collections::HashSet;

/// One source → destination pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MappingEntry {
    pub source: RelPath,
    pub destination: RelPath,
}

impl MappingEntry {
    pub fn new(source: RelPath, destination: RelPath) -> Self {
        Self {
            source,
            destination,
        }
    }

    /// Directory entries are created, never copied or filled in
    pub fn is_dir(&self) -> bool {
        self.source.is_dir()
    }
}

/// Ordered collection of mapping entries for one expansion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    entries: Vec<MappingEntry>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<MappingEntry>) -> Self {
        Self { entries }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MappingEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert `src → dst` unless the exact pair is already present.
    ///
    /// New entries go to the front, so the most recent explicit mapping wins
    /// when destinations are deduplicated.
    pub fn add(&mut self, source: RelPath, destination: RelPath) {
        let entry = MappingEntry::new(source, destination);
        if self.entries.contains(&entry) {
            return;
        }
        tracing::debug!(source = %entry.source, destination = %entry.destination, "map");
        self.entries.insert(0, entry);
    }

    /// Drop every entry whose source is `src`, then map `src → dst`.
    ///
    /// Remapping a directory entry keeps it a directory.
    pub fn remap(&mut self, source: RelPath, destination: RelPath) {
        let mut was_dir = false;
        self.entries.retain(|e| {
            let hit = e.source.same_location(&source);
            was_dir |= hit && e.is_dir();
            !hit
        });
        if was_dir {
            self.add(source.into_dir(), destination.into_dir());
        } else {
            self.add(source, destination);
        }
    }

    /// Move everything coming from, or landing in, `src_dir` to `dst_dir`.
    ///
    /// An entry whose destination lies under `src_dir` keeps its destination
    /// suffix. Otherwise, an entry whose source lies under `src_dir` is placed
    /// by its source suffix, with keep/fill markers stripped. Matching on the
    /// destination first is what lets swapping the arguments undo the move.
    pub fn remap_recursive(&mut self, src_dir: &RelPath, dst_dir: &RelPath) {
        for entry in &mut self.entries {
            let dir = entry.destination.is_dir();
            let rewritten = if let Some(rest) = entry.destination.strip_prefix(src_dir) {
                dst_dir.join(rest, dir)
            } else if let Some(rest) = entry.source.strip_prefix(src_dir) {
                let mut rest = rest.to_vec();
                if !dir {
                    if let Some(last) = rest.last_mut() {
                        *last = discovery::strip_markers(last).to_string();
                    }
                }
                dst_dir.join(&rest, dir)
            } else {
                continue;
            };
            tracing::debug!(
                source = %entry.source,
                from = %entry.destination,
                to = %rewritten,
                "remap"
            );
            entry.destination = rewritten;
        }
    }

    /// Remove every entry whose source matches any of `patterns`
    pub fn ignore(&mut self, patterns: &[IgnorePattern]) {
        self.entries.retain(|entry| {
            let ignored = patterns.iter().any(|p| p.matches(&entry.source));
            if ignored {
                tracing::debug!(source = %entry.source, "ignore");
            }
            !ignored
        });
    }

    /// Merge `listed` into this mapping; existing entries win collisions
    pub fn include(&mut self, listed: Mapping, on_dropped: impl FnMut(&MappingEntry)) {
        let current = std::mem::take(self);
        *self = Mapping::merge_override(listed, current, on_dropped);
    }

    /// Merge `listed` into this mapping; listed entries win collisions
    pub fn include_override(&mut self, listed: Mapping, on_dropped: impl FnMut(&MappingEntry)) {
        let current = std::mem::take(self);
        *self = Mapping::merge_override(current, listed, on_dropped);
    }

    /// Combine `base` with `overrides`.
    ///
    /// Entries are visited override-first, then base; an entry survives only if
    /// its destination has not been claimed by an earlier survivor. Every
    /// dropped entry is reported to `on_dropped`.
    pub fn merge_override(
        base: Mapping,
        overrides: Mapping,
        mut on_dropped: impl FnMut(&MappingEntry),
    ) -> Mapping {
        let mut claimed: HashSet<Vec<String>> = HashSet::new();
        let mut entries = Vec::with_capacity(overrides.len() + base.len());

        for entry in overrides.entries.into_iter().chain(base.entries) {
            if claimed.insert(entry.destination.segments().to_vec()) {
                entries.push(entry);
            } else if !entries.contains(&entry) {
                on_dropped(&entry);
            }
        }

        Mapping { entries }
    }

    /// Resolve duplicate destinations in place, keeping the first claimant
    pub fn dedup_destinations(&mut self, on_dropped: impl FnMut(&MappingEntry)) {
        let current = std::mem::take(self);
        *self = Mapping::merge_override(Mapping::new(), current, on_dropped);
    }
}

impl<'a> IntoIterator for &'a Mapping {
    type Item = &'a MappingEntry;
    type IntoIter = std::slice::Iter<'a, MappingEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> RelPath {
        RelPath::parse(s).unwrap()
    }

    fn mapping(pairs: &[(&str, &str)]) -> Mapping {
        Mapping::from_entries(
            pairs
                .iter()
                .map(|(s, d)| MappingEntry::new(p(s), p(d)))
                .collect(),
        )
    }

    fn pairs(m: &Mapping) -> Vec<(String, String)> {
        m.iter()
            .map(|e| (e.source.to_string(), e.destination.to_string()))
            .collect()
    }

    fn has_unique_destinations(m: &Mapping) -> bool {
        let mut seen = HashSet::new();
        m.iter()
            .all(|e| seen.insert(e.destination.segments().to_vec()))
    }

    #[test]
    fn test_add_skips_exact_duplicates() {
        let mut m = Mapping::new();
        m.add(p("a"), p("b"));
        m.add(p("a"), p("b"));
        m.add(p("a"), p("c"));
        assert_eq!(
            pairs(&m),
            vec![
                ("a".to_string(), "c".to_string()),
                ("a".to_string(), "b".to_string())
            ]
        );
    }

    #[test]
    fn test_latest_add_wins_on_dedup() {
        let mut m = mapping(&[("x.txt", "out.txt")]);
        m.add(p("y.txt"), p("out.txt"));
        let mut dropped = Vec::new();
        m.dedup_destinations(|e| dropped.push(e.source.to_string()));
        assert_eq!(pairs(&m), vec![("y.txt".to_string(), "out.txt".to_string())]);
        assert_eq!(dropped, vec!["x.txt"]);
    }

    #[test]
    fn test_remap_replaces_existing_source() {
        let mut m = mapping(&[("a.txt", "a.txt"), ("b.txt", "b.txt")]);
        m.remap(p("a.txt"), p("docs/a.md"));
        assert_eq!(
            pairs(&m),
            vec![
                ("a.txt".to_string(), "docs/a.md".to_string()),
                ("b.txt".to_string(), "b.txt".to_string())
            ]
        );
    }

    #[test]
    fn test_remap_matches_directory_boundary() {
        let mut m = mapping(&[("src/", "src/"), ("src/lib.rs", "src/lib.rs")]);
        m.remap(p("src"), p("lib"));
        assert_eq!(
            pairs(&m),
            vec![
                ("src/".to_string(), "lib/".to_string()),
                ("src/lib.rs".to_string(), "src/lib.rs".to_string())
            ]
        );
    }

    #[test]
    fn test_remap_recursive_moves_subtree() {
        let mut m = mapping(&[
            ("src/", "src/"),
            ("src/a.rs", "src/a.rs"),
            ("src/x/b.rs", "src/x/b.rs"),
            ("srcs/c.rs", "srcs/c.rs"),
        ]);
        m.remap_recursive(&p("src"), &p("lib"));
        assert_eq!(
            pairs(&m),
            vec![
                ("src/".to_string(), "lib/".to_string()),
                ("src/a.rs".to_string(), "lib/a.rs".to_string()),
                ("src/x/b.rs".to_string(), "lib/x/b.rs".to_string()),
                ("srcs/c.rs".to_string(), "srcs/c.rs".to_string()),
            ]
        );
    }

    #[test]
    fn test_remap_recursive_round_trip() {
        let original = mapping(&[
            ("tpl/a.txt.keep", "tpl/a.txt"),
            ("tpl/deep/b.txt", "tpl/deep/b.txt"),
        ]);
        let mut m = original.clone();
        m.remap_recursive(&p("tpl"), &p("out/here"));
        assert!(m.iter().all(|e| e.destination.starts_with(&p("out/here"))));
        assert_eq!(
            pairs(&m)[0],
            ("tpl/a.txt.keep".to_string(), "out/here/a.txt".to_string())
        );

        m.remap_recursive(&p("out/here"), &p("tpl"));
        assert_eq!(m, original);
    }

    #[test]
    fn test_remap_recursive_falls_back_to_source_suffix() {
        let mut m = mapping(&[("tpl/a.txt.fill", "elsewhere/a.txt")]);
        m.remap_recursive(&p("tpl"), &p("out"));
        assert_eq!(
            pairs(&m),
            vec![("tpl/a.txt.fill".to_string(), "out/a.txt".to_string())]
        );
    }

    #[test]
    fn test_ignore_prunes_matching_sources() {
        let mut m = mapping(&[
            ("docs/", "docs/"),
            ("docs/a.md", "docs/a.md"),
            ("src/a.bak", "src/a.bak"),
            ("src/a.rs", "src/a.rs"),
        ]);
        let patterns = vec![
            IgnorePattern::parse("/docs").unwrap(),
            IgnorePattern::parse("*.bak").unwrap(),
        ];
        m.ignore(&patterns);
        assert_eq!(pairs(&m), vec![("src/a.rs".to_string(), "src/a.rs".to_string())]);
    }

    #[test]
    fn test_merge_override_precedence() {
        let base = mapping(&[("a", "x"), ("b", "y"), ("c", "y")]);
        let overrides = mapping(&[("o", "y")]);
        let mut dropped = Vec::new();
        let merged = Mapping::merge_override(base, overrides, |e| dropped.push(e.source.to_string()));
        assert_eq!(
            pairs(&merged),
            vec![
                ("o".to_string(), "y".to_string()),
                ("a".to_string(), "x".to_string())
            ]
        );
        assert_eq!(dropped, vec!["b", "c"]);
        assert!(has_unique_destinations(&merged));
    }

    #[test]
    fn test_merge_with_self_is_identity() {
        let m = mapping(&[("a", "a"), ("b.keep", "b"), ("dir/", "dir/")]);
        let mut dropped = 0;
        let merged = Mapping::merge_override(m.clone(), m.clone(), |_| dropped += 1);
        assert_eq!(merged, m);
        assert_eq!(dropped, 0);

        let mut included = m.clone();
        included.include(m.clone(), |_| {});
        assert_eq!(included, m);
    }

    #[test]
    fn test_merge_dedups_colliding_overrides() {
        let overrides = mapping(&[("a", "same"), ("b", "same")]);
        let merged = Mapping::merge_override(mapping(&[("c", "same")]), overrides, |_| {});
        assert!(has_unique_destinations(&merged));
        assert_eq!(pairs(&merged), vec![("a".to_string(), "same".to_string())]);
    }

    #[test]
    fn test_include_vs_include_override() {
        let current = mapping(&[("readme.md", "readme.md")]);
        let listed = mapping(&[("shared/readme.md", "readme.md"), ("shared/ci.yml", "ci.yml")]);

        let mut included = current.clone();
        included.include(listed.clone(), |_| {});
        assert_eq!(
            pairs(&included),
            vec![
                ("readme.md".to_string(), "readme.md".to_string()),
                ("shared/ci.yml".to_string(), "ci.yml".to_string())
            ]
        );

        let mut overridden = current;
        overridden.include_override(listed, |_| {});
        assert_eq!(
            pairs(&overridden),
            vec![
                ("shared/readme.md".to_string(), "readme.md".to_string()),
                ("shared/ci.yml".to_string(), "ci.yml".to_string())
            ]
        );
    }
}
