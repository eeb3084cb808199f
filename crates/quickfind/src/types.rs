//! Core data types: discovered files, scored results, search patterns.

use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A file discovered by the scanner.
///
/// Holds the absolute path plus the display-relative suffix (the path
/// components after the session root, joined with `/`), cached once at
/// creation. Immutable thereafter; the relative suffix is shared so cloning
/// an item into a result set is cheap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileItem {
    path: PathBuf,
    relative: Arc<str>,
}

impl FileItem {
    /// Creates an item for `path` discovered under `root`.
    ///
    /// If `path` does not live under `root` (e.g. a symlink target), the full
    /// path is used as the display suffix instead.
    pub fn new(path: PathBuf, root: &Path) -> Self {
        let relative = match path.strip_prefix(root) {
            Ok(suffix) => display_string(suffix),
            Err(_) => display_string(&path),
        };
        Self {
            path,
            relative: relative.into(),
        }
    }

    /// The absolute path on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The display-relative suffix used for matching and presentation.
    pub fn relative(&self) -> &str {
        &self.relative
    }
}

/// Joins the normal path components with `/` regardless of platform
/// separator, dropping root and prefix components.
fn display_string(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        let std::path::Component::Normal(part) = component else {
            continue;
        };
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(&part.to_string_lossy());
    }
    out
}

/// A [`FileItem`] paired with its match score and highlight ranges.
///
/// Created fresh by every ranking pass; a new result set always replaces the
/// previous one wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredFileItem {
    pub item: FileItem,
    pub score: i64,
    /// Character-index ranges in the displayed relative path that matched the
    /// pattern. Presentation-only; empty for an empty pattern.
    pub highlights: Vec<Range<usize>>,
}

impl ScoredFileItem {
    pub fn new(item: FileItem, score: i64, highlights: Vec<Range<usize>>) -> Self {
        Self {
            item,
            score,
            highlights,
        }
    }

    /// Wraps an item for the unfiltered (empty pattern) listing.
    pub fn unscored(item: FileItem) -> Self {
        Self {
            item,
            score: 0,
            highlights: Vec::new(),
        }
    }
}

/// A normalized (trimmed) search pattern.
///
/// The empty pattern is a valid state meaning "unfiltered, unsorted listing".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pattern(String);

impl Pattern {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_suffix_strips_root() {
        let item = FileItem::new(PathBuf::from("/home/u/project/src/main.rs"), Path::new("/home/u/project"));
        assert_eq!(item.relative(), "src/main.rs");
        assert_eq!(item.path(), Path::new("/home/u/project/src/main.rs"));
    }

    #[test]
    fn relative_suffix_falls_back_to_full_path() {
        let item = FileItem::new(PathBuf::from("/elsewhere/a.txt"), Path::new("/home/u/project"));
        assert_eq!(item.relative(), "elsewhere/a.txt");
    }

    #[test]
    fn pattern_trims_whitespace() {
        assert_eq!(Pattern::new("  foo ").as_str(), "foo");
        assert!(Pattern::new("   ").is_empty());
        assert_eq!(Pattern::new("  foo "), Pattern::new("foo"));
    }
}
