//! Canonical addressing for field positions in the schema tree.
//!
//! A [`Path`] is an ordered list of field-name segments plus a string key
//! derived by joining the segments with [`SEPARATOR`]. The key is what every
//! map in the engine is indexed by. Segments must never contain the
//! separator; this is not checked and a violating segment silently corrupts
//! addressing.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Joins segments into a registry key. Not allowed inside a segment.
pub const SEPARATOR: &str = "$hyphen$";

/// Address of one field: its segment chain and the derived key.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Arc<[String]>,
    key: Arc<str>,
}

impl Path {
    /// Build a path from segments. Prefer [`PathRegistry::register`] so that
    /// equal segment chains share one instance.
    pub fn new<S: AsRef<str>>(segments: &[S]) -> Self {
        let segments: Vec<String> = segments.iter().map(|s| s.as_ref().to_string()).collect();
        let key = Self::parse(&segments);
        Self {
            segments: segments.into(),
            key: key.into(),
        }
    }

    /// Parse a dotted reference such as `"address.city"`.
    pub fn from_dotted(dotted: &str) -> Self {
        let segments = dotted_segments(dotted);
        Self::new(&segments)
    }

    /// Join segments into a key.
    pub fn parse<S: AsRef<str>>(segments: &[S]) -> String {
        segments
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(SEPARATOR)
    }

    /// Split a key back into its segments. Inverse of [`Path::parse`].
    pub fn revert(key: &str) -> Vec<String> {
        if key.is_empty() {
            return Vec::new();
        }
        key.split(SEPARATOR).map(str::to_string).collect()
    }

    /// Raw segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Identity key used by every registry.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The segments joined with `.`, as used in value objects.
    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }

    /// Field name of the last segment.
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// A child path with `segment` appended.
    pub fn child(&self, segment: &str) -> Self {
        let mut segments = self.segments.to_vec();
        segments.push(segment.to_string());
        Self::new(&segments)
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Path").field(&self.dotted()).finish()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted())
    }
}

/// Split a dotted template reference into trimmed segments.
pub fn dotted_segments(dotted: &str) -> Vec<String> {
    dotted
        .trim()
        .split('.')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Session-scoped map from key to the single [`Path`] instance for it.
#[derive(Debug, Default)]
pub struct PathRegistry {
    paths: HashMap<Arc<str>, Path>,
}

impl PathRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing path for these segments, if it was registered before.
    pub fn resolve<S: AsRef<str>>(&self, segments: &[S]) -> Option<Path> {
        self.paths.get(Path::parse(segments).as_str()).cloned()
    }

    /// Existing path for a key.
    pub fn resolve_key(&self, key: &str) -> Option<Path> {
        self.paths.get(key).cloned()
    }

    /// Return the registered path for `segments`, creating it on first use.
    pub fn register<S: AsRef<str>>(&mut self, segments: &[S]) -> Path {
        if let Some(existing) = self.resolve(segments) {
            return existing;
        }
        let path = Path::new(segments);
        self.paths.insert(path.key.clone(), path.clone());
        path
    }

    /// Number of interned paths.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether no path has been interned.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Forget every path.
    pub fn clear(&mut self) {
        self.paths.clear();
    }
}
