use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// An ordered sequence of keys from a root value.
pub type Path = Vec<String>;

/// Insertion-ordered set of paths. Duplicates are rejected on insert, so
/// iteration yields each path once, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Path>", into = "Vec<Path>")]
pub struct PathSet {
    paths: Vec<Path>,
    seen: HashSet<Path>,
}

impl PathSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `path` unless an element-wise equal path is already present.
    /// Returns whether the path was new.
    pub fn insert(&mut self, path: Path) -> bool {
        if self.seen.contains(&path) {
            return false;
        }
        self.seen.insert(path.clone());
        self.paths.push(path);
        true
    }

    pub fn contains(&self, path: &[String]) -> bool {
        self.seen.contains(path)
    }

    /// Set-union with `other`, keeping this set's order and appending unseen
    /// paths in `other`'s order.
    pub fn union(&mut self, other: &PathSet) {
        for path in &other.paths {
            self.insert(path.clone());
        }
    }

    /// True if some path in the set extends `prefix` by at least one key.
    pub fn has_descendant_of(&self, prefix: &[String]) -> bool {
        self.paths
            .iter()
            .any(|path| path.len() > prefix.len() && path.starts_with(prefix))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Path> {
        self.paths.iter()
    }

    pub fn as_slice(&self) -> &[Path] {
        &self.paths
    }

    pub fn into_vec(self) -> Vec<Path> {
        self.paths
    }
}

impl From<Vec<Path>> for PathSet {
    fn from(paths: Vec<Path>) -> Self {
        paths.into_iter().collect()
    }
}

impl From<PathSet> for Vec<Path> {
    fn from(set: PathSet) -> Self {
        set.paths
    }
}

impl FromIterator<Path> for PathSet {
    fn from_iter<I: IntoIterator<Item = Path>>(iter: I) -> Self {
        let mut set = PathSet::new();
        for path in iter {
            set.insert(path);
        }
        set
    }
}

impl<'a> IntoIterator for &'a PathSet {
    type Item = &'a Path;
    type IntoIter = std::slice::Iter<'a, Path>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}
