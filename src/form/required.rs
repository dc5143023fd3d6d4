use std::collections::BTreeSet;

use crate::path::Path;

/// Dotted keys of errors written by required-field validation.
///
/// Removal is prefix based on whole segments: dropping `user` also drops
/// `user.name` and `user.0.city`, never `username`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredErrors {
    keys: BTreeSet<String>,
}

impl RequiredErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &Path) -> bool {
        self.keys.insert(path.join())
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.keys.contains(&path.join())
    }

    /// Removes `path` and every key nested under it. Returns the removed keys.
    pub fn remove_prefixed(&mut self, path: &Path) -> Vec<String> {
        let exact = path.join();
        let removed = self.nested_keys(&exact);
        for key in &removed {
            self.keys.remove(key);
        }
        removed
    }

    /// Keys at or under `base`, relative to it. The key of `base` itself comes
    /// back as the root path.
    pub fn suffixes_under(&self, base: &Path) -> Vec<Path> {
        let exact = base.join();
        self.nested_keys(&exact)
            .iter()
            .map(|key| match key.strip_prefix(&exact) {
                Some("") => Path::root(),
                Some(rest) => Path::from(rest.trim_start_matches('.')),
                None => Path::from(key.as_str()),
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    fn nested_keys(&self, exact: &str) -> Vec<String> {
        if exact.is_empty() {
            return self.keys.iter().cloned().collect();
        }
        let nested = format!("{exact}.");
        self.keys
            .range(exact.to_string()..)
            .take_while(|key| key.starts_with(exact))
            .filter(|key| key.as_str() == exact || key.starts_with(&nested))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;

    #[test]
    fn removes_whole_subtree_but_not_lookalikes() {
        let mut set = RequiredErrors::new();
        for key in ["a.b", "a.c", "a.d.e", "ab", "b"] {
            set.insert(&Path::from(key));
        }
        let mut removed = set.remove_prefixed(&path!["a"]);
        removed.sort();
        assert_eq!(removed, vec!["a.b", "a.c", "a.d.e"]);
        assert!(set.contains(&path!["ab"]));
        assert!(set.contains(&path!["b"]));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn suffixes_are_relative_to_the_base() {
        let mut set = RequiredErrors::new();
        set.insert(&path!["items", 0, "name"]);
        set.insert(&path!["items", 0]);
        set.insert(&path!["items", 10]);
        let suffixes = set.suffixes_under(&path!["items", 0]);
        assert_eq!(suffixes, vec![Path::root(), path!["name"]]);
    }

    #[test]
    fn root_prefix_clears_everything() {
        let mut set = RequiredErrors::new();
        set.insert(&path!["x"]);
        set.insert(&path!["y", "z"]);
        set.remove_prefixed(&Path::root());
        assert!(set.is_empty());
    }
}
