mod ops;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use ops::{get_in, merge_shallow, set_in, unset_in};

/// One step into a nested value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

impl PathSegment {
    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathSegment::Index(idx) => Some(*idx),
            PathSegment::Key(key) => key.parse().ok(),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(idx) => write!(f, "{idx}"),
            PathSegment::Key(key) => f.write_str(key),
        }
    }
}

impl From<usize> for PathSegment {
    fn from(idx: usize) -> Self {
        PathSegment::Index(idx)
    }
}

impl From<i32> for PathSegment {
    fn from(idx: i32) -> Self {
        if idx >= 0 {
            PathSegment::Index(idx as usize)
        } else {
            PathSegment::Key(idx.to_string())
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<&String> for PathSegment {
    fn from(key: &String) -> Self {
        PathSegment::Key(key.clone())
    }
}

/// Ordered sequence of keys addressing a location inside a [`crate::FormValue`].
///
/// The dotted rendering (`items.0.name`) is the cache key for reads and the
/// key stored in [`crate::form::RequiredErrors`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<PathSegment>);

impl Path {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn join(&self) -> String {
        self.to_string()
    }

    pub fn child(&self, segment: impl Into<PathSegment>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    pub fn parent(&self) -> Option<Path> {
        let (_, head) = self.0.split_last()?;
        Some(Self(head.to_vec()))
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, segment) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl From<&str> for Path {
    /// Parses a dotted path. Purely numeric parts become indices.
    fn from(dotted: &str) -> Self {
        if dotted.is_empty() {
            return Path::root();
        }
        Self(
            dotted
                .split('.')
                .map(|part| match part.parse::<usize>() {
                    Ok(idx) => PathSegment::Index(idx),
                    Err(_) => PathSegment::Key(part.to_string()),
                })
                .collect(),
        )
    }
}

impl From<Vec<PathSegment>> for Path {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

impl From<&Path> for Path {
    fn from(path: &Path) -> Self {
        path.clone()
    }
}

impl<S: Into<PathSegment>> FromIterator<S> for Path {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Builds a [`Path`] from mixed key and index segments.
///
/// ```
/// use formstore::path;
/// let p = path!["items", 0usize, "name"];
/// assert_eq!(p.join(), "items.0.name");
/// ```
#[macro_export]
macro_rules! path {
    () => { $crate::path::Path::root() };
    ($($segment:expr),+ $(,)?) => {
        $crate::path::Path::new(vec![$($crate::path::PathSegment::from($segment)),+])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_parse_and_join_agree() {
        let parsed = Path::from("user.addresses.2.city");
        assert_eq!(
            parsed.segments()[2],
            PathSegment::Index(2),
            "numeric parts become indices"
        );
        assert_eq!(parsed.join(), "user.addresses.2.city");
    }

    #[test]
    fn macro_mixes_keys_and_indices() {
        let p = crate::path!["items", 3, "name"];
        assert_eq!(p.len(), 3);
        assert_eq!(p.join(), "items.3.name");
        assert_eq!(p.parent().unwrap().join(), "items.3");
    }
}
