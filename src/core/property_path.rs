use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

pub const SEPARATOR: char = '/';

/// String key addressing a property inside a document.
///
/// `a/b` addresses key `b` of the nested object stored at `a`. A trailing
/// separator (`a/`) addresses the nested object itself and marks a group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyPath(String);

impl PropertyPath {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The empty prefix the top level of a form is relative to.
    pub fn root() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `a/` style path addressing a nested object rather than a scalar.
    pub fn is_group_marker(&self) -> bool {
        self.0.ends_with(SEPARATOR)
    }

    /// Key segments, ignoring the trailing separator of a group marker.
    pub fn segments(&self) -> Vec<&str> {
        let trimmed = self.0.strip_suffix(SEPARATOR).unwrap_or(self.0.as_str());
        if trimmed.is_empty() {
            return Vec::new();
        }
        trimmed.split(SEPARATOR).collect()
    }

    /// Splits at the first separator: `a/b/c` -> (`a/`, `b/c`).
    ///
    /// Returns `None` for scalar paths without a separator.
    pub fn split_group(&self) -> Option<(PropertyPath, PropertyPath)> {
        let idx = self.0.find(SEPARATOR)?;
        let (head, rest) = self.0.split_at(idx + SEPARATOR.len_utf8());
        Some((PropertyPath::new(head), PropertyPath::new(rest)))
    }

    pub fn strip_prefix(&self, prefix: &PropertyPath) -> Option<PropertyPath> {
        self.0
            .strip_prefix(prefix.as_str())
            .map(PropertyPath::new)
    }

    /// Restores a relative path under `prefix`. An empty prefix is the root.
    pub fn join(prefix: &PropertyPath, relative: &PropertyPath) -> PropertyPath {
        if prefix.is_empty() {
            return relative.clone();
        }
        let mut out = prefix.0.clone();
        if !out.ends_with(SEPARATOR) {
            out.push(SEPARATOR);
        }
        out.push_str(relative.as_str());
        PropertyPath(out)
    }

    /// Last segment, used as the default field label.
    pub fn leaf_name(&self) -> &str {
        self.segments().last().copied().unwrap_or("")
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Borrow<str> for PropertyPath {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<str> for PropertyPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<&str> for PropertyPath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PropertyPath {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl PartialEq<str> for PropertyPath {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for PropertyPath {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// Why a path set cannot be laid out as a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathShapeIssue {
    EmptySegment(PropertyPath),
    Duplicate(PropertyPath),
    ScalarAndGroup(PropertyPath),
}

impl fmt::Display for PathShapeIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySegment(path) => write!(f, "path '{path}' has an empty segment"),
            Self::Duplicate(path) => write!(f, "path '{path}' is declared twice"),
            Self::ScalarAndGroup(path) => {
                write!(f, "path '{path}' is used both as a scalar and as a group")
            }
        }
    }
}

/// Checks that `paths` form a finite tree, so recursive grouping terminates
/// and every prefix resolves to exactly one nested object.
pub fn check_tree_shape(paths: &[PropertyPath]) -> Result<(), PathShapeIssue> {
    let mut seen = std::collections::HashSet::<&str>::new();
    for path in paths {
        if path.is_empty() || path.segments().iter().any(|segment| segment.is_empty()) {
            return Err(PathShapeIssue::EmptySegment(path.clone()));
        }
        if !seen.insert(path.as_str()) {
            return Err(PathShapeIssue::Duplicate(path.clone()));
        }
    }

    for path in paths {
        if path.is_group_marker() {
            continue;
        }
        let as_group = format!("{}{}", path.as_str(), SEPARATOR);
        if paths
            .iter()
            .any(|other| other.as_str().starts_with(as_group.as_str()))
        {
            return Err(PathShapeIssue::ScalarAndGroup(path.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{PathShapeIssue, PropertyPath, check_tree_shape};

    #[test]
    fn split_group_takes_first_segment() {
        let (head, rest) = PropertyPath::from("stats/limits/max")
            .split_group()
            .expect("nested path");
        assert_eq!(head, "stats/");
        assert_eq!(rest, "limits/max");
        assert!(PropertyPath::from("title").split_group().is_none());
    }

    #[test]
    fn bare_marker_splits_into_empty_rest() {
        let (head, rest) = PropertyPath::from("stats/").split_group().expect("marker");
        assert_eq!(head, "stats/");
        assert!(rest.is_empty());
    }

    #[test]
    fn join_restores_stripped_path() {
        let prefix = PropertyPath::from("stats/");
        let full = PropertyPath::from("stats/max");
        let relative = full.strip_prefix(&prefix).expect("prefix");
        assert_eq!(relative, "max");
        assert_eq!(PropertyPath::join(&prefix, &relative), full);
        assert_eq!(PropertyPath::join(&PropertyPath::from(""), &relative), "max");
    }

    #[test]
    fn segments_ignore_trailing_separator() {
        assert_eq!(PropertyPath::from("a/b/").segments(), vec!["a", "b"]);
        assert_eq!(PropertyPath::from("a/b").leaf_name(), "b");
    }

    #[test]
    fn tree_shape_rejects_scalar_used_as_group() {
        let paths = vec![PropertyPath::from("a"), PropertyPath::from("a/x")];
        assert_eq!(
            check_tree_shape(&paths),
            Err(PathShapeIssue::ScalarAndGroup(PropertyPath::from("a")))
        );
    }

    #[test]
    fn tree_shape_rejects_empty_segments_and_duplicates() {
        assert!(matches!(
            check_tree_shape(&[PropertyPath::from("a//x")]),
            Err(PathShapeIssue::EmptySegment(_))
        ));
        assert!(matches!(
            check_tree_shape(&[PropertyPath::from("a"), PropertyPath::from("a")]),
            Err(PathShapeIssue::Duplicate(_))
        ));
        assert!(check_tree_shape(&[PropertyPath::from("a/x"), PropertyPath::from("b")]).is_ok());
    }
}
