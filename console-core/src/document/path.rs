//! Path addresses into a nested prompt document

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("path must contain at least one segment")]
    Empty,

    #[error("path segment {index} is empty")]
    EmptySegment { index: usize },
}

/// Ordered sequence of keys naming one location in a document.
///
/// The dot-joined form is the dirty-set key. Segments may themselves contain
/// dots, so the segments are always kept alongside the key and the key is
/// never parsed back for structural decisions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct PathAddress(Vec<String>);

impl PathAddress {
    pub fn new<I, S>(segments: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        if let Some(index) = segments.iter().position(|s| s.is_empty()) {
            return Err(PathError::EmptySegment { index });
        }
        Ok(Self(segments))
    }

    /// Parse a dot-joined path. Only for segments known not to contain dots.
    pub fn parse_dotted(dotted: &str) -> Result<Self, PathError> {
        Self::new(dotted.split('.'))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn first(&self) -> &str {
        &self.0[0]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn key(&self) -> String {
        self.0.join(".")
    }

    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// True when `self` equals `prefix` or lies underneath it.
    pub fn starts_with(&self, prefix: &PathAddress) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }

    pub fn is_strict_descendant_of(&self, ancestor: &PathAddress) -> bool {
        self.0.len() > ancestor.0.len() && self.starts_with(ancestor)
    }

    pub fn parent(&self) -> Option<Self> {
        if self.0.len() <= 1 {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }
}

impl TryFrom<Vec<String>> for PathAddress {
    type Error = PathError;

    fn try_from(segments: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(segments)
    }
}

impl From<PathAddress> for Vec<String> {
    fn from(path: PathAddress) -> Self {
        path.0
    }
}

impl fmt::Display for PathAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}
