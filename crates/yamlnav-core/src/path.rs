use serde::{Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathElem {
    Key(String),
    /// 1-based position inside a sequence.
    Index(usize),
}

impl PathElem {
    /// Parse a single dotted segment; all-digit segments become indexes.
    #[must_use]
    pub fn parse(segment: &str) -> Self {
        match segment.parse::<usize>() {
            Ok(idx) if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) => {
                PathElem::Index(idx)
            }
            _ => PathElem::Key(segment.to_string()),
        }
    }

    #[must_use]
    pub fn as_key(&self) -> Option<&str> {
        match self {
            PathElem::Key(k) => Some(k),
            PathElem::Index(_) => None,
        }
    }

    #[must_use]
    pub fn is_index(&self) -> bool {
        matches!(self, PathElem::Index(_))
    }
}

impl std::fmt::Display for PathElem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathElem::Key(k) => write!(f, "{k}"),
            PathElem::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for PathElem {
    fn from(value: &str) -> Self {
        PathElem::Key(value.to_string())
    }
}

impl From<usize> for PathElem {
    fn from(value: usize) -> Self {
        PathElem::Index(value)
    }
}

/// Location of a node as an ordered chain of segments.
///
/// Rendered in dot notation (`spec.containers.1.name`). Keys that contain a
/// literal `.` are not escaped, so such paths do not round-trip through
/// [`YamlPath::parse_dotted`].
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YamlPath(pub Vec<PathElem>);

impl YamlPath {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Split a user query such as `spec.template.0.name` into segments.
    ///
    /// Empty segments (from `a..b` or a trailing dot) are dropped.
    #[must_use]
    pub fn parse_dotted(query: &str) -> Self {
        Self(
            query
                .split('.')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(PathElem::parse)
                .collect(),
        )
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<&PathElem> {
        self.0.last()
    }

    #[must_use]
    pub fn segments(&self) -> &[PathElem] {
        &self.0
    }

    #[must_use]
    pub fn starts_with(&self, prefix: &YamlPath) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }

    /// Copy of this path extended by one segment.
    #[must_use]
    pub fn child(&self, elem: impl Into<PathElem>) -> Self {
        let mut out = self.clone();
        out.0.push(elem.into());
        out
    }

    #[must_use]
    pub fn truncated(&self, len: usize) -> Self {
        Self(self.0.iter().take(len).cloned().collect())
    }

    /// Position of the innermost sequence element this path sits in, as long
    /// as it is the node itself or its direct parent.
    #[must_use]
    pub fn array_index(&self) -> Option<usize> {
        self.0.iter().rev().take(2).find_map(|e| match e {
            PathElem::Index(i) => Some(*i),
            PathElem::Key(_) => None,
        })
    }
}

impl std::fmt::Display for YamlPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for e in &self.0 {
            if first {
                write!(f, "{e}")?;
                first = false;
            } else {
                write!(f, ".{e}")?;
            }
        }
        Ok(())
    }
}

impl FromIterator<PathElem> for YamlPath {
    fn from_iter<T: IntoIterator<Item = PathElem>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for YamlPath {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}
