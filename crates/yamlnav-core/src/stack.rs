use crate::path::{PathElem, YamlPath};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub elem: PathElem,
    pub indent: usize,
}

/// Chain of ancestors active at the current scan line, outermost first.
#[derive(Debug, Clone, Default)]
pub struct PathStack {
    frames: Vec<Frame>,
}

impl PathStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Unwind for a mapping line at `indent`.
    ///
    /// Pops every frame whose recorded indent is `>= indent`. The new baseline
    /// is whatever the remaining top frame recorded.
    pub fn advance(&mut self, indent: usize) {
        while self.frames.last().is_some_and(|top| indent <= top.indent) {
            self.frames.pop();
        }
    }

    /// Unwind for a sequence marker at `indent`.
    ///
    /// A marker at the same column as a key frame belongs to that key
    /// (`containers:` followed by `- name: x` on the same column), but a marker
    /// at the column of a previous item closes that item.
    pub fn advance_sequence(&mut self, indent: usize) {
        while self.frames.last().is_some_and(|top| {
            indent < top.indent || (indent == top.indent && top.elem.is_index())
        }) {
            self.frames.pop();
        }
    }

    pub fn push(&mut self, elem: impl Into<PathElem>, indent: usize) {
        self.frames.push(Frame {
            elem: elem.into(),
            indent,
        });
    }

    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    #[must_use]
    pub fn baseline(&self) -> Option<usize> {
        self.frames.last().map(|f| f.indent)
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    #[must_use]
    pub fn path(&self) -> YamlPath {
        self.frames.iter().map(|f| f.elem.clone()).collect()
    }

    /// `true` when the outermost frames spell out `prefix`.
    #[must_use]
    pub fn starts_with(&self, prefix: &YamlPath) -> bool {
        self.frames.len() >= prefix.len()
            && self
                .frames
                .iter()
                .zip(prefix.segments())
                .all(|(f, e)| &f.elem == e)
    }
}

#[cfg(test)]
mod tests {
    use super::PathStack;
    use crate::path::{PathElem, YamlPath};

    #[test]
    fn unwinds_on_equal_or_smaller_indent() {
        let mut s = PathStack::new();
        s.push("a", 0);
        s.push("b", 2);
        s.push("c", 4);
        s.advance(2);
        assert_eq!(s.path().to_string(), "a");
        assert_eq!(s.baseline(), Some(0));
        s.advance(0);
        assert!(s.is_empty());
    }

    #[test]
    fn baseline_follows_irregular_indentation() {
        let mut s = PathStack::new();
        s.push("a", 0);
        s.push("b", 4);
        s.push("c", 7);
        // a fixed two-space decrement would land on 5 and keep `b.c` alive
        s.advance(5);
        assert_eq!(s.path().to_string(), "a.b");
        assert_eq!(s.baseline(), Some(4));
    }

    #[test]
    fn sequence_marker_keeps_same_column_key() {
        let mut s = PathStack::new();
        s.push("containers", 2);
        s.advance_sequence(2);
        assert_eq!(s.path().to_string(), "containers");

        s.push(PathElem::Index(1), 2);
        s.push("name", 4);
        s.advance_sequence(2);
        assert_eq!(s.path().to_string(), "containers");
    }

    #[test]
    fn starts_with_compares_positionally() {
        let mut s = PathStack::new();
        s.push("spec", 0);
        s.push("replicas", 2);
        assert!(s.starts_with(&YamlPath::parse_dotted("spec")));
        assert!(!s.starts_with(&YamlPath::parse_dotted("replicas")));
    }
}
