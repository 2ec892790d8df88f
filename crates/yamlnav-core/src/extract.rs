//! Line-based extraction of paths, keys and values.
//!
//! All passes are heuristic: they never fail, lines that do not look like a
//! mapping key or a sequence item are skipped, and a document without a match
//! simply yields an empty result.

use std::collections::{HashMap, HashSet};

use crate::classify::{Line, MappingLine, SequenceLine, classify};
use crate::model::{PathEntry, ValueEntry};
use crate::path::{PathElem, YamlPath};
use crate::stack::PathStack;

#[derive(Debug, Clone, Copy)]
enum StepKind<'a> {
    Mapping(MappingLine<'a>),
    Item {
        item: SequenceLine<'a>,
        index: usize,
    },
}

/// One structural line together with the path it resolves to.
#[derive(Debug, Clone)]
struct Step<'a> {
    line: usize,
    raw: &'a str,
    kind: StepKind<'a>,
    path: YamlPath,
}

impl Step<'_> {
    fn into_path_entry(self) -> PathEntry {
        let (key, is_array, array_index) = match self.kind {
            StepKind::Mapping(m) => (m.key.to_string(), false, None),
            StepKind::Item { item, index } => (
                item.key
                    .map_or_else(|| format!("[{index}]"), ToString::to_string),
                true,
                Some(index),
            ),
        };
        PathEntry {
            line: self.line,
            key,
            text: self.raw.trim().to_string(),
            path: self.path,
            is_array,
            array_index,
            file: None,
        }
    }
}

/// Walks mapping and sequence lines while tracking the ancestor stack.
///
/// Sequence positions are counted per parent path. The counter for a path is
/// reset whenever a mapping key with that exact path is pushed again, so a
/// repeated parent starts numbering from 1.
struct PathWalker<'a, S> {
    lines: std::iter::Enumerate<std::slice::Iter<'a, S>>,
    stack: PathStack,
    counters: HashMap<YamlPath, usize>,
}

impl<'a, S: AsRef<str>> PathWalker<'a, S> {
    fn new(lines: &'a [S]) -> Self {
        Self {
            lines: lines.iter().enumerate(),
            stack: PathStack::new(),
            counters: HashMap::new(),
        }
    }
}

impl<'a, S: AsRef<str>> Iterator for PathWalker<'a, S> {
    type Item = Step<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (idx, raw) = self.lines.next()?;
            let raw = raw.as_ref();
            match classify(raw) {
                Line::Blank | Line::Unparsed => continue,
                Line::Mapping(m) => {
                    self.stack.advance(m.indent);
                    self.stack.push(m.key, m.indent);
                    let path = self.stack.path();
                    self.counters.remove(&path);
                    return Some(Step {
                        line: idx + 1,
                        raw,
                        kind: StepKind::Mapping(m),
                        path,
                    });
                }
                Line::Sequence(item) => {
                    self.stack.advance_sequence(item.indent);
                    let parent = self.stack.path();
                    let counter = self.counters.entry(parent.clone()).or_insert(0);
                    *counter += 1;
                    let index = *counter;

                    let path = match item.key {
                        Some(key) => {
                            self.stack.push(PathElem::Index(index), item.indent);
                            self.stack.push(key, item.key_indent);
                            self.stack.path()
                        }
                        None => parent.child(PathElem::Index(index)),
                    };
                    return Some(Step {
                        line: idx + 1,
                        raw,
                        kind: StepKind::Item { item, index },
                        path,
                    });
                }
            }
        }
    }
}

/// Every path reachable at any mapping or sequence line, in line order.
#[must_use]
pub fn get_paths<S: AsRef<str>>(lines: &[S]) -> Vec<PathEntry> {
    PathWalker::new(lines).map(Step::into_path_entry).collect()
}

/// Every leaf `key: value` pair with its fully qualified path.
///
/// Only mapping lines take part. A key with an inline value is a leaf and is
/// popped right after it is recorded; a key without one stays on the stack
/// as the parent of what follows. The first occurrence of a path wins.
#[must_use]
pub fn get_values<S: AsRef<str>>(lines: &[S]) -> Vec<ValueEntry> {
    let mut stack = PathStack::new();
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for (idx, raw) in lines.iter().enumerate() {
        let raw = raw.as_ref();
        let Line::Mapping(m) = classify(raw) else {
            continue;
        };
        stack.advance(m.indent);
        stack.push(m.key, m.indent);
        let Some(value) = m.value else {
            continue;
        };
        let path = stack.path();
        if seen.insert(path.clone()) {
            out.push(ValueEntry {
                line: idx + 1,
                key: m.key.to_string(),
                path,
                value: value.to_string(),
                text: raw.trim().to_string(),
                file: None,
            });
        }
        stack.pop();
    }
    out
}

/// Mapping keys starting with `prefix` (case-insensitive), ignoring nesting.
///
/// The returned entries carry the bare key as their path. An empty prefix
/// matches every key.
#[must_use]
pub fn find_keys_with_prefix<S: AsRef<str>>(
    prefix: &str,
    lines: &[S],
    limit: Option<usize>,
) -> Vec<PathEntry> {
    let prefix = prefix.to_lowercase();
    let limit = limit.unwrap_or(usize::MAX);
    lines
        .iter()
        .enumerate()
        .filter_map(|(idx, raw)| {
            let raw = raw.as_ref();
            let Line::Mapping(m) = classify(raw) else {
                return None;
            };
            if !m.key.to_lowercase().starts_with(&prefix) {
                return None;
            }
            Some(PathEntry {
                line: idx + 1,
                key: m.key.to_string(),
                text: raw.trim().to_string(),
                path: YamlPath(vec![PathElem::Key(m.key.to_string())]),
                is_array: false,
                array_index: None,
                file: None,
            })
        })
        .take(limit)
        .collect()
}

/// Lines whose ancestor chain starts with `query`.
///
/// Every match reports `query` itself as its path, so lines nested below the
/// queried node are reported under the queried path as well. An empty query
/// matches nothing.
#[must_use]
pub fn find_yaml_path<S: AsRef<str>>(
    query: &YamlPath,
    lines: &[S],
    limit: Option<usize>,
) -> Vec<PathEntry> {
    if query.is_empty() {
        return Vec::new();
    }
    PathWalker::new(lines)
        .filter(|step| step.path.starts_with(query))
        .take(limit.unwrap_or(usize::MAX))
        .map(|step| {
            let mut entry = step.into_path_entry();
            entry.path = entry.path.truncated(query.len());
            entry
        })
        .collect()
}
