//! Optional full-grammar extraction.
//!
//! A [`StructuredParser`] turns the whole document into a [`Node`] tree. The
//! tree is flattened into paths and then tied back to source lines by
//! matching each keyed line against the final segment of a not yet claimed
//! path. Callers fall back to the line scanner whenever parsing fails or no
//! path could be tied to a line.

use std::collections::HashSet;

use crate::Error;
use crate::classify::classify;
use crate::model::{PathEntry, ValueEntry};
use crate::path::{PathElem, YamlPath};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Mapping(Vec<(String, Node)>),
    Sequence(Vec<Node>),
    Scalar(String),
    Null,
}

/// A full YAML reader.
pub trait StructuredParser {
    /// # Errors
    ///
    /// Returns an error if `text` is not a document this parser understands.
    fn parse(&self, text: &str) -> Result<Node, Error>;
}

/// [`StructuredParser`] backed by `serde_yaml`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerdeYamlParser;

impl StructuredParser for SerdeYamlParser {
    fn parse(&self, text: &str) -> Result<Node, Error> {
        let value: serde_yaml::Value = serde_yaml::from_str(text)?;
        Ok(Node::from(value))
    }
}

fn scalar_text(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Null => Some("null".to_string()),
        serde_yaml::Value::Tagged(t) => scalar_text(&t.value),
        serde_yaml::Value::Sequence(_) | serde_yaml::Value::Mapping(_) => None,
    }
}

impl From<serde_yaml::Value> for Node {
    fn from(value: serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Null => Node::Null,
            serde_yaml::Value::Bool(v) => Node::Scalar(v.to_string()),
            serde_yaml::Value::Number(v) => Node::Scalar(v.to_string()),
            serde_yaml::Value::String(v) => Node::Scalar(v),
            serde_yaml::Value::Sequence(v) => {
                Node::Sequence(v.into_iter().map(Node::from).collect())
            }
            serde_yaml::Value::Mapping(v) => Node::Mapping(
                v.into_iter()
                    // complex keys cannot be addressed by a dotted path
                    .filter_map(|(k, v)| Some((scalar_text(&k)?, Node::from(v))))
                    .collect(),
            ),
            serde_yaml::Value::Tagged(v) => Node::from(v.value),
        }
    }
}

/// A node of the parsed tree, independent of line numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: YamlPath,
    /// Scalar text for leaves, `None` for containers and nulls.
    pub value: Option<String>,
    pub is_array: bool,
    pub array_index: Option<usize>,
}

/// Flatten a tree into one entry per node, in document order.
///
/// Sequence elements get 1-based positional segments; mapping children get
/// their key. Children of a sequence element inherit its position.
#[must_use]
pub fn flatten(root: &Node) -> Vec<TreeEntry> {
    let mut out = Vec::new();
    flatten_into(root, &YamlPath::new(), None, &mut out);
    out
}

fn flatten_into(node: &Node, path: &YamlPath, item: Option<usize>, out: &mut Vec<TreeEntry>) {
    match node {
        Node::Mapping(children) => {
            for (key, child) in children {
                let child_path = path.child(PathElem::Key(key.clone()));
                push_entry(child, &child_path, item, out);
                flatten_into(child, &child_path, None, out);
            }
        }
        Node::Sequence(items) => {
            for (idx, child) in items.iter().enumerate() {
                let position = idx + 1;
                let child_path = path.child(PathElem::Index(position));
                push_entry(child, &child_path, Some(position), out);
                flatten_into(child, &child_path, Some(position), out);
            }
        }
        Node::Scalar(_) | Node::Null => {}
    }
}

fn push_entry(node: &Node, path: &YamlPath, item: Option<usize>, out: &mut Vec<TreeEntry>) {
    let value = match node {
        Node::Scalar(s) => Some(s.clone()),
        _ => None,
    };
    out.push(TreeEntry {
        path: path.clone(),
        value,
        is_array: item.is_some(),
        array_index: item,
    });
}

/// A tree entry tied to the source line that introduced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Associated<'t> {
    pub line: usize,
    pub text: String,
    pub entry: &'t TreeEntry,
}

/// Tie tree entries to keyed source lines.
///
/// For every mapping line or keyed sequence item, an unclaimed entry whose
/// last segment equals the line's key is claimed. Entries follow document
/// order, so the search starts after the previously claimed entry and only
/// wraps around when nothing matches there. Entries that are never claimed
/// (positional-only items, keys written in flow style) are dropped.
///
/// Keys are matched by name only. A flow mapping such as `labels: {app: web}`
/// leaves `labels.app` unclaimed, and a later `app:` line can still claim it
/// when no `app` entry follows the previous claim.
#[must_use]
pub fn associate<'t, S: AsRef<str>>(entries: &'t [TreeEntry], lines: &[S]) -> Vec<Associated<'t>> {
    let mut claimed = HashSet::new();
    let mut cursor = 0;
    let mut out = Vec::new();
    for (idx, raw) in lines.iter().enumerate() {
        let raw = raw.as_ref();
        let line = classify(raw);
        let Some(key) = line.key() else {
            continue;
        };
        let matches = |&(i, e): &(usize, &TreeEntry)| {
            !claimed.contains(&i) && e.path.last().and_then(PathElem::as_key) == Some(key)
        };
        let found = entries
            .iter()
            .enumerate()
            .skip(cursor)
            .find(matches)
            .or_else(|| entries.iter().enumerate().find(matches));
        if let Some((i, entry)) = found {
            claimed.insert(i);
            cursor = i + 1;
            out.push(Associated {
                line: idx + 1,
                text: raw.trim().to_string(),
                entry,
            });
        }
    }
    out
}

/// Paths from a parsed tree, or `None` when no entry could be tied to a line.
#[must_use]
pub fn paths_from_tree<S: AsRef<str>>(root: &Node, lines: &[S]) -> Option<Vec<PathEntry>> {
    let entries = flatten(root);
    let associated = associate(&entries, lines);
    if associated.is_empty() {
        return None;
    }
    Some(
        associated
            .into_iter()
            .map(|a| PathEntry {
                line: a.line,
                key: a.entry.path.last().map(ToString::to_string).unwrap_or_default(),
                text: a.text,
                path: a.entry.path.clone(),
                is_array: a.entry.is_array,
                array_index: a.entry.array_index,
                file: None,
            })
            .collect(),
    )
}

/// Leaf values from a parsed tree, or `None` when no entry could be tied to a
/// line.
#[must_use]
pub fn values_from_tree<S: AsRef<str>>(root: &Node, lines: &[S]) -> Option<Vec<ValueEntry>> {
    let entries = flatten(root);
    let associated = associate(&entries, lines);
    if associated.is_empty() {
        return None;
    }
    Some(
        associated
            .into_iter()
            .filter_map(|a| {
                let value = a.entry.value.as_ref().filter(|v| !v.is_empty())?;
                Some(ValueEntry {
                    line: a.line,
                    key: a.entry.path.last().map(ToString::to_string).unwrap_or_default(),
                    path: a.entry.path.clone(),
                    value: value.clone(),
                    text: a.text,
                    file: None,
                })
            })
            .collect(),
    )
}

/// Parse `lines` as one document.
///
/// Parse errors are logged and turned into `None`.
pub fn try_parse<S: AsRef<str>>(parser: &dyn StructuredParser, lines: &[S]) -> Option<Node> {
    let text = lines
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join("\n");
    match parser.parse(&text) {
        Ok(node) => Some(node),
        Err(err) => {
            tracing::debug!(%err, "structured parse failed, using line scanner");
            None
        }
    }
}
