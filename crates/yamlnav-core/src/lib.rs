//! Indentation-driven indexing of YAML paths, keys and leaf values.
//!
//! The scanner works on raw text lines and does not need a YAML grammar. A
//! full parser can be plugged in through [`structured::StructuredParser`]
//! and is used opportunistically, with the line scanner as the fallback.

pub mod classify;
pub mod extract;
pub mod model;
pub mod path;
pub mod stack;
pub mod structured;

pub use extract::{find_keys_with_prefix, find_yaml_path, get_paths, get_values};
pub use model::{FileMeta, PathEntry, ValueEntry};
pub use path::{PathElem, YamlPath};
pub use structured::{Node, SerdeYamlParser, StructuredParser};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Other: {0}")]
    Other(String),
}

/// Paths of `lines`, through `parser` when it yields a usable tree.
#[must_use]
pub fn extract_paths<S: AsRef<str>>(
    lines: &[S],
    parser: Option<&dyn StructuredParser>,
) -> Vec<PathEntry> {
    parser
        .and_then(|p| structured::try_parse(p, lines))
        .and_then(|tree| structured::paths_from_tree(&tree, lines))
        .unwrap_or_else(|| get_paths(lines))
}

/// Leaf values of `lines`, through `parser` when it yields a usable tree.
#[must_use]
pub fn extract_values<S: AsRef<str>>(
    lines: &[S],
    parser: Option<&dyn StructuredParser>,
) -> Vec<ValueEntry> {
    parser
        .and_then(|p| structured::try_parse(p, lines))
        .and_then(|tree| structured::values_from_tree(&tree, lines))
        .unwrap_or_else(|| get_values(lines))
}
