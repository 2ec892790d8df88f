use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;

use crate::path::YamlPath;

/// Where an entry came from during a project-wide scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FileMeta {
    pub file_path: Utf8PathBuf,
    pub file_name: String,
    pub relative_path: Utf8PathBuf,
}

impl FileMeta {
    #[must_use]
    pub fn new(root: &Utf8Path, file_path: Utf8PathBuf) -> Self {
        let file_name = file_path.file_name().unwrap_or_default().to_string();
        let relative_path = file_path
            .strip_prefix(root)
            .map(Utf8Path::to_path_buf)
            .unwrap_or_else(|_| file_path.clone());
        Self {
            file_path,
            file_name,
            relative_path,
        }
    }
}

/// A structural node (mapping key or sequence item) and where it sits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathEntry {
    /// 1-based.
    pub line: usize,
    /// Local key, or `[n]` for sequence items without an inline key.
    pub key: String,
    /// Trimmed source line.
    pub text: String,
    pub path: YamlPath,
    pub is_array: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub array_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<FileMeta>,
}

/// A leaf key with an inline scalar value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueEntry {
    pub line: usize,
    pub key: String,
    pub path: YamlPath,
    pub value: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<FileMeta>,
}

impl PathEntry {
    #[must_use]
    pub fn with_file(mut self, meta: FileMeta) -> Self {
        self.file = Some(meta);
        self
    }
}

impl ValueEntry {
    #[must_use]
    pub fn with_file(mut self, meta: FileMeta) -> Self {
        self.file = Some(meta);
        self
    }
}
