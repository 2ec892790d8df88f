//! What a selection UI receives and hands back.
//!
//! The session builds [`PickerEntry`] lists and gives them to a [`Picker`]
//! backend. Backends only choose; moving the cursor and recording history
//! happen in the session once a choice is confirmed.

use yamlnav_core::{FileMeta, PathEntry, ValueEntry};

use crate::history::HistoryEntry;

/// What to do with a confirmed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PickAction {
    Jump,
    Edit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerEntry {
    /// Position in the list the entries were made from.
    pub index: usize,
    pub display: String,
    /// Text that fuzzy matching runs against.
    pub ordinal: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub entry: PickerEntry,
    pub action: PickAction,
}

pub trait Picker {
    /// Let the user choose one of `entries`.
    ///
    /// `actions` lists what may be done with the choice, the first being the
    /// default. `None` means the pick was cancelled.
    fn pick(
        &mut self,
        prompt: &str,
        entries: Vec<PickerEntry>,
        actions: &[PickAction],
    ) -> Option<Selection>;
}

fn location(file: Option<&FileMeta>, line: usize) -> String {
    match file {
        Some(file) => format!("{}:{line}", file.relative_path),
        None => format!("{line}"),
    }
}

#[must_use]
pub fn path_entries(entries: &[PathEntry]) -> Vec<PickerEntry> {
    entries
        .iter()
        .enumerate()
        .map(|(index, e)| PickerEntry {
            index,
            display: format!("{}  [{}]", e.path, location(e.file.as_ref(), e.line)),
            ordinal: e.path.to_string(),
        })
        .collect()
}

/// Entries rendered as `path: value`, matchable on either half.
#[must_use]
pub fn value_entries(entries: &[ValueEntry]) -> Vec<PickerEntry> {
    entries
        .iter()
        .enumerate()
        .map(|(index, e)| PickerEntry {
            index,
            display: format!(
                "{}: {}  [{}]",
                e.path,
                e.value,
                location(e.file.as_ref(), e.line)
            ),
            ordinal: format!("{} {}", e.path, e.value),
        })
        .collect()
}

#[must_use]
pub fn history_entries(entries: &[&HistoryEntry]) -> Vec<PickerEntry> {
    entries
        .iter()
        .enumerate()
        .map(|(index, e)| PickerEntry {
            index,
            display: format!("{} {}", e.kind, e.value),
            ordinal: e.value.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{path_entries, value_entries};
    use camino::{Utf8Path, Utf8PathBuf};
    use yamlnav_core::{FileMeta, get_paths, get_values};

    #[test]
    fn single_file_entries_show_line() {
        let lines = ["metadata:", "  name: nginx"];
        let entries = path_entries(&get_paths(&lines));
        assert_eq!(entries[1].display, "metadata.name  [2]");
        assert_eq!(entries[1].ordinal, "metadata.name");
        assert_eq!(entries[1].index, 1);
    }

    #[test]
    fn project_entries_show_file_and_match_values() {
        let meta = FileMeta::new(
            Utf8Path::new("/work"),
            Utf8PathBuf::from("/work/deploy/app.yaml"),
        );
        let values: Vec<_> = get_values(&["metadata:", "  name: nginx"])
            .into_iter()
            .map(|v| v.with_file(meta.clone()))
            .collect();
        let entries = value_entries(&values);
        assert_eq!(entries[0].display, "metadata.name: nginx  [deploy/app.yaml:2]");
        assert_eq!(entries[0].ordinal, "metadata.name nginx");
    }
}
