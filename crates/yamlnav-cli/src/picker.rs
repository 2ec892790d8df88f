use std::io::Write;

use yamlnav::{PickAction, Picker, PickerEntry, Selection};

/// Chooses the first entry whose ordinal contains the query, ignoring case.
#[derive(Debug, Clone)]
pub struct QueryPicker {
    query: String,
    action: PickAction,
}

impl QueryPicker {
    #[must_use]
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_lowercase(),
            action: PickAction::Jump,
        }
    }

    /// Confirm with `action` when the picker offers it.
    #[must_use]
    pub fn with_action(mut self, action: PickAction) -> Self {
        self.action = action;
        self
    }
}

impl Picker for QueryPicker {
    fn pick(
        &mut self,
        prompt: &str,
        entries: Vec<PickerEntry>,
        actions: &[PickAction],
    ) -> Option<Selection> {
        let action = if actions.contains(&self.action) {
            self.action
        } else {
            *actions.first()?
        };
        let entry = entries
            .into_iter()
            .find(|e| e.ordinal.to_lowercase().contains(&self.query))?;
        tracing::debug!(prompt, query = %self.query, picked = %entry.display, "query pick");
        Some(Selection { entry, action })
    }
}

/// Prints every entry and never selects.
#[derive(Debug)]
pub struct ListPicker<W> {
    out: W,
    error: Option<std::io::Error>,
}

impl<W: Write> ListPicker<W> {
    pub fn new(out: W) -> Self {
        Self { out, error: None }
    }

    /// # Errors
    ///
    /// Returns the first write error hit while listing.
    pub fn finish(self) -> std::io::Result<()> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl<W: Write> Picker for ListPicker<W> {
    fn pick(
        &mut self,
        _prompt: &str,
        entries: Vec<PickerEntry>,
        _actions: &[PickAction],
    ) -> Option<Selection> {
        for entry in entries {
            if let Err(err) = writeln!(self.out, "{}", entry.display) {
                self.error.get_or_insert(err);
                break;
            }
        }
        None
    }
}
