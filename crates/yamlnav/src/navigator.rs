use std::sync::Arc;

use camino::Utf8Path;
use yamlnav_core::{
    FileMeta, Node, PathEntry, SerdeYamlParser, StructuredParser, ValueEntry, YamlPath,
    find_keys_with_prefix, find_yaml_path, get_paths, get_values, structured,
};
use yamlnav_project::{ProjectScanner, ScanError};

use crate::cache::{Cache, Clock, SystemClock};
use crate::config::Config;
use crate::editor::{self, EditError};
use crate::history::{HistoryKind, HistoryLedger};
use crate::host::{CURRENT_BUFFER_KEY, HostError, SourceId, TextHost};
use crate::picker::{PickAction, Picker, history_entries, path_entries, value_entries};

#[derive(Debug, thiserror::Error)]
pub enum NavError {
    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error("{kind} {value:?} not found")]
    NotFound { kind: HistoryKind, value: String },
}

/// Where a confirmed pick landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Jump {
    pub source: SourceId,
    pub line: usize,
    pub action: PickAction,
}

/// A navigation session over one host.
///
/// Owns the extraction cache and the jump history. Results for a source are
/// served from the cache until they expire, the source is saved through
/// [`Navigator::on_file_saved`], or the cache is cleared.
pub struct Navigator<H> {
    host: H,
    config: Config,
    cache: Cache,
    history: HistoryLedger,
    parser: Option<Box<dyn StructuredParser>>,
}

impl<H> std::fmt::Debug for Navigator<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Navigator")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .field("history", &self.history.len())
            .field("structured", &self.parser.is_some())
            .finish_non_exhaustive()
    }
}

impl<H: TextHost> Navigator<H> {
    #[must_use]
    pub fn new(host: H, config: Config) -> Self {
        Self::with_clock(host, config, Arc::new(SystemClock::default()))
    }

    #[must_use]
    pub fn with_clock(host: H, config: Config, clock: Arc<dyn Clock>) -> Self {
        let cache = Cache::new(config.cache.enabled, config.cache_ttl(), clock);
        let history = HistoryLedger::new(config.history.max_entries);
        let parser: Option<Box<dyn StructuredParser>> = if config.structured_parser {
            Some(Box::new(SerdeYamlParser))
        } else {
            None
        };
        Self {
            host,
            config,
            cache,
            history,
            parser,
        }
    }

    /// Replace the structured parser, or disable it with `None`.
    #[must_use]
    pub fn with_parser(mut self, parser: Option<Box<dyn StructuredParser>>) -> Self {
        self.parser = parser;
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn history(&self) -> &HistoryLedger {
        &self.history
    }

    fn lines(&mut self, source: &SourceId) -> Result<Vec<String>, HostError> {
        let key = source.cache_key();
        if let Some(lines) = self.cache.lines().get(&key) {
            return Ok(lines);
        }
        let lines = self.host.read_lines(source)?;
        self.cache.lines().set(&key, lines.clone());
        Ok(lines)
    }

    fn parsed(&mut self, key: &str, lines: &[String]) -> Option<Node> {
        let parser = self.parser.as_deref()?;
        if let Some(tree) = self.cache.parsed().get(key) {
            return Some(tree);
        }
        let tree = structured::try_parse(parser, lines)?;
        self.cache.parsed().set(key, tree.clone());
        Some(tree)
    }

    fn extract_paths(&mut self, key: &str, lines: &[String]) -> Vec<PathEntry> {
        self.parsed(key, lines)
            .and_then(|tree| structured::paths_from_tree(&tree, lines))
            .unwrap_or_else(|| get_paths(lines))
    }

    fn extract_values(&mut self, key: &str, lines: &[String]) -> Vec<ValueEntry> {
        self.parsed(key, lines)
            .and_then(|tree| structured::values_from_tree(&tree, lines))
            .unwrap_or_else(|| get_values(lines))
    }

    /// Every path of `source`.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot read `source`.
    pub fn paths(&mut self, source: &SourceId) -> Result<Vec<PathEntry>, HostError> {
        let key = source.cache_key();
        if let Some(paths) = self.cache.paths().get(&key) {
            return Ok(paths);
        }
        let lines = self.lines(source)?;
        let paths = self.extract_paths(&key, &lines);
        self.cache.paths().set(&key, paths.clone());
        Ok(paths)
    }

    /// Every leaf value of `source`.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot read `source`.
    pub fn values(&mut self, source: &SourceId) -> Result<Vec<ValueEntry>, HostError> {
        let key = source.cache_key();
        if let Some(values) = self.cache.values().get(&key) {
            return Ok(values);
        }
        let lines = self.lines(source)?;
        let values = self.extract_values(&key, &lines);
        self.cache.values().set(&key, values.clone());
        Ok(values)
    }

    /// Keys of `source` starting with `prefix`, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot read `source`.
    pub fn keys(
        &mut self,
        source: &SourceId,
        prefix: &str,
        limit: Option<usize>,
    ) -> Result<Vec<PathEntry>, HostError> {
        let lines = self.lines(source)?;
        Ok(find_keys_with_prefix(prefix, &lines, limit))
    }

    /// Lines of `source` at the dotted `query`, such as `spec.replicas`.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot read `source`.
    pub fn find_path(
        &mut self,
        source: &SourceId,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<PathEntry>, HostError> {
        let lines = self.lines(source)?;
        Ok(find_yaml_path(&YamlPath::parse_dotted(query), &lines, limit))
    }

    fn project_entries<T, F>(
        &mut self,
        scanner: &ProjectScanner,
        get: F,
    ) -> Result<Vec<T>, ScanError>
    where
        F: Fn(&mut Self, &str, &[String], &FileMeta) -> Vec<T>,
    {
        let mut out = Vec::new();
        // unlistable directories were already logged by the walk
        for path in scanner.find_yaml_files()? {
            let meta = scanner.file_meta(&path);
            let key = meta.file_path.to_string();
            let lines = match self.cache.lines().get(&key) {
                Some(lines) => lines,
                None => match scanner.read_lines(&path) {
                    Ok(lines) => {
                        self.cache.lines().set(&key, lines.clone());
                        lines
                    }
                    Err(err) => {
                        tracing::warn!(file = %meta.file_path, %err, "skipping file");
                        continue;
                    }
                },
            };
            out.extend(get(self, &key, &lines, &meta));
        }
        Ok(out)
    }

    /// Paths of every YAML file below the scanner's root, tagged with their
    /// file. Per-file results are cached by absolute path.
    ///
    /// # Errors
    ///
    /// Returns an error if the project root cannot be listed.
    pub fn project_paths(&mut self, scanner: &ProjectScanner) -> Result<Vec<PathEntry>, ScanError> {
        let paths = self.project_entries(scanner, |nav, key, lines, meta| {
            match nav.cache.paths().get(key) {
                Some(paths) => paths,
                None => {
                    let paths: Vec<PathEntry> = nav
                        .extract_paths(key, lines)
                        .into_iter()
                        .map(|e| e.with_file(meta.clone()))
                        .collect();
                    nav.cache.paths().set(key, paths.clone());
                    paths
                }
            }
        })?;
        tracing::info!(paths = paths.len(), root = %scanner.base_dir(), "indexed project paths");
        Ok(paths)
    }

    /// Leaf values of every YAML file below the scanner's root.
    ///
    /// # Errors
    ///
    /// Returns an error if the project root cannot be listed.
    pub fn project_values(
        &mut self,
        scanner: &ProjectScanner,
    ) -> Result<Vec<ValueEntry>, ScanError> {
        let values = self.project_entries(scanner, |nav, key, lines, meta| {
            match nav.cache.values().get(key) {
                Some(values) => values,
                None => {
                    let values: Vec<ValueEntry> = nav
                        .extract_values(key, lines)
                        .into_iter()
                        .map(|e| e.with_file(meta.clone()))
                        .collect();
                    nav.cache.values().set(key, values.clone());
                    values
                }
            }
        })?;
        tracing::info!(values = values.len(), root = %scanner.base_dir(), "indexed project values");
        Ok(values)
    }

    fn on_select(
        &mut self,
        source: SourceId,
        line: usize,
        action: PickAction,
        kind: HistoryKind,
        target: String,
    ) -> Result<Jump, HostError> {
        self.host.move_cursor(&source, line)?;
        self.history.add(kind, target);
        Ok(Jump {
            source,
            line,
            action,
        })
    }

    fn target_of(source: &SourceId, file: Option<&FileMeta>) -> SourceId {
        match file {
            Some(meta) => SourceId::File(meta.file_path.clone()),
            None => source.clone(),
        }
    }

    /// Offer `paths` through `picker` and jump to the chosen one.
    ///
    /// Entries carrying a file jump to that file, the others to `source`.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot move the cursor.
    pub fn pick_path(
        &mut self,
        source: &SourceId,
        paths: &[PathEntry],
        picker: &mut dyn Picker,
    ) -> Result<Option<Jump>, HostError> {
        if paths.is_empty() {
            tracing::info!(%source, "no paths to pick from");
            return Ok(None);
        }
        let entries = path_entries(paths);
        let Some(selection) = picker.pick("YAML paths", entries, &[PickAction::Jump]) else {
            return Ok(None);
        };
        let Some(entry) = paths.get(selection.entry.index) else {
            return Ok(None);
        };
        let target = Self::target_of(source, entry.file.as_ref());
        self.on_select(
            target,
            entry.line,
            selection.action,
            HistoryKind::Path,
            entry.path.to_string(),
        )
        .map(Some)
    }

    /// Offer `values` through `picker`, with editing as an extra action.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot move the cursor.
    pub fn pick_value(
        &mut self,
        source: &SourceId,
        values: &[ValueEntry],
        picker: &mut dyn Picker,
    ) -> Result<Option<Jump>, HostError> {
        if values.is_empty() {
            tracing::info!(%source, "no values to pick from");
            return Ok(None);
        }
        let entries = value_entries(values);
        let actions = [PickAction::Jump, PickAction::Edit];
        let Some(selection) = picker.pick("YAML values", entries, &actions) else {
            return Ok(None);
        };
        let Some(entry) = values.get(selection.entry.index) else {
            return Ok(None);
        };
        let target = Self::target_of(source, entry.file.as_ref());
        self.on_select(
            target,
            entry.line,
            selection.action,
            HistoryKind::Value,
            entry.value.clone(),
        )
        .map(Some)
    }

    /// Pick one of the paths of `source` and move the cursor there.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot read `source` or move the cursor.
    pub fn jump_to_path(
        &mut self,
        source: &SourceId,
        picker: &mut dyn Picker,
    ) -> Result<Option<Jump>, HostError> {
        let paths = self.paths(source)?;
        self.pick_path(source, &paths, picker)
    }

    /// Pick one of the values of `source` and move the cursor there.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot read `source` or move the cursor.
    pub fn jump_to_value(
        &mut self,
        source: &SourceId,
        picker: &mut dyn Picker,
    ) -> Result<Option<Jump>, HostError> {
        let values = self.values(source)?;
        self.pick_value(source, &values, picker)
    }

    /// Pick a previous jump target and resolve it against the current
    /// contents of `source`.
    ///
    /// # Errors
    ///
    /// Returns [`NavError::NotFound`] when the chosen target no longer
    /// exists in `source`, or a host error.
    pub fn jump_from_history(
        &mut self,
        source: &SourceId,
        picker: &mut dyn Picker,
    ) -> Result<Option<Jump>, NavError> {
        let recent: Vec<_> = self.history.entries().rev().cloned().collect();
        if recent.is_empty() {
            tracing::info!("history is empty");
            return Ok(None);
        }
        let refs: Vec<_> = recent.iter().collect();
        let entries = history_entries(&refs);
        let Some(selection) = picker.pick("YAML history", entries, &[PickAction::Jump]) else {
            return Ok(None);
        };
        let Some(entry) = recent.get(selection.entry.index) else {
            return Ok(None);
        };

        let line = match entry.kind {
            HistoryKind::Path => self
                .find_path(source, &entry.value, Some(1))?
                .first()
                .map(|e| e.line),
            HistoryKind::Value => self
                .values(source)?
                .iter()
                .find(|v| v.value == entry.value)
                .map(|v| v.line),
        };
        let Some(line) = line else {
            return Err(NavError::NotFound {
                kind: entry.kind,
                value: entry.value.clone(),
            });
        };
        let jump = self.on_select(
            source.clone(),
            line,
            selection.action,
            entry.kind,
            entry.value.clone(),
        )?;
        Ok(Some(jump))
    }

    /// Replace the value on `line` of `source`, see [`editor::edit_value`].
    ///
    /// # Errors
    ///
    /// Returns an error if the line cannot be edited.
    pub fn edit_value<P>(
        &mut self,
        source: &SourceId,
        line: usize,
        prompt: P,
    ) -> Result<bool, EditError>
    where
        P: FnOnce(&str) -> Option<String>,
    {
        editor::edit_value(&mut self.host, &mut self.cache, source, line, prompt)
    }

    /// Drop cached results for a file that was written.
    pub fn on_file_saved(&mut self, path: &Utf8Path) {
        self.cache.clear(Some(path.as_str()));
        if self.host.buffer_name().as_deref() == Some(path) {
            self.cache.clear(Some(CURRENT_BUFFER_KEY));
        }
    }

    /// Drop cached results for `source`, or everything when `None`.
    pub fn clear_cache(&mut self, source: Option<&SourceId>) {
        match source {
            Some(source) => self.cache.clear(Some(&source.cache_key())),
            None => self.cache.clear(None),
        }
    }
}
