//! The text source a navigation session reads from and writes to.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use vfs::VfsPath;

pub const CURRENT_BUFFER_KEY: &str = "current";

/// Identity of a line source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceId {
    /// Whatever the host currently has focused.
    CurrentBuffer,
    File(Utf8PathBuf),
}

impl SourceId {
    /// Key under which extraction results for this source are cached.
    #[must_use]
    pub fn cache_key(&self) -> String {
        match self {
            Self::CurrentBuffer => CURRENT_BUFFER_KEY.to_string(),
            Self::File(path) => path.to_string(),
        }
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CurrentBuffer => write!(f, "<current buffer>"),
            Self::File(path) => write!(f, "{path}"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("no buffer is open")]
    NoCurrentBuffer,

    #[error("{0} does not exist")]
    NotFound(Utf8PathBuf),

    #[error("line {line} is out of range for {source_id} ({len} lines)")]
    LineOutOfRange {
        source_id: SourceId,
        line: usize,
        len: usize,
    },

    #[error("vfs error: {0}")]
    Vfs(#[from] vfs::VfsError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Editor-side operations the session depends on.
pub trait TextHost {
    /// All lines of `source`, without line terminators.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read.
    fn read_lines(&self, source: &SourceId) -> Result<Vec<String>, HostError>;

    /// File behind the current buffer, if any.
    fn buffer_name(&self) -> Option<Utf8PathBuf>;

    /// Replace 1-based `line` of `source` with `text`.
    ///
    /// # Errors
    ///
    /// Returns an error if the line does not exist or the source cannot be
    /// written.
    fn replace_line(&mut self, source: &SourceId, line: usize, text: &str)
    -> Result<(), HostError>;

    /// Focus `source` and put the cursor on 1-based `line`.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be opened.
    fn move_cursor(&mut self, source: &SourceId, line: usize) -> Result<(), HostError>;

    /// Make `source` available, loading it without focusing it when it is
    /// not already open.
    ///
    /// # Errors
    ///
    /// Returns an error if the source does not exist.
    fn resolve(&mut self, source: &SourceId) -> Result<(), HostError>;
}

/// A [`TextHost`] over a virtual filesystem, with one focused buffer.
#[derive(Debug, Clone)]
pub struct VfsHost {
    root: VfsPath,
    current: Option<Utf8PathBuf>,
    cursor: Option<(Utf8PathBuf, usize)>,
    loaded: Vec<Utf8PathBuf>,
}

impl VfsHost {
    #[must_use]
    pub fn new(root: VfsPath) -> Self {
        Self {
            root,
            current: None,
            cursor: None,
            loaded: Vec::new(),
        }
    }

    /// Host over the local filesystem, addressed by absolute paths.
    #[must_use]
    pub fn physical() -> Self {
        Self::new(VfsPath::new(vfs::PhysicalFS::new("/")))
    }

    /// Focus `path` as the current buffer.
    #[must_use]
    pub fn with_current(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.current = Some(path.into());
        self
    }

    /// Focused file and cursor line after the last jump.
    #[must_use]
    pub fn cursor(&self) -> Option<(&Utf8Path, usize)> {
        self.cursor.as_ref().map(|(path, line)| (path.as_path(), *line))
    }

    /// Files loaded in the background by [`TextHost::resolve`].
    #[must_use]
    pub fn loaded(&self) -> &[Utf8PathBuf] {
        &self.loaded
    }

    fn file_of(&self, source: &SourceId) -> Result<Utf8PathBuf, HostError> {
        match source {
            SourceId::CurrentBuffer => self.current.clone().ok_or(HostError::NoCurrentBuffer),
            SourceId::File(path) => Ok(path.clone()),
        }
    }

    fn vfs_path(&self, file: &Utf8Path) -> Result<VfsPath, HostError> {
        let path = self.root.join(file.as_str().trim_start_matches('/'))?;
        if !path.is_file()? {
            return Err(HostError::NotFound(file.to_path_buf()));
        }
        Ok(path)
    }
}

impl TextHost for VfsHost {
    fn read_lines(&self, source: &SourceId) -> Result<Vec<String>, HostError> {
        let file = self.file_of(source)?;
        let contents = self.vfs_path(&file)?.read_to_string()?;
        Ok(contents.lines().map(ToString::to_string).collect())
    }

    fn buffer_name(&self) -> Option<Utf8PathBuf> {
        self.current.clone()
    }

    fn replace_line(
        &mut self,
        source: &SourceId,
        line: usize,
        text: &str,
    ) -> Result<(), HostError> {
        let file = self.file_of(source)?;
        let path = self.vfs_path(&file)?;
        let contents = path.read_to_string()?;

        // splice the one line, keeping every line terminator as written
        let mut out = String::with_capacity(contents.len() + text.len());
        let mut len = 0;
        let mut replaced = false;
        for (idx, raw) in contents.split_inclusive('\n').enumerate() {
            len = idx + 1;
            if len == line {
                let body = raw
                    .strip_suffix("\r\n")
                    .or_else(|| raw.strip_suffix('\n'))
                    .unwrap_or(raw);
                out.push_str(text);
                out.push_str(&raw[body.len()..]);
                replaced = true;
            } else {
                out.push_str(raw);
            }
        }
        if !replaced {
            return Err(HostError::LineOutOfRange {
                source_id: source.clone(),
                line,
                len,
            });
        }
        let mut writer = path.create_file()?;
        writer.write_all(out.as_bytes())?;
        Ok(())
    }

    fn move_cursor(&mut self, source: &SourceId, line: usize) -> Result<(), HostError> {
        self.resolve(source)?;
        let file = self.file_of(source)?;
        self.current = Some(file.clone());
        self.cursor = Some((file, line));
        Ok(())
    }

    fn resolve(&mut self, source: &SourceId) -> Result<(), HostError> {
        let file = self.file_of(source)?;
        self.vfs_path(&file)?;
        if self.current.as_ref() != Some(&file) && !self.loaded.contains(&file) {
            tracing::debug!(file = %file, "loading file in background");
            self.loaded.push(file);
        }
        Ok(())
    }
}
