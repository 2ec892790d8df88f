//! Discovery and indexing of every YAML file below a project root.

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use vfs::VfsPath;
use yamlnav_core::{FileMeta, PathEntry, StructuredParser, ValueEntry};
use yamlnav_vfs_walk::{WalkError, WalkOptions, list_files};

pub use yamlnav_vfs_walk::Listing;

pub const DEFAULT_MAX_DEPTH: usize = 10;
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Walk(#[from] WalkError),

    #[error("vfs error: {0}")]
    Vfs(#[from] vfs::VfsError),

    #[error("{path} is {size} bytes, above the {limit} byte limit")]
    TooLarge {
        path: Utf8PathBuf,
        size: u64,
        limit: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    pub max_depth: usize,
    pub max_file_size: u64,
    /// Extensions without the leading dot, compared case-insensitively.
    pub extensions: Vec<String>,
    pub include_hidden: bool,
    pub respect_gitignore: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            extensions: vec!["yaml".to_string(), "yml".to_string()],
            include_hidden: false,
            respect_gitignore: true,
        }
    }
}

impl ScanOptions {
    fn walk_options(&self) -> WalkOptions {
        WalkOptions {
            include_hidden: self.include_hidden,
            standard_filters: true,
            respect_gitignore: self.respect_gitignore,
            max_depth: Some(self.max_depth),
        }
    }

    #[must_use]
    pub fn is_yaml(&self, path: &VfsPath) -> bool {
        Utf8Path::new(path.as_str())
            .extension()
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }
}

/// Everything found in one project scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectIndex {
    pub files: Vec<FileMeta>,
    pub paths: Vec<PathEntry>,
    pub values: Vec<ValueEntry>,
    /// Files that could not be read or were above the size limit, and
    /// directories that could not be listed.
    pub skipped: Vec<Utf8PathBuf>,
}

impl ProjectIndex {
    /// Append the results of one file, tagging every entry with `meta`.
    pub fn extend_file(&mut self, meta: &FileMeta, paths: &[PathEntry], values: &[ValueEntry]) {
        self.paths
            .extend(paths.iter().cloned().map(|e| e.with_file(meta.clone())));
        self.values
            .extend(values.iter().cloned().map(|e| e.with_file(meta.clone())));
        self.files.push(meta.clone());
    }
}

#[derive(Debug, Clone)]
pub struct ProjectScanner {
    root: VfsPath,
    base_dir: Utf8PathBuf,
    opts: ScanOptions,
}

impl ProjectScanner {
    /// Scanner over `root`, reporting absolute paths below `base_dir`.
    #[must_use]
    pub fn new(root: VfsPath, base_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            root,
            base_dir: base_dir.into(),
            opts: ScanOptions::default(),
        }
    }

    /// Scanner over a directory on disk.
    #[must_use]
    pub fn physical(dir: &Utf8Path) -> Self {
        let base_dir = dir
            .canonicalize_utf8()
            .unwrap_or_else(|_| dir.to_path_buf());
        let root = VfsPath::new(vfs::PhysicalFS::new(base_dir.as_std_path()));
        Self::new(root, base_dir)
    }

    #[must_use]
    pub fn with_options(mut self, opts: ScanOptions) -> Self {
        self.opts = opts;
        self
    }

    #[must_use]
    pub fn options(&self) -> &ScanOptions {
        &self.opts
    }

    #[must_use]
    pub fn base_dir(&self) -> &Utf8Path {
        &self.base_dir
    }

    /// YAML files below the root plus the directories that could not be
    /// listed, which are logged and left out.
    ///
    /// # Errors
    ///
    /// Returns an error if the root is missing or cannot be listed.
    pub fn list_yaml_files(&self) -> Result<Listing, ScanError> {
        let listing = list_files(&self.root, self.opts.walk_options(), |p| self.opts.is_yaml(p))?;
        Ok(listing)
    }

    /// YAML files below the root, in deterministic walk order.
    ///
    /// # Errors
    ///
    /// Returns an error if the root is missing or cannot be listed.
    pub fn find_yaml_files(&self) -> Result<Vec<VfsPath>, ScanError> {
        Ok(self.list_yaml_files()?.files)
    }

    /// Absolute path of a vfs path below the root.
    #[must_use]
    pub fn absolute(&self, vfs_path: &str) -> Utf8PathBuf {
        self.base_dir.join(vfs_path.trim_start_matches('/'))
    }

    #[must_use]
    pub fn file_meta(&self, path: &VfsPath) -> FileMeta {
        FileMeta::new(&self.base_dir, self.absolute(path.as_str()))
    }

    /// Contents of `path` as lines, refusing files above the size limit
    /// before reading them.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is too large or cannot be read.
    pub fn read_lines(&self, path: &VfsPath) -> Result<Vec<String>, ScanError> {
        let size = path.metadata()?.len;
        if size > self.opts.max_file_size {
            return Err(ScanError::TooLarge {
                path: self.file_meta(path).file_path,
                size,
                limit: self.opts.max_file_size,
            });
        }
        let contents = path.read_to_string()?;
        Ok(contents.lines().map(ToString::to_string).collect())
    }

    /// Index every YAML file, without caching.
    ///
    /// Unreadable and oversized files, and directories that cannot be listed,
    /// are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error only if the project root cannot be listed.
    pub fn scan(&self, parser: Option<&dyn StructuredParser>) -> Result<ProjectIndex, ScanError> {
        let listing = self.list_yaml_files()?;
        let mut index = ProjectIndex {
            skipped: listing.unreadable.iter().map(|p| self.absolute(p)).collect(),
            ..ProjectIndex::default()
        };
        for path in listing.files {
            let meta = self.file_meta(&path);
            let lines = match self.read_lines(&path) {
                Ok(lines) => lines,
                Err(err) => {
                    tracing::warn!(file = %meta.file_path, %err, "skipping file");
                    index.skipped.push(meta.file_path);
                    continue;
                }
            };
            let paths = yamlnav_core::extract_paths(&lines, parser);
            let values = yamlnav_core::extract_values(&lines, parser);
            index.extend_file(&meta, &paths, &values);
        }
        tracing::info!(
            files = index.files.len(),
            paths = index.paths.len(),
            values = index.values.len(),
            skipped = index.skipped.len(),
            "scanned project"
        );
        Ok(index)
    }
}

/// YAML files under `root`, descending at most `depth_limit` levels.
///
/// # Errors
///
/// Returns an error if the root is missing or cannot be listed.
pub fn find_yaml_files(root: &VfsPath, depth_limit: usize) -> Result<Vec<VfsPath>, ScanError> {
    let opts = ScanOptions {
        max_depth: depth_limit,
        ..ScanOptions::default()
    };
    ProjectScanner::new(root.clone(), "/")
        .with_options(opts)
        .find_yaml_files()
}
