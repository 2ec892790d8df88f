use std::path::PathBuf;
use std::sync::Once;

use color_eyre::eyre;
use vfs::{FileSystem, VfsPath};

pub mod prelude {
    pub use crate::matchers::*;
    pub use crate::write;
    pub use crate::{Builder, LogLevel};
    pub use googletest::{assert_that, matcher::MatcherBase, matchers::*};
    pub use similar_asserts::assert_eq as sim_assert_eq;
}

/// Returns the workspace root directory via the `CARGO_WORKSPACE_DIR` env var
/// set in `.cargo/config.toml`.
///
/// # Panics
///
/// Panics if `CARGO_WORKSPACE_DIR` is not set.
#[must_use]
pub fn workspace_root() -> PathBuf {
    PathBuf::from(
        std::env::var("CARGO_WORKSPACE_DIR")
            .expect("CARGO_WORKSPACE_DIR must be set in .cargo/config.toml"),
    )
}

/// Returns the path to the workspace `testdata/` directory.
#[must_use]
pub fn workspace_testdata() -> PathBuf {
    workspace_root().join("testdata")
}

/// Reads a file relative to the workspace `testdata/` directory.
///
/// # Panics
///
/// Panics if the file cannot be read.
#[must_use]
pub fn read_testdata(relative_path: &str) -> String {
    let path = workspace_testdata().join(relative_path);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
}

/// Reads a testdata file as owned lines, the shape hosts hand to the scanner.
///
/// # Panics
///
/// Panics if the file cannot be read.
#[must_use]
pub fn read_testdata_lines(relative_path: &str) -> Vec<String> {
    read_testdata(relative_path)
        .lines()
        .map(ToString::to_string)
        .collect()
}

/// Write `data` into the virtual filesystem at `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write(path: &VfsPath, data: impl AsRef<[u8]>) -> eyre::Result<VfsPath> {
    use std::io::Write;
    let _ = path.parent().create_dir_all();
    let mut file = path.create_file()?;
    file.write_all(data.as_ref())?;
    Ok(path.clone())
}

/// In-memory filesystem that refuses to list some directories.
///
/// Directories are given as vfs paths (`""` is the root, `"/sub"` a child).
#[derive(Debug)]
pub struct UnlistableFS {
    inner: vfs::MemoryFS,
    locked: Vec<String>,
}

impl UnlistableFS {
    #[must_use]
    pub fn new(locked: &[&str]) -> Self {
        Self {
            inner: vfs::MemoryFS::new(),
            locked: locked.iter().map(ToString::to_string).collect(),
        }
    }
}

impl FileSystem for UnlistableFS {
    fn read_dir(&self, path: &str) -> vfs::VfsResult<Box<dyn Iterator<Item = String> + Send>> {
        if self.locked.iter().any(|locked| locked == path) {
            return Err(vfs::error::VfsErrorKind::Other("permission denied".to_string()).into());
        }
        self.inner.read_dir(path)
    }

    fn create_dir(&self, path: &str) -> vfs::VfsResult<()> {
        self.inner.create_dir(path)
    }

    fn open_file(&self, path: &str) -> vfs::VfsResult<Box<dyn vfs::SeekAndRead + Send>> {
        self.inner.open_file(path)
    }

    fn create_file(&self, path: &str) -> vfs::VfsResult<Box<dyn vfs::SeekAndWrite + Send>> {
        self.inner.create_file(path)
    }

    fn append_file(&self, path: &str) -> vfs::VfsResult<Box<dyn vfs::SeekAndWrite + Send>> {
        self.inner.append_file(path)
    }

    fn metadata(&self, path: &str) -> vfs::VfsResult<vfs::VfsMetadata> {
        self.inner.metadata(path)
    }

    fn exists(&self, path: &str) -> vfs::VfsResult<bool> {
        self.inner.exists(path)
    }

    fn remove_file(&self, path: &str) -> vfs::VfsResult<()> {
        self.inner.remove_file(path)
    }

    fn remove_dir(&self, path: &str) -> vfs::VfsResult<()> {
        self.inner.remove_dir(path)
    }
}

pub type LogLevel = tracing::metadata::Level;

static INIT_EYRE: Once = Once::new();
static INIT_TRACING: Once = Once::new();

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Builder {
    setup_tracing: bool,
    install_eyre: bool,
    env_filter: Option<String>,
    log_level: LogLevel,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            setup_tracing: true,
            install_eyre: true,
            env_filter: None,
            log_level: LogLevel::DEBUG,
        }
    }
}

impl Builder {
    /// Initialize test.
    ///
    /// This ensures `color_eyre` and the tracing subscriber are set up once
    /// per test binary.
    ///
    /// # Panics
    ///
    /// Panics if `color_eyre` installation fails.
    pub fn build(self) {
        if self.install_eyre {
            INIT_EYRE.call_once(|| {
                color_eyre::install().expect("failed to install eyre");
            });
        }
        if self.setup_tracing {
            let directive = self
                .env_filter
                .clone()
                .unwrap_or_else(|| self.log_level.to_string().to_ascii_lowercase());
            INIT_TRACING.call_once(move || {
                let filter = tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(directive));
                // another harness may already own the global subscriber
                let _ = tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_test_writer()
                    .without_time()
                    .try_init();
            });
        }
    }

    /// Toggle setting up tracing inside the test.
    #[must_use]
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.setup_tracing = enabled;
        self
    }

    /// Toggle log level for tracing inside the test.
    #[must_use]
    pub fn with_log_level(mut self, log_level: impl Into<LogLevel>) -> Self {
        self.log_level = log_level.into();
        self
    }

    /// Toggle installation of `color_eyre`.
    #[must_use]
    pub fn with_eyre(mut self, enabled: bool) -> Self {
        self.install_eyre = enabled;
        self
    }

    /// Configure the tracing subscribers env filter.
    ///
    /// Requires tracing to be enabled with `Self::with_tracing`.
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }
}

/// Create a new builder.
#[must_use]
pub fn builder() -> Builder {
    Builder::default()
}

pub mod matchers {
    use googletest::matchers::{ContainsMatcher, contains, predicate};
    use yamlnav_core::{PathEntry, ValueEntry};

    /// Matches a path entry rendered as `path` in dot notation.
    #[must_use]
    pub fn has_path<'a>(path: &str) -> impl googletest::matcher::Matcher<&'a PathEntry> {
        let path = path.to_string();
        predicate(move |e: &PathEntry| e.path.to_string() == path)
    }

    #[must_use]
    pub fn contains_path<'a>(
        path: &str,
    ) -> ContainsMatcher<impl googletest::matcher::Matcher<&'a PathEntry>> {
        contains(has_path(path))
    }

    /// Matches a value entry at `path` holding `value`.
    #[must_use]
    pub fn has_value<'a>(
        path: &str,
        value: &str,
    ) -> impl googletest::matcher::Matcher<&'a ValueEntry> {
        let (path, value) = (path.to_string(), value.to_string());
        predicate(move |e: &ValueEntry| e.path.to_string() == path && e.value == value)
    }
}
