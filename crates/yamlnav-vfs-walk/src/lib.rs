use camino::Utf8Path;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;
use thiserror::Error;
use vfs::VfsPath;

#[derive(Debug, Error)]
pub enum WalkError {
    #[error("vfs error: {0}")]
    Vfs(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// A directory below the root that could not be listed. The walk goes on
    /// without it.
    #[error("cannot read {path}: {message}")]
    Unreadable { path: String, message: String },
}

impl WalkError {
    fn unreadable(path: &VfsPath, err: &impl std::fmt::Display) -> Self {
        WalkError::Unreadable {
            path: path.as_str().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<vfs::VfsError> for WalkError {
    fn from(err: vfs::VfsError) -> Self {
        WalkError::Vfs(err.to_string())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct WalkOptions {
    pub include_hidden: bool,
    pub standard_filters: bool,
    pub respect_gitignore: bool,
    /// Deepest level yielded; children of the root are level 1.
    pub max_depth: Option<usize>,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            include_hidden: false,
            standard_filters: true,
            respect_gitignore: true,
            max_depth: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WalkEntry {
    pub path: VfsPath,
    pub depth: usize,
    pub is_dir: bool,
}

impl std::ops::Deref for WalkEntry {
    type Target = VfsPath;
    fn deref(&self) -> &Self::Target {
        &self.path
    }
}

pub struct WalkBuilder {
    root: VfsPath,
    opts: WalkOptions,
}

impl WalkBuilder {
    pub fn new(root: VfsPath) -> Self {
        Self {
            root,
            opts: WalkOptions::default(),
        }
    }

    pub fn options(mut self, opts: WalkOptions) -> Self {
        self.opts = opts;
        self
    }

    pub fn hidden(mut self, yes: bool) -> Self {
        self.opts.include_hidden = yes;
        self
    }

    pub fn standard_filters(mut self, yes: bool) -> Self {
        self.opts.standard_filters = yes;
        self
    }

    pub fn git_ignore(mut self, yes: bool) -> Self {
        self.opts.respect_gitignore = yes;
        self
    }

    pub fn max_depth(mut self, depth: Option<usize>) -> Self {
        self.opts.max_depth = depth;
        self
    }

    /// # Errors
    ///
    /// Returns an error if the root does not exist or cannot be listed.
    pub fn build(self) -> Result<Walk, WalkError> {
        Walk::new(self.root, self.opts)
    }
}

struct Frame {
    // children are collected eagerly for deterministic order
    children: Vec<VfsPath>,
    idx: usize,
    depth: usize,
    gitignore: Option<Gitignore>,
}

/// Pre-order walk over a [`VfsPath`] tree, children sorted by path.
pub struct Walk {
    opts: WalkOptions,
    stack: Vec<Frame>,
}

impl Walk {
    fn new(root: VfsPath, opts: WalkOptions) -> Result<Self, WalkError> {
        if !root.exists()? {
            return Err(WalkError::Vfs(format!(
                "root does not exist: {}",
                root.as_str()
            )));
        }
        let mut me = Self {
            opts,
            stack: Vec::new(),
        };
        let top = me.new_frame(&root, 1)?;
        me.stack.push(top);
        Ok(me)
    }

    fn new_frame(&self, dir: &VfsPath, depth: usize) -> Result<Frame, WalkError> {
        let mut children: Vec<VfsPath> = dir.read_dir()?.collect();
        children.sort_by(|a, b| a.as_str().cmp(b.as_str()));

        let gitignore = if self.opts.respect_gitignore {
            load_gitignore(dir)?
        } else {
            None
        };

        Ok(Frame {
            children,
            idx: 0,
            depth,
            gitignore,
        })
    }

    fn standard_skip(&self, name: &str) -> bool {
        self.opts.standard_filters
            && matches!(
                name,
                ".git" | ".hg" | ".svn" | "CVS" | "node_modules" | "target"
            )
    }

    fn ignored_by_git(&self, path: &VfsPath, is_dir: bool) -> bool {
        if !self.opts.respect_gitignore {
            return false;
        }
        // innermost .gitignore first
        let p = Path::new(path.as_str());
        self.stack.iter().rev().any(|f| {
            f.gitignore
                .as_ref()
                .is_some_and(|gi| gi.matched_path_or_any_parents(p, is_dir).is_ignore())
        })
    }
}

fn load_gitignore(dir: &VfsPath) -> Result<Option<Gitignore>, WalkError> {
    let gi_path = dir.join(".gitignore")?;
    if !(gi_path.exists()? && gi_path.is_file()?) {
        return Ok(None);
    }
    let contents = gi_path.read_to_string()?;
    let mut b = GitignoreBuilder::new(Path::new(dir.as_str()));
    for line in contents.lines() {
        // malformed patterns are skipped
        let _ = b.add_line(None, line);
    }
    Ok(b.build().ok())
}

impl Iterator for Walk {
    type Item = Result<WalkEntry, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            if top.idx >= top.children.len() {
                self.stack.pop();
                continue;
            }
            let path = top.children[top.idx].clone();
            let depth = top.depth;
            top.idx += 1;

            let name = Utf8Path::new(path.as_str()).file_name().unwrap_or("");
            if !self.opts.include_hidden && name.starts_with('.') {
                continue;
            }
            if self.standard_skip(name) {
                continue;
            }
            let is_dir = match path.is_dir() {
                Ok(b) => b,
                Err(err) => {
                    tracing::warn!(path = path.as_str(), %err, "skipping unreadable entry");
                    return Some(Err(WalkError::unreadable(&path, &err)));
                }
            };
            if self.ignored_by_git(&path, is_dir) {
                continue;
            }

            let descend = self.opts.max_depth.is_none_or(|max| depth < max);
            if is_dir && descend {
                match self.new_frame(&path, depth + 1) {
                    Ok(frame) => self.stack.push(frame),
                    Err(err) => {
                        tracing::warn!(dir = path.as_str(), %err, "skipping unreadable directory");
                        return Some(Err(WalkError::unreadable(&path, &err)));
                    }
                }
            }
            return Some(Ok(WalkEntry {
                path,
                depth,
                is_dir,
            }));
        }
    }
}

/// Result of [`list_files`].
#[derive(Debug, Clone, Default)]
pub struct Listing {
    /// Accepted files in walk order.
    pub files: Vec<VfsPath>,
    /// Entries below the root that could not be read, as vfs paths.
    pub unreadable: Vec<String>,
}

/// All files under `root` accepted by `predicate`, in walk order.
///
/// Unreadable entries below the root are collected in
/// [`Listing::unreadable`] instead of ending the walk.
///
/// # Errors
///
/// Returns an error if the root is missing or cannot be listed.
pub fn list_files<F>(root: &VfsPath, opts: WalkOptions, mut predicate: F) -> Result<Listing, WalkError>
where
    F: FnMut(&VfsPath) -> bool,
{
    let mut listing = Listing::default();
    for entry in WalkBuilder::new(root.clone()).options(opts).build()? {
        match entry {
            Ok(entry) => {
                if !entry.is_dir && predicate(&entry.path) {
                    listing.files.push(entry.path);
                }
            }
            Err(WalkError::Unreadable { path, .. }) => listing.unreadable.push(path),
            Err(err) => return Err(err),
        }
    }
    Ok(listing)
}

#[cfg(test)]
mod tests {
    use super::{Listing, WalkBuilder, WalkOptions, list_files};
    use color_eyre::eyre;
    use test_util::write;
    use vfs::VfsPath;

    fn tree() -> eyre::Result<VfsPath> {
        let root = VfsPath::new(vfs::MemoryFS::new());
        write(&root.join("a.yaml")?, "a: 1\n")?;
        write(&root.join("sub/b.yaml")?, "b: 1\n")?;
        write(&root.join("sub/deeper/c.yaml")?, "c: 1\n")?;
        write(&root.join(".hidden/d.yaml")?, "d: 1\n")?;
        write(&root.join("node_modules/e.yaml")?, "e: 1\n")?;
        Ok(root)
    }

    fn names(listing: &Listing) -> Vec<&str> {
        listing.files.iter().map(VfsPath::as_str).collect()
    }

    #[test]
    fn walks_in_sorted_pre_order() -> eyre::Result<()> {
        let root = tree()?;
        let entries: Vec<(String, usize)> = WalkBuilder::new(root)
            .build()?
            .map(|e| e.map(|e| (e.path.as_str().to_string(), e.depth)))
            .collect::<Result<_, _>>()?;
        assert_eq!(
            entries,
            vec![
                ("/a.yaml".to_string(), 1),
                ("/sub".to_string(), 1),
                ("/sub/b.yaml".to_string(), 2),
                ("/sub/deeper".to_string(), 2),
                ("/sub/deeper/c.yaml".to_string(), 3),
            ]
        );
        Ok(())
    }

    #[test]
    fn depth_limit_stops_descent() -> eyre::Result<()> {
        let root = tree()?;
        let opts = WalkOptions {
            max_depth: Some(2),
            ..WalkOptions::default()
        };
        let files = list_files(&root, opts, |_| true)?;
        assert_eq!(names(&files), vec!["/a.yaml", "/sub/b.yaml"]);

        let opts = WalkOptions {
            max_depth: Some(1),
            ..WalkOptions::default()
        };
        let files = list_files(&root, opts, |_| true)?;
        assert_eq!(names(&files), vec!["/a.yaml"]);
        Ok(())
    }

    #[test]
    fn hidden_and_standard_filters_can_be_disabled() -> eyre::Result<()> {
        let root = tree()?;
        let opts = WalkOptions {
            include_hidden: true,
            standard_filters: false,
            ..WalkOptions::default()
        };
        let files = list_files(&root, opts, |_| true)?;
        assert!(names(&files).contains(&"/.hidden/d.yaml"));
        assert!(names(&files).contains(&"/node_modules/e.yaml"));
        Ok(())
    }

    #[test]
    fn respects_gitignore() -> eyre::Result<()> {
        let root = tree()?;
        write(&root.join(".gitignore")?, "deeper/\n")?;
        let files = list_files(&root, WalkOptions::default(), |_| true)?;
        assert_eq!(names(&files), vec!["/a.yaml", "/sub/b.yaml"]);
        Ok(())
    }

    #[test]
    fn unlistable_directories_are_skipped() -> eyre::Result<()> {
        let root = VfsPath::new(test_util::UnlistableFS::new(&["/sub/deeper"]));
        write(&root.join("a.yaml")?, "a: 1\n")?;
        write(&root.join("sub/b.yaml")?, "b: 1\n")?;
        write(&root.join("sub/deeper/c.yaml")?, "c: 1\n")?;

        let listing = list_files(&root, WalkOptions::default(), |_| true)?;
        assert_eq!(names(&listing), vec!["/a.yaml", "/sub/b.yaml"]);
        assert_eq!(listing.unreadable, vec!["/sub/deeper".to_string()]);
        Ok(())
    }

    #[test]
    fn unlistable_root_is_an_error() {
        let root = VfsPath::new(test_util::UnlistableFS::new(&[""]));
        assert!(list_files(&root, WalkOptions::default(), |_| true).is_err());
    }

    #[test]
    fn missing_root_is_an_error() -> eyre::Result<()> {
        let root = VfsPath::new(vfs::MemoryFS::new()).join("missing")?;
        assert!(WalkBuilder::new(root).build().is_err());
        Ok(())
    }
}
