// Directory iteration module
// Lazy, batched, symlink-aware traversal that keeps memory bounded on very wide directories

use super::error::HashUtilityError;
use super::path_utils;
use std::collections::VecDeque;
use std::fs::{self, DirEntry, ReadDir};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Number of directory entries buffered per read
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// What a traversal yields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkMode {
    /// Files (and unfollowed symlinks), never directories
    FilesOnly,
    /// Only directories without subdirectories
    LeafDirs,
    /// Every directory, after its descendants
    AllDirs,
}

/// A path together with the facts traversal derived about it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    pub path: PathBuf,
    pub is_dir: bool,
    pub is_symlink: bool,
    /// Final target when the entry is a followed symlink
    pub target: Option<PathBuf>,
}

impl PathEntry {
    /// Classify `path` without going through a directory listing
    ///
    /// Symlinks are resolved only when `follow_symlinks` is set; an unfollowed
    /// link is reported as a non-directory leaf.
    pub fn from_path(path: &Path, follow_symlinks: bool) -> Result<Self, HashUtilityError> {
        let meta = fs::symlink_metadata(path).map_err(|e| {
            HashUtilityError::from_io_error(e, "reading metadata of", Some(path.to_path_buf()))
        })?;

        if meta.file_type().is_symlink() && follow_symlinks {
            let (target, is_dir) = resolve_link(path)?;
            return Ok(Self {
                path: path.to_path_buf(),
                is_dir,
                is_symlink: true,
                target: Some(target),
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            is_dir: meta.is_dir(),
            is_symlink: meta.file_type().is_symlink(),
            target: None,
        })
    }

    /// The path to use from here on: the resolved target for followed links
    pub fn effective_path(&self) -> &Path {
        self.target.as_deref().unwrap_or(&self.path)
    }
}

/// Follow a symlink chain to its final target and report whether that is a directory
fn resolve_link(path: &Path) -> Result<(PathBuf, bool), HashUtilityError> {
    let unresolved = |e: io::Error| HashUtilityError::SymlinkUnresolved {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };
    let target = path_utils::eval_symlinks(path).map_err(unresolved)?;
    let meta = fs::metadata(&target).map_err(unresolved)?;
    Ok((target, meta.is_dir()))
}

/// Traversal settings; cheap to clone, shared by every walk it starts
#[derive(Debug, Clone)]
pub struct DirIter {
    /// How many directory entries are read at once
    pub batch_size: usize,
    pub follow_symlinks: bool,
    /// Depth of the deepest entries yielded; root children are depth 1
    pub max_depth: Option<usize>,
}

impl Default for DirIter {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            follow_symlinks: false,
            max_depth: None,
        }
    }
}

impl DirIter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Walk `root` depth-first yielding files only
    ///
    /// With `follow_symlinks`, a link to a directory is descended through its
    /// resolved path and a link to a file yields the resolved path. The same
    /// file can therefore appear once per distinct chain of links leading to it;
    /// callers that need unique files must deduplicate.
    pub fn files_only(&self, root: impl Into<PathBuf>) -> Walk {
        Walk::new(self.clone(), WalkMode::FilesOnly, root.into())
    }

    /// Walk `root` yielding only leaf directories
    pub fn leaf_dirs(&self, root: impl Into<PathBuf>) -> Walk {
        Walk::new(self.clone(), WalkMode::LeafDirs, root.into())
    }

    /// Walk `root` yielding every directory in post-order, the root last
    pub fn all_dirs(&self, root: impl Into<PathBuf>) -> Walk {
        Walk::new(self.clone(), WalkMode::AllDirs, root.into())
    }

    fn may_descend(&self, depth: usize) -> bool {
        self.max_depth.map_or(true, |max| depth < max)
    }
}

/// One open directory on the traversal stack
///
/// Dropping the frame closes its directory handle, so abandoning a `Walk`
/// part way releases every handle it holds.
struct Frame {
    path: PathBuf,
    depth: usize,
    entries: Option<ReadDir>,
    batch: VecDeque<io::Result<DirEntry>>,
    has_subdirs: bool,
}

impl Frame {
    fn open(path: PathBuf, depth: usize) -> Result<Self, HashUtilityError> {
        let entries = fs::read_dir(&path).map_err(|e| {
            HashUtilityError::from_io_error(e, "reading directory", Some(path.clone()))
        })?;
        trace!(path = %path.display(), depth, "opened directory");
        Ok(Self {
            path,
            depth,
            entries: Some(entries),
            batch: VecDeque::new(),
            has_subdirs: false,
        })
    }

    fn next_entry(&mut self, batch_size: usize) -> Option<io::Result<DirEntry>> {
        if self.batch.is_empty() {
            self.refill(batch_size);
        }
        self.batch.pop_front()
    }

    fn refill(&mut self, batch_size: usize) {
        let Some(entries) = self.entries.as_mut() else {
            return;
        };

        let mut exhausted = false;
        while self.batch.len() < batch_size {
            match entries.next() {
                Some(entry) => self.batch.push_back(entry),
                None => {
                    exhausted = true;
                    break;
                }
            }
        }

        // close the handle as soon as the listing is drained
        if exhausted {
            self.entries = None;
        }
    }
}

/// Pull-based traversal started by `DirIter`
///
/// Yields `Ok(path)` for each selected entry and `Err` for each path that could
/// not be read; an error does not end the walk unless it concerns the root.
pub struct Walk {
    config: DirIter,
    mode: WalkMode,
    root: Option<PathBuf>,
    stack: Vec<Frame>,
}

impl Walk {
    fn new(config: DirIter, mode: WalkMode, root: PathBuf) -> Self {
        Self {
            config,
            mode,
            root: Some(root),
            stack: Vec::new(),
        }
    }

    /// Number of directories currently held open
    pub fn open_dirs(&self) -> usize {
        self.stack.iter().filter(|f| f.entries.is_some()).count()
    }

    fn yields_files(&self) -> bool {
        self.mode == WalkMode::FilesOnly
    }

    /// Decide what a fully listed directory contributes
    fn finish_dir(&self, frame: Frame) -> Option<PathBuf> {
        match self.mode {
            WalkMode::FilesOnly => None,
            WalkMode::LeafDirs if frame.has_subdirs => None,
            WalkMode::LeafDirs | WalkMode::AllDirs => Some(frame.path),
        }
    }

    fn visit(
        &mut self,
        entry: DirEntry,
        path: PathBuf,
        parent_depth: usize,
    ) -> Option<Result<PathBuf, HashUtilityError>> {
        let file_type = match entry.file_type() {
            Ok(t) => t,
            Err(e) => {
                return Some(Err(HashUtilityError::from_io_error(
                    e,
                    "reading metadata of",
                    Some(path),
                )))
            }
        };

        let (path, is_dir, is_file) = if file_type.is_symlink() {
            if !self.config.follow_symlinks {
                // unfollowed links are leaves in their own right
                return self.yields_files().then_some(Ok(path));
            }
            match resolve_link(&path) {
                Ok((target, is_dir)) => {
                    trace!(link = %path.display(), target = %target.display(), "followed symlink");
                    (target, is_dir, !is_dir)
                }
                Err(e) => return Some(Err(e)),
            }
        } else {
            (path, file_type.is_dir(), file_type.is_file())
        };

        if !is_dir {
            if !is_file {
                debug!(path = %path.display(), "skipping special file");
                return None;
            }
            return self.yields_files().then_some(Ok(path));
        }

        if let Some(parent) = self.stack.last_mut() {
            parent.has_subdirs = true;
        }

        let depth = parent_depth + 1;
        if !self.config.may_descend(depth) {
            trace!(path = %path.display(), depth, "depth limit reached");
            return (!self.yields_files()).then_some(Ok(path));
        }

        match Frame::open(path, depth) {
            Ok(frame) => {
                self.stack.push(frame);
                None
            }
            Err(e) => Some(Err(e)),
        }
    }
}

impl Iterator for Walk {
    type Item = Result<PathBuf, HashUtilityError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(root) = self.root.take() {
            match Frame::open(root, 0) {
                Ok(frame) => self.stack.push(frame),
                Err(e) => return Some(Err(e)),
            }
        }

        let batch_size = self.config.batch_size.max(1);
        loop {
            let frame = self.stack.last_mut()?;
            let parent_depth = frame.depth;

            let entry = match frame.next_entry(batch_size) {
                Some(Ok(entry)) => entry,
                Some(Err(e)) => {
                    let dir = frame.path.clone();
                    return Some(Err(HashUtilityError::from_io_error(
                        e,
                        "reading directory",
                        Some(dir),
                    )));
                }
                None => {
                    let done = self.stack.pop()?;
                    if let Some(path) = self.finish_dir(done) {
                        return Some(Ok(path));
                    }
                    continue;
                }
            };

            let path = path_utils::child_path(&frame.path, &entry.file_name());
            if let Some(item) = self.visit(entry, path, parent_depth) {
                return Some(item);
            }
        }
    }
}
