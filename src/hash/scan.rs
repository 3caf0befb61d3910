// Directory scanning module
// Builds the working set from targets or a path list, then drives the checksum pipeline

use super::error::HashUtilityError;
use super::exclude::PathFilter;
use super::hash::HashComputer;
use super::path_utils;
use super::pipeline::{ChecksumResult, WorkerPool};
use super::report::{Report, ScanStats};
use super::walk::{DirIter, PathEntry};
use crate::config::{ScanConfig, TargetSource};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Paths selected for hashing, each exactly once
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingSet(BTreeSet<PathBuf>);

impl WorkingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a path; returns false if it was already present
    pub fn insert(&mut self, path: PathBuf) -> bool {
        self.0.insert(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.0.contains(path)
    }

    /// Drop "." and "..", which are never hashed
    pub fn remove_dot_entries(&mut self) {
        self.0.retain(|p| !path_utils::is_dot_entry(p));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<PathBuf> {
        self.0.into_iter().collect()
    }
}

impl FromIterator<PathBuf> for WorkingSet {
    fn from_iter<I: IntoIterator<Item = PathBuf>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Engine for building a working set and checksumming it
pub struct ScanEngine {
    config: ScanConfig,
    computer: HashComputer,
    filter: PathFilter,
    walker: DirIter,
}

impl ScanEngine {
    /// Create an engine; every component is derived from `config` once, here
    pub fn new(config: ScanConfig) -> Self {
        Self {
            computer: config.hash_computer(),
            filter: config.path_filter(),
            walker: config.dir_iter(),
            config,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn computer(&self) -> &HashComputer {
        &self.computer
    }

    /// Run the whole scan and return the sorted report
    ///
    /// # Errors
    /// Returns configuration and root-level enumeration failures; per-file
    /// hashing failures are logged and only reflected in the statistics.
    pub fn run(&self) -> Result<Report, HashUtilityError> {
        match &self.config.source {
            TargetSource::SingleFile(path) => self.checksum_single(path),
            TargetSource::Walk | TargetSource::Stdin => {
                let set = self.collect_files()?;
                self.checksum(set)
            }
        }
    }

    /// Build the working set from the configured source
    pub fn collect_files(&self) -> Result<WorkingSet, HashUtilityError> {
        match &self.config.source {
            TargetSource::Walk => self.collect_from_targets(),
            TargetSource::Stdin => {
                let stdin = io::stdin();
                self.collect_from_reader(stdin.lock())
            }
            TargetSource::SingleFile(path) => Ok(std::iter::once(path.clone()).collect()),
        }
    }

    /// Enumerate every target
    ///
    /// A target naming a directory is walked directly. Any other target lists
    /// its parent directory once, keeping the entries the path filter admits
    /// and walking the subdirectories when recursion is on.
    ///
    /// # Errors
    /// Fails when a listed parent directory or an explicitly named directory
    /// cannot be read.
    pub fn collect_from_targets(&self) -> Result<WorkingSet, HashUtilityError> {
        let mut set = WorkingSet::new();
        let mut listed: HashSet<PathBuf> = HashSet::new();

        for target in &self.config.targets {
            let target_path = Path::new(target);
            if let Ok(entry) = PathEntry::from_path(target_path, self.config.follow_symlinks) {
                if entry.is_dir {
                    debug!(target = %target, "walking directory target");
                    self.walk_root(entry.effective_path(), true, false, &mut set)?;
                    continue;
                }
            }

            let dir = path_utils::parent_dir(target_path);
            if listed.insert(dir.clone()) {
                self.list_top_level(&dir, &mut set)?;
            }
        }

        set.remove_dot_entries();
        debug!(files = set.len(), "working set built");
        Ok(set)
    }

    /// Classify the immediate entries of a target's parent directory
    fn list_top_level(&self, dir: &Path, set: &mut WorkingSet) -> Result<(), HashUtilityError> {
        let entries = fs::read_dir(dir).map_err(|e| {
            HashUtilityError::from_io_error(e, "reading directory", Some(dir.to_path_buf()))
        })?;

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(dir = %dir.display(), "skipping unreadable entry: {}", e);
                    continue;
                }
            };
            let path = path_utils::child_path(dir, &entry.file_name());
            let file_type = match entry.file_type() {
                Ok(t) => t,
                Err(e) => {
                    warn!(path = %path.display(), "cannot stat: {}", e);
                    continue;
                }
            };

            if file_type.is_symlink() && self.config.follow_symlinks {
                match PathEntry::from_path(&path, true) {
                    Ok(resolved) if resolved.is_dir => {
                        if self.config.recursive {
                            self.walk_root(resolved.effective_path(), false, true, set)?;
                        }
                    }
                    Ok(resolved) => self.admit(resolved.effective_path().to_path_buf(), set),
                    // hashed by its target string later
                    Err(HashUtilityError::SymlinkUnresolved { .. }) => self.admit(path, set),
                    Err(e) => warn!("{}", e),
                }
            } else if file_type.is_dir() {
                if self.config.recursive && !path_utils::is_dot_entry(&path) {
                    self.walk_root(&path, false, true, set)?;
                }
            } else if file_type.is_file() || file_type.is_symlink() {
                self.admit(path, set);
            } else {
                debug!(path = %path.display(), "skipping special file");
            }
        }
        Ok(())
    }

    /// Walk one root, adding every admitted file to `set`
    ///
    /// `explicit` marks a root the user named; failing to open it is fatal.
    /// Roots discovered while listing are skipped with a warning instead.
    /// `check_inclusion` is off for explicit roots, whose files all lie
    /// under a named target.
    fn walk_root(
        &self,
        root: &Path,
        explicit: bool,
        check_inclusion: bool,
        set: &mut WorkingSet,
    ) -> Result<(), HashUtilityError> {
        let mut first = true;
        for item in self.walker.files_only(root) {
            let at_root = std::mem::replace(&mut first, false);
            match item {
                Ok(path) => {
                    if check_inclusion {
                        self.admit(path, set);
                    } else if !self.filter.exclusions.is_excluded(&path) {
                        set.insert(path);
                    }
                }
                Err(HashUtilityError::SymlinkUnresolved { path, reason }) => {
                    debug!(path = %path.display(), "unresolved symlink kept as leaf: {}", reason);
                    if check_inclusion {
                        self.admit(path, set);
                    } else if !self.filter.exclusions.is_excluded(&path) {
                        set.insert(path);
                    }
                }
                Err(e) if at_root && e.path().map(PathBuf::as_path) == Some(root) => {
                    if explicit {
                        return Err(e);
                    }
                    warn!("skipping {}: {}", root.display(), e);
                    return Ok(());
                }
                Err(e) => warn!("{}", e),
            }
        }
        Ok(())
    }

    fn admit(&self, path: PathBuf, set: &mut WorkingSet) {
        if self.filter.keep(&path) {
            set.insert(path);
        } else {
            debug!(path = %path.display(), "filtered out");
        }
    }

    /// Read newline separated paths
    ///
    /// Empty lines, paths that cannot be stat'ed, and directories are skipped.
    /// Only the exclusion rules apply; nothing is walked.
    pub fn collect_from_reader<R: BufRead>(&self, reader: R) -> Result<WorkingSet, HashUtilityError> {
        let mut set = WorkingSet::new();
        for line in reader.lines() {
            let line = line.map_err(|e| HashUtilityError::from_io_error(e, "reading path list", None))?;
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }

            let path = PathBuf::from(line);
            match fs::metadata(&path) {
                Ok(meta) if meta.is_dir() => continue,
                Ok(_) => {}
                Err(e) => {
                    debug!(path = %path.display(), "skipping: {}", e);
                    continue;
                }
            }
            if !self.filter.exclusions.is_excluded(&path) {
                set.insert(path);
            }
        }
        set.remove_dot_entries();
        Ok(set)
    }

    /// Checksum a working set and assemble the sorted report
    pub fn checksum(&self, set: WorkingSet) -> Result<Report, HashUtilityError> {
        let files = set.into_vec();
        let files_total = files.len();

        let progress = self.progress_bar(files_total as u64);
        let pool = WorkerPool::new(self.config.workers)
            .with_queue_capacity(self.config.queue_capacity)
            .with_progress(progress.clone());

        let start = Instant::now();
        let outcome = pool.run(files, &self.computer)?;
        progress.finish_and_clear();

        let stats = ScanStats {
            files_total,
            files_hashed: outcome.results.len(),
            files_failed: outcome.failed,
            bytes_hashed: outcome.bytes_hashed,
            duration: start.elapsed(),
        };
        info!(
            files = stats.files_hashed,
            failed = stats.files_failed,
            bytes = stats.bytes_hashed,
            elapsed = format!("{:.2}s", stats.duration.as_secs_f64()),
            "scan complete"
        );

        Ok(Report::from_results(outcome.results, &self.computer).with_stats(stats))
    }

    /// Checksum exactly one path, bypassing traversal and exclusion
    ///
    /// # Errors
    /// Any failure to hash `path` is returned; there is nothing else to report.
    pub fn checksum_single(&self, path: &Path) -> Result<Report, HashUtilityError> {
        let start = Instant::now();
        let hashed = self.computer.compute_digest(path)?;
        let duration = start.elapsed();

        let stats = ScanStats {
            files_total: 1,
            files_hashed: 1,
            files_failed: 0,
            bytes_hashed: hashed.bytes,
            duration,
        };
        info!(
            path = %path.display(),
            mib = format!("{:.2}", hashed.bytes as f64 / 1_048_576.0),
            elapsed = format!("{:.3}s", duration.as_secs_f64()),
            rate = format!("{:.2} MiB/s", stats.throughput_mbps()),
            "hashed single file"
        );

        let result = ChecksumResult::new(path, hashed.encoded);
        Ok(Report::from_results(vec![result], &self.computer).with_stats(stats))
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.config.progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        let style = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%)")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        pb.set_style(style);
        pb
    }
}
