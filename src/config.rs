//! Configuration types for treesum
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - The immutable `ScanConfig` every scan component is built from

use crate::hash::error::HashUtilityError;
use crate::hash::exclude::{ExclusionRules, InclusionFilter, PathFilter, RuleOverride, MATCH_ALL};
use crate::hash::hash::{DigestEncoding, HashComputer};
use crate::hash::pipeline::DEFAULT_QUEUE_CAPACITY;
use crate::hash::report::ColumnOrder;
use crate::hash::walk::{DirIter, DEFAULT_BATCH_SIZE};
use crate::hash::wildcard;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Upper bound on worker threads
const MAX_WORKERS: usize = 1024;

fn default_workers() -> usize {
    num_cpus::get().max(1)
}

/// Checksum every file under one or more roots with BLAKE3
#[derive(Parser, Debug, Clone)]
#[command(
    name = "treesum",
    version,
    about = "Checksum directory trees with BLAKE3",
    long_about = "Walks the given targets, computes a BLAKE3 checksum for every file in parallel,\n\
                  and prints them sorted by path followed by a hash of hashes over the whole set.\n\n\
                  Targets are file names, directories, or glob patterns. With no targets,\n\
                  everything in the current directory is summed.",
    after_help = "EXAMPLES:\n    \
        treesum -r                      # everything below the current directory\n    \
        treesum -r --hex src docs       # two trees, hex digests\n    \
        treesum -r -x '' --xs ''        # no default exclusions\n    \
        find . -name '*.rs' | treesum -i\n    \
        treesum -f big.iso              # one file, no walking"
)]
pub struct CliArgs {
    /// Files, directories, or glob patterns (default: everything in the current directory)
    #[arg(value_name = "TARGET")]
    pub targets: Vec<String>,

    /// File name prefix to exclude; repeatable, comma separated (default '_', '' for none)
    #[arg(short = 'x', long = "exclude-prefix", value_name = "PREFIX", action = ArgAction::Append)]
    pub exclude_prefix: Vec<String>,

    /// File name suffix to exclude; repeatable, comma separated (default '~', '' for none)
    #[arg(long = "exclude-suffix", visible_alias = "xs", value_name = "SUFFIX", action = ArgAction::Append)]
    pub exclude_suffix: Vec<String>,

    /// Checksum sub-directories recursively
    #[arg(short = 'r', long)]
    pub recursive: bool,

    /// Do not follow symlinks; a link is summed by the path it points to
    #[arg(long)]
    pub nosym: bool,

    /// Bind each file's modification time into its checksum
    #[arg(long = "modtime", visible_alias = "mt")]
    pub modtime: bool,

    /// Print hex digests instead of the tagged base64 form
    #[arg(long)]
    pub hex: bool,

    /// Sortable output: path first, then checksum
    #[arg(short = 's', long)]
    pub paths_first: bool,

    /// Read newline separated paths from stdin instead of walking
    #[arg(short = 'i', long = "stdin")]
    pub path_list_stdin: bool,

    /// Sum just this one file; no walking, no exclusions
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub single_file: Option<PathBuf>,

    /// Number of checksum worker threads
    #[arg(short = 'j', long = "jobs", default_value_t = default_workers(), value_name = "NUM")]
    pub jobs: usize,

    /// Directory entries read per batch (bounds memory on wide directories)
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE, value_name = "NUM")]
    pub batch_size: usize,

    /// Capacity of the checksum task queue
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY, value_name = "NUM")]
    pub queue_size: usize,

    /// Show a progress bar on stderr
    #[arg(short = 'p', long)]
    pub progress: bool,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short = 'q', long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Where the files to checksum come from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TargetSource {
    /// Enumerate the targets on the filesystem
    #[default]
    Walk,
    /// Newline separated paths on stdin
    Stdin,
    /// Exactly one file, bypassing traversal and exclusion
    SingleFile(PathBuf),
}

/// Validated, immutable scan configuration
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Targets after wildcard expansion; also the inclusion patterns
    pub targets: Vec<String>,
    pub source: TargetSource,
    pub recursive: bool,
    pub follow_symlinks: bool,
    pub bind_modtime: bool,
    pub encoding: DigestEncoding,
    pub column_order: ColumnOrder,
    pub exclusions: ExclusionRules,
    pub workers: usize,
    pub batch_size: usize,
    pub queue_capacity: usize,
    pub progress: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            targets: vec![MATCH_ALL.to_string()],
            source: TargetSource::Walk,
            recursive: false,
            follow_symlinks: true,
            bind_modtime: false,
            encoding: DigestEncoding::Tagged,
            column_order: ColumnOrder::DigestFirst,
            exclusions: ExclusionRules::default(),
            workers: default_workers(),
            batch_size: DEFAULT_BATCH_SIZE,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            progress: false,
        }
    }
}

impl ScanConfig {
    /// Validate CLI arguments and build the configuration
    pub fn from_args(args: CliArgs) -> Result<Self, HashUtilityError> {
        if args.jobs == 0 || args.jobs > MAX_WORKERS {
            return Err(HashUtilityError::InvalidArguments {
                message: format!("--jobs must be between 1 and {}, got {}", MAX_WORKERS, args.jobs),
            });
        }
        if args.batch_size == 0 {
            return Err(HashUtilityError::InvalidArguments {
                message: "--batch-size must be at least 1".to_string(),
            });
        }
        if args.queue_size == 0 {
            return Err(HashUtilityError::InvalidArguments {
                message: "--queue-size must be at least 1".to_string(),
            });
        }

        let source = match (args.single_file, args.path_list_stdin) {
            (Some(_), true) => {
                return Err(HashUtilityError::InvalidArguments {
                    message: "--file and --stdin cannot be combined".to_string(),
                })
            }
            (Some(path), false) => TargetSource::SingleFile(path),
            (None, true) => TargetSource::Stdin,
            (None, false) => TargetSource::Walk,
        };

        let raw_targets = if args.targets.is_empty() {
            vec![MATCH_ALL.to_string()]
        } else {
            args.targets
        };
        let targets = if source == TargetSource::Walk {
            wildcard::expand_targets(&raw_targets)?
        } else {
            raw_targets.clone()
        };
        if targets.is_empty() {
            return Err(HashUtilityError::NoTargets {
                patterns: raw_targets,
            });
        }

        let exclusions = ExclusionRules::from_overrides(
            &RuleOverride::from_flag_values(&args.exclude_prefix),
            &RuleOverride::from_flag_values(&args.exclude_suffix),
        );

        Ok(Self {
            targets,
            source,
            recursive: args.recursive,
            follow_symlinks: !args.nosym,
            bind_modtime: args.modtime,
            encoding: if args.hex {
                DigestEncoding::Hex
            } else {
                DigestEncoding::Tagged
            },
            column_order: if args.paths_first {
                ColumnOrder::PathFirst
            } else {
                ColumnOrder::DigestFirst
            },
            exclusions,
            workers: args.jobs,
            batch_size: args.batch_size,
            queue_capacity: args.queue_size,
            progress: args.progress,
        })
    }

    /// Depth limit for walks: none when recursive, immediate children otherwise
    pub fn max_depth(&self) -> Option<usize> {
        if self.recursive {
            None
        } else {
            Some(1)
        }
    }

    /// Exclusion rules plus the targets as inclusion patterns
    pub fn path_filter(&self) -> PathFilter {
        PathFilter::new(
            self.exclusions.clone(),
            InclusionFilter::new(self.targets.clone()),
        )
    }

    pub fn dir_iter(&self) -> DirIter {
        DirIter::new()
            .with_batch_size(self.batch_size)
            .with_follow_symlinks(self.follow_symlinks)
            .with_max_depth(self.max_depth())
    }

    pub fn hash_computer(&self) -> HashComputer {
        HashComputer::new()
            .with_follow_symlinks(self.follow_symlinks)
            .with_modtime(self.bind_modtime)
            .with_encoding(self.encoding)
    }
}
