// Checksum core library
// Traversal, filtering, digest computation, the worker pipeline, and reporting

pub mod error;
pub mod exclude;
pub mod hash;
pub mod path_utils;
pub mod pipeline;
pub mod report;
pub mod scan;
pub mod walk;
pub mod wildcard;

// Re-export commonly used types for convenience
pub use error::HashUtilityError;
pub use exclude::{ExclusionRules, InclusionFilter, PathFilter, RuleOverride};
pub use hash::{DigestEncoding, HashComputer, HashResult, Hasher};
pub use pipeline::{ChecksumResult, ChecksumTask, PipelineOutcome, WorkerPool};
pub use report::{ColumnOrder, Report, ScanStats};
pub use scan::{ScanEngine, WorkingSet};
pub use walk::{DirIter, PathEntry, Walk, WalkMode};
