// Centralized error handling module
// Error types with path and operation context for every stage of a scan

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the checksum tool
#[derive(Debug, Error)]
pub enum HashUtilityError {
    /// File system errors with context
    #[error("File not found: {}\nSuggestion: Check that the file path is correct and the file exists", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("Directory not found: {}\nSuggestion: Check that the directory path is correct and the directory exists", .path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied while {operation} {}\nSuggestion: Check file permissions or run with appropriate privileges", .path.display())]
    PermissionDenied { path: PathBuf, operation: String },

    #[error("I/O error while {operation}{}: {source}", fmt_optional_path(.path))]
    IoError {
        path: Option<PathBuf>,
        operation: String,
        #[source]
        source: io::Error,
    },

    /// A symlink whose chain could not be followed to an existing target
    #[error("Cannot resolve symlink {}: {reason}", .path.display())]
    SymlinkUnresolved { path: PathBuf, reason: String },

    /// Configuration errors
    #[error("Invalid arguments: {message}\nSuggestion: Run with --help to see usage information")]
    InvalidArguments { message: String },

    #[error("No targets could be resolved from {patterns:?}")]
    NoTargets { patterns: Vec<String> },

    /// Pipeline errors
    #[error("Checksum worker {id} failed: {reason}")]
    WorkerFailed { id: usize, reason: String },
}

fn fmt_optional_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => format!(" {}", p.display()),
        None => String::new(),
    }
}

impl HashUtilityError {
    /// Create an error from an io::Error with context about the operation and optional path
    ///
    /// `NotFound` and `PermissionDenied` become the specific variants when a path is known;
    /// whether a missing path is reported as a file or a directory is decided by the operation.
    pub fn from_io_error(err: io::Error, operation: &str, path: Option<PathBuf>) -> Self {
        match (err.kind(), path) {
            (io::ErrorKind::NotFound, Some(p)) => {
                if operation.contains("directory") || operation.contains("scan") {
                    HashUtilityError::DirectoryNotFound { path: p }
                } else {
                    HashUtilityError::FileNotFound { path: p }
                }
            }
            (io::ErrorKind::PermissionDenied, Some(p)) => HashUtilityError::PermissionDenied {
                path: p,
                operation: operation.to_string(),
            },
            (_, path) => HashUtilityError::IoError {
                path,
                operation: operation.to_string(),
                source: err,
            },
        }
    }

    /// The path this error is about, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            HashUtilityError::FileNotFound { path }
            | HashUtilityError::DirectoryNotFound { path }
            | HashUtilityError::PermissionDenied { path, .. }
            | HashUtilityError::SymlinkUnresolved { path, .. } => Some(path),
            HashUtilityError::IoError { path, .. } => path.as_ref(),
            _ => None,
        }
    }

    /// Configuration-class errors end the run before any work starts.
    /// Everything else is reported per path and the scan goes on.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            HashUtilityError::InvalidArguments { .. }
                | HashUtilityError::NoTargets { .. }
                | HashUtilityError::WorkerFailed { .. }
        )
    }
}

impl From<io::Error> for HashUtilityError {
    fn from(err: io::Error) -> Self {
        HashUtilityError::from_io_error(err, "unknown operation", None)
    }
}
