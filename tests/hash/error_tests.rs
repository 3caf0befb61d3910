// Tests for error module

use std::error::Error;
use std::io;
use std::path::PathBuf;
use treesum::hash::HashUtilityError;

#[test]
fn test_file_not_found_error_display() {
    let error = HashUtilityError::FileNotFound {
        path: PathBuf::from("/path/to/file.txt"),
    };
    let message = format!("{}", error);
    assert!(message.contains("File not found"));
    assert!(message.contains("/path/to/file.txt"));
    assert!(message.contains("Suggestion"));
}

#[test]
fn test_permission_denied_error_display() {
    let error = HashUtilityError::PermissionDenied {
        path: PathBuf::from("/protected/file.txt"),
        operation: "reading".to_string(),
    };
    let message = format!("{}", error);
    assert!(message.contains("Permission denied"));
    assert!(message.contains("reading"));
    assert!(message.contains("/protected/file.txt"));
}

#[test]
fn test_io_error_keeps_source() {
    let error = HashUtilityError::from_io_error(
        io::Error::new(io::ErrorKind::Other, "disk on fire"),
        "reading",
        Some(PathBuf::from("a.bin")),
    );
    let message = format!("{}", error);
    assert!(message.contains("reading a.bin"));
    assert!(message.contains("disk on fire"));
    assert!(error.source().is_some());
}

#[test]
fn test_io_error_without_path() {
    let error: HashUtilityError = io::Error::new(io::ErrorKind::Other, "boom").into();
    assert!(error.path().is_none());
    assert!(format!("{}", error).contains("boom"));
}

#[test]
fn test_not_found_classified_by_operation() {
    let dir = HashUtilityError::from_io_error(
        io::Error::from(io::ErrorKind::NotFound),
        "reading directory",
        Some(PathBuf::from("d")),
    );
    assert!(matches!(dir, HashUtilityError::DirectoryNotFound { .. }));

    let file = HashUtilityError::from_io_error(
        io::Error::from(io::ErrorKind::NotFound),
        "reading",
        Some(PathBuf::from("f")),
    );
    assert!(matches!(file, HashUtilityError::FileNotFound { .. }));
    assert_eq!(file.path(), Some(&PathBuf::from("f")));
}

#[test]
fn test_permission_denied_classified() {
    let error = HashUtilityError::from_io_error(
        io::Error::from(io::ErrorKind::PermissionDenied),
        "reading",
        Some(PathBuf::from("secret")),
    );
    assert!(matches!(error, HashUtilityError::PermissionDenied { .. }));
}

#[test]
fn test_fatal_classification() {
    assert!(HashUtilityError::InvalidArguments {
        message: "x".to_string()
    }
    .is_fatal());
    assert!(HashUtilityError::NoTargets { patterns: vec![] }.is_fatal());
    assert!(!HashUtilityError::FileNotFound {
        path: PathBuf::from("x")
    }
    .is_fatal());
    assert!(!HashUtilityError::SymlinkUnresolved {
        path: PathBuf::from("l"),
        reason: "dangling".to_string()
    }
    .is_fatal());
}

#[test]
fn test_symlink_unresolved_display() {
    let error = HashUtilityError::SymlinkUnresolved {
        path: PathBuf::from("z/link"),
        reason: "No such file or directory".to_string(),
    };
    let message = format!("{}", error);
    assert!(message.contains("z/link"));
    assert!(message.contains("No such file"));
}
