// Wildcard target expansion module
// Expands glob-style targets the way a shell would, before they are used as roots and keep patterns

use super::error::HashUtilityError;
use super::exclude::MATCH_ALL;
use std::fs;

/// Expand a wildcard target into the concrete paths it names
///
/// Supports patterns like:
/// - `*.txt` - all .txt entries in the current directory
/// - `file?.bin` - file1.bin, fileA.bin, etc.
/// - `data/*/hashes` - the hashes entry in any subdirectory of data
///
/// A target without wildcard characters is returned as-is, and so is a bare
/// `*`, which stays the match-everything pattern. A target naming an existing
/// entry is taken literally even if it contains wildcard characters.
///
/// # Returns
/// The matching paths as strings, sorted alphabetically
///
/// # Errors
/// Returns an error if the pattern is invalid or nothing matches
pub fn expand_pattern(pattern: &str) -> Result<Vec<String>, HashUtilityError> {
    if pattern == MATCH_ALL || !contains_wildcard(pattern) || fs::symlink_metadata(pattern).is_ok() {
        return Ok(vec![pattern.to_string()]);
    }

    let paths = glob::glob(pattern).map_err(|e| HashUtilityError::InvalidArguments {
        message: format!("Invalid glob pattern '{}': {}", pattern, e),
    })?;

    let mut matches = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| HashUtilityError::InvalidArguments {
            message: format!("Error reading glob pattern '{}': {}", pattern, e),
        })?;
        matches.push(path.to_string_lossy().into_owned());
    }

    if matches.is_empty() {
        return Err(HashUtilityError::InvalidArguments {
            message: format!("No files match pattern '{}'", pattern),
        });
    }

    matches.sort();
    Ok(matches)
}

/// Expand every target, keeping their relative order
pub fn expand_targets(targets: &[String]) -> Result<Vec<String>, HashUtilityError> {
    let mut expanded = Vec::new();
    for target in targets {
        expanded.extend(expand_pattern(target)?);
    }
    Ok(expanded)
}

/// Check if a string contains wildcard characters
pub fn contains_wildcard(s: &str) -> bool {
    s.contains('*') || s.contains('?') || s.contains('[')
}
