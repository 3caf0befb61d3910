// Path utilities for traversal and reporting
// Lexical cleaning, parent/base name helpers, and symlink chain evaluation

use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Maximum number of link expansions before a chain is treated as a loop
pub const MAX_SYMLINK_HOPS: usize = 255;

/// Clean a path by removing redundant components like "." and ".."
/// This provides a normalized form without requiring the path to exist
pub fn clean_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => continue,
            Component::ParentDir => {
                // Only pop a normal component; ".." at the front or after a root stays put
                match components.last() {
                    Some(Component::Normal(_)) => {
                        components.pop();
                    }
                    Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                    _ => components.push(component),
                }
            }
            _ => components.push(component),
        }
    }

    let result: PathBuf = components.iter().collect();
    if result.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        result
    }
}

/// Directory part of a target, "." when the target has no parent
pub fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => clean_path(parent),
        _ => PathBuf::from("."),
    }
}

/// Final component of a path as a string, or the whole path when it has none
pub fn base_name(path: &Path) -> String {
    match path.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => path.to_string_lossy().into_owned(),
    }
}

/// Join a directory entry name onto its directory, without a leading "./"
pub fn child_path(dir: &Path, name: &OsStr) -> PathBuf {
    if dir == Path::new(".") {
        PathBuf::from(name)
    } else {
        dir.join(name)
    }
}

/// True for the "." and ".." pseudo entries, which are never hashed or descended
pub fn is_dot_entry(path: &Path) -> bool {
    path == Path::new(".") || path == Path::new("..")
}

/// A component with its borrow released so it can sit in a work list
enum Part {
    Root(PathBuf),
    Cur,
    Parent,
    Name(OsString),
}

fn parts_of(path: &Path) -> Vec<Part> {
    path.components()
        .map(|c| match c {
            Component::Prefix(_) | Component::RootDir => Part::Root(PathBuf::from(c.as_os_str())),
            Component::CurDir => Part::Cur,
            Component::ParentDir => Part::Parent,
            Component::Normal(name) => Part::Name(name.to_os_string()),
        })
        .collect()
}

/// Follow every symlink in `path`, component by component, until none remain
///
/// A relative input yields a relative result. ".." is applied lexically, which is
/// sound because every component before it has already been resolved.
///
/// # Errors
/// Fails when a component does not exist (dangling link) or when more than
/// `MAX_SYMLINK_HOPS` links are expanded (cycle).
pub fn eval_symlinks(path: &Path) -> io::Result<PathBuf> {
    let mut pending = parts_of(path);
    pending.reverse();

    let mut resolved = PathBuf::new();
    let mut hops = 0usize;

    while let Some(part) = pending.pop() {
        match part {
            // pushing a root or prefix replaces whatever was resolved so far
            Part::Root(root) => resolved.push(root),
            Part::Cur => {}
            Part::Parent => {
                if resolved.file_name().is_some() {
                    resolved.pop();
                } else if !resolved.has_root() {
                    resolved.push("..");
                }
            }
            Part::Name(name) => {
                let candidate = resolved.join(&name);
                let meta = fs::symlink_metadata(&candidate)?;
                if !meta.file_type().is_symlink() {
                    resolved = candidate;
                    continue;
                }

                hops += 1;
                if hops > MAX_SYMLINK_HOPS {
                    return Err(io::Error::new(
                        io::ErrorKind::Other,
                        format!("too many levels of symbolic links at {}", candidate.display()),
                    ));
                }

                let target = fs::read_link(&candidate)?;
                if target.is_absolute() {
                    resolved = PathBuf::new();
                }
                let mut spliced = parts_of(&target);
                spliced.reverse();
                pending.extend(spliced);
            }
        }
    }

    if resolved.as_os_str().is_empty() {
        resolved.push(".");
    }
    Ok(resolved)
}

/// Resolve a link target relative to the directory holding the link
pub fn link_target_from(link: &Path, target: &Path) -> PathBuf {
    if target.is_absolute() {
        target.to_path_buf()
    } else {
        parent_dir(link).join(target)
    }
}
