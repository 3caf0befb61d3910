// Tests for the directory iterator

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use treesum::hash::{DirIter, HashUtilityError};

fn build_tree(root: &Path) {
    fs::create_dir_all(root.join("sub/deeper")).unwrap();
    fs::create_dir_all(root.join("empty")).unwrap();
    fs::write(root.join("top.txt"), b"top").unwrap();
    fs::write(root.join("sub/nested.txt"), b"nested").unwrap();
    fs::write(root.join("sub/deeper/deep.txt"), b"deep").unwrap();
}

fn collect_ok(iter: impl Iterator<Item = Result<PathBuf, HashUtilityError>>) -> Vec<PathBuf> {
    iter.map(|r| r.unwrap()).collect()
}

#[test]
fn test_files_only_recursive() {
    let temp = TempDir::new().unwrap();
    build_tree(temp.path());

    let files: BTreeSet<PathBuf> = collect_ok(DirIter::new().files_only(temp.path()))
        .into_iter()
        .collect();

    let expected: BTreeSet<PathBuf> = [
        temp.path().join("top.txt"),
        temp.path().join("sub/nested.txt"),
        temp.path().join("sub/deeper/deep.txt"),
    ]
    .into_iter()
    .collect();
    assert_eq!(files, expected);
}

#[test]
fn test_depth_limit_keeps_only_direct_children() {
    let temp = TempDir::new().unwrap();
    build_tree(temp.path());

    let walker = DirIter::new().with_max_depth(Some(1));
    let files = collect_ok(walker.files_only(temp.path()));

    assert_eq!(files, vec![temp.path().join("top.txt")]);
}

#[test]
fn test_batch_size_does_not_change_results() {
    let temp = TempDir::new().unwrap();
    for i in 0..257 {
        fs::write(temp.path().join(format!("f{:03}.dat", i)), i.to_string()).unwrap();
    }
    fs::create_dir(temp.path().join("d")).unwrap();
    fs::write(temp.path().join("d/inner.dat"), b"x").unwrap();

    let mut sets = Vec::new();
    for batch in [1, 7, 100, 1000] {
        let walker = DirIter::new().with_batch_size(batch);
        let mut files = collect_ok(walker.files_only(temp.path()));
        files.sort();
        sets.push(files);
    }

    assert_eq!(sets[0].len(), 258);
    assert!(sets.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn test_early_termination_releases_handles() {
    let temp = TempDir::new().unwrap();
    build_tree(temp.path());

    let mut walk = DirIter::new().with_batch_size(1).files_only(temp.path());
    let first = walk.next();
    assert!(matches!(first, Some(Ok(_))));
    assert!(walk.open_dirs() >= 1);

    for item in walk.by_ref() {
        item.unwrap();
    }
    assert_eq!(walk.open_dirs(), 0);
}

#[test]
fn test_missing_root_yields_single_error() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("nope");

    let items: Vec<_> = DirIter::new().files_only(&missing).collect();
    assert_eq!(items.len(), 1);
    match &items[0] {
        Err(HashUtilityError::DirectoryNotFound { path }) => assert_eq!(path, &missing),
        other => panic!("unexpected item: {:?}", other),
    }
}

#[test]
fn test_leaf_dirs() {
    let temp = TempDir::new().unwrap();
    build_tree(temp.path());

    let dirs: BTreeSet<PathBuf> = collect_ok(DirIter::new().leaf_dirs(temp.path()))
        .into_iter()
        .collect();

    let expected: BTreeSet<PathBuf> = [temp.path().join("sub/deeper"), temp.path().join("empty")]
        .into_iter()
        .collect();
    assert_eq!(dirs, expected);
}

#[test]
fn test_leaf_dirs_treats_depth_pruned_dirs_as_leaves() {
    let temp = TempDir::new().unwrap();
    build_tree(temp.path());

    let walker = DirIter::new().with_max_depth(Some(1));
    let dirs: BTreeSet<PathBuf> = collect_ok(walker.leaf_dirs(temp.path())).into_iter().collect();

    assert!(dirs.contains(&temp.path().join("sub")));
    assert!(dirs.contains(&temp.path().join("empty")));
    assert!(!dirs.contains(&temp.path().join("sub/deeper")));
}

#[test]
fn test_all_dirs_is_post_order() {
    let temp = TempDir::new().unwrap();
    build_tree(temp.path());

    let dirs = collect_ok(DirIter::new().all_dirs(temp.path()));
    let pos = |p: PathBuf| dirs.iter().position(|d| *d == p).unwrap();

    assert_eq!(dirs.len(), 4);
    assert_eq!(dirs.last().unwrap(), temp.path());
    assert!(pos(temp.path().join("sub/deeper")) < pos(temp.path().join("sub")));
}

#[cfg(unix)]
mod symlinks {
    use super::*;
    use std::os::unix::fs::symlink;

    /// root/a/b/c/d/file0.txt, root/z/symlink -> symlink2, root/z/symlink2 -> ../a
    fn build_link_chain(root: &Path) {
        fs::create_dir_all(root.join("a/b/c/d")).unwrap();
        fs::write(root.join("a/b/c/d/file0.txt"), b"file0").unwrap();
        fs::create_dir(root.join("z")).unwrap();
        symlink("symlink2", root.join("z/symlink")).unwrap();
        symlink("../a", root.join("z/symlink2")).unwrap();
    }

    #[test]
    fn test_followed_chain_yields_duplicates() {
        let temp = TempDir::new().unwrap();
        build_link_chain(temp.path());

        let walker = DirIter::new().with_follow_symlinks(true);
        let seen = collect_ok(walker.files_only(temp.path().join("z")));
        assert_eq!(seen.len(), 2);

        let expected = fs::canonicalize(temp.path().join("a/b/c/d/file0.txt")).unwrap();
        let unique: BTreeSet<PathBuf> = seen
            .iter()
            .map(|p| fs::canonicalize(p).unwrap())
            .collect();
        assert_eq!(unique.len(), 1);
        assert!(unique.contains(&expected));
    }

    #[test]
    fn test_unfollowed_links_are_leaves() {
        let temp = TempDir::new().unwrap();
        build_link_chain(temp.path());

        let seen: BTreeSet<PathBuf> = collect_ok(DirIter::new().files_only(temp.path().join("z")))
            .into_iter()
            .collect();

        let expected: BTreeSet<PathBuf> =
            [temp.path().join("z/symlink"), temp.path().join("z/symlink2")]
                .into_iter()
                .collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_dangling_link_is_an_error_item_not_the_end() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("real.txt"), b"real").unwrap();
        symlink("missing-target", temp.path().join("dangling")).unwrap();

        let walker = DirIter::new().with_follow_symlinks(true);
        let items: Vec<_> = walker.files_only(temp.path()).collect();

        assert_eq!(items.len(), 2);
        assert!(items
            .iter()
            .any(|r| matches!(r, Err(HashUtilityError::SymlinkUnresolved { .. }))));
        assert!(items
            .iter()
            .any(|r| matches!(r, Ok(p) if p == &temp.path().join("real.txt"))));
    }

    #[test]
    fn test_symlink_loop_is_unresolved() {
        let temp = TempDir::new().unwrap();
        symlink("loop_b", temp.path().join("loop_a")).unwrap();
        symlink("loop_a", temp.path().join("loop_b")).unwrap();

        let walker = DirIter::new().with_follow_symlinks(true);
        let items: Vec<_> = walker.files_only(temp.path()).collect();

        assert_eq!(items.len(), 2);
        assert!(items
            .iter()
            .all(|r| matches!(r, Err(HashUtilityError::SymlinkUnresolved { .. }))));
    }
}
