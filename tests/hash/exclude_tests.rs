// Tests for exclusion and inclusion filtering

use proptest::prelude::*;
use std::path::{Path, PathBuf};
use treesum::hash::{ExclusionRules, InclusionFilter, PathFilter, RuleOverride};

#[test]
fn test_default_rules_exclude_underscore_and_tilde() {
    let rules = ExclusionRules::default();
    assert!(rules.is_excluded(Path::new("_scratch.txt")));
    assert!(rules.is_excluded(Path::new("dir/_scratch.txt")));
    assert!(rules.is_excluded(Path::new("notes.txt~")));
    assert!(!rules.is_excluded(Path::new("notes.txt")));
    assert!(!rules.is_excluded(Path::new("dir_with_underscore/a.txt")));
}

#[test]
fn test_full_path_rules() {
    let rules = ExclusionRules::new(vec!["build/".to_string()], vec![]);
    assert!(rules.is_excluded(Path::new("build/out.o")));
    assert!(!rules.is_excluded(Path::new("src/build.rs")));
}

#[test]
fn test_explicit_empty_disables_one_category_only() {
    let rules = ExclusionRules::from_overrides(&RuleOverride::Empty, &RuleOverride::Unset);
    assert!(!rules.is_excluded(Path::new("_kept.txt")));
    assert!(rules.is_excluded(Path::new("backup~")));

    let rules = ExclusionRules::from_overrides(&RuleOverride::Unset, &RuleOverride::Empty);
    assert!(rules.is_excluded(Path::new("_dropped.txt")));
    assert!(!rules.is_excluded(Path::new("backup~")));
}

#[test]
fn test_explicit_values_replace_defaults() {
    let prefix = RuleOverride::from_flag_values(["tmp,.git"]);
    let suffix = RuleOverride::from_flag_values([".bak"]);
    let rules = ExclusionRules::from_overrides(&prefix, &suffix);

    assert!(rules.is_excluded(Path::new("tmpfile")));
    assert!(rules.is_excluded(Path::new(".gitignore")));
    assert!(rules.is_excluded(Path::new("x.bak")));
    assert!(!rules.is_excluded(Path::new("_no_longer_excluded")));
    assert!(!rules.is_excluded(Path::new("tilde~")));
}

#[test]
fn test_inclusion_is_substring_not_glob() {
    let filter = InclusionFilter::new(vec!["src".to_string()]);
    assert!(filter.matches(Path::new("src/main.rs")));
    assert!(filter.matches(Path::new("lib/srcgen/x")));
    assert!(!filter.matches(Path::new("docs/readme.md")));

    let literal = InclusionFilter::new(vec!["*.rs".to_string(), "x".to_string()]);
    assert!(!literal.matches(Path::new("main.rs")));
}

#[test]
fn test_star_matches_everything() {
    let filter = InclusionFilter::new(Vec::new());
    assert_eq!(filter.patterns(), ["*"]);
    assert!(filter.matches(Path::new("anything/at/all")));
}

#[test]
fn test_keep_combines_both() {
    let filter = PathFilter::new(
        ExclusionRules::default(),
        InclusionFilter::new(vec!["data".to_string()]),
    );
    assert!(filter.keep(Path::new("data/a.csv")));
    assert!(!filter.keep(Path::new("data/_a.csv")));
    assert!(!filter.keep(Path::new("other/a.csv")));
}

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z_~][a-z_~.]{0,11}"
}

proptest! {
    #[test]
    fn prop_empty_rules_exclude_nothing(dir in name_strategy(), name in name_strategy()) {
        let path = PathBuf::from(dir).join(name);
        prop_assert!(!ExclusionRules::none().is_excluded(&path));
    }

    #[test]
    fn prop_exclusion_matches_base_or_full_path(
        dir in name_strategy(),
        name in name_strategy(),
        prefix in "[a-z_]{1,3}",
        suffix in "[a-z~]{1,3}",
    ) {
        let path = PathBuf::from(&dir).join(&name);
        let full = path.to_string_lossy().into_owned();
        let rules = ExclusionRules::new(vec![prefix.clone()], vec![suffix.clone()]);

        let expected = name.starts_with(&prefix)
            || name.ends_with(&suffix)
            || full.starts_with(&prefix)
            || full.ends_with(&suffix);
        prop_assert_eq!(rules.is_excluded(&path), expected);
    }

    #[test]
    fn prop_disabled_prefix_leaves_only_suffix_rule(name in "[a-z_~]{1,12}") {
        let rules = ExclusionRules::from_overrides(&RuleOverride::Empty, &RuleOverride::Unset);
        prop_assert_eq!(rules.is_excluded(Path::new(&name)), name.ends_with('~'));
    }
}
