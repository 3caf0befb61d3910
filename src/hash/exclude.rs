// Exclusion and inclusion filtering
// Prefix/suffix rules matched against base names and full paths, plus substring "keep" patterns

use super::path_utils;
use std::path::Path;

/// Default base-name prefix that is excluded
pub const DEFAULT_EXCLUDE_PREFIX: &str = "_";

/// Default base-name suffix that is excluded (editor backups)
pub const DEFAULT_EXCLUDE_SUFFIX: &str = "~";

/// Inclusion pattern that matches every path
pub const MATCH_ALL: &str = "*";

/// User override for one rule category
///
/// `Unset` means the category default applies; `Empty` means the user asked
/// for no rules at all in this category.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RuleOverride {
    #[default]
    Unset,
    Empty,
    Values(Vec<String>),
}

impl RuleOverride {
    /// Build an override from raw flag values, each possibly comma separated
    ///
    /// No values at all is `Unset`. Values that trim down to nothing are dropped,
    /// and if nothing survives the result is `Empty`.
    pub fn from_flag_values<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen_any = false;
        let mut values = Vec::new();
        for chunk in raw {
            seen_any = true;
            values.extend(
                chunk
                    .as_ref()
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
            );
        }

        match (seen_any, values.is_empty()) {
            (false, _) => RuleOverride::Unset,
            (true, true) => RuleOverride::Empty,
            (true, false) => RuleOverride::Values(values),
        }
    }

    fn resolve(&self, default: &str) -> Vec<String> {
        match self {
            RuleOverride::Unset => vec![default.to_string()],
            RuleOverride::Empty => Vec::new(),
            RuleOverride::Values(values) => values.clone(),
        }
    }
}

/// Prefix and suffix exclusion rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionRules {
    prefixes: Vec<String>,
    suffixes: Vec<String>,
}

impl Default for ExclusionRules {
    fn default() -> Self {
        Self::from_overrides(&RuleOverride::Unset, &RuleOverride::Unset)
    }
}

impl ExclusionRules {
    /// Rules with no prefixes and no suffixes; excludes nothing
    pub fn none() -> Self {
        Self {
            prefixes: Vec::new(),
            suffixes: Vec::new(),
        }
    }

    pub fn new(prefixes: Vec<String>, suffixes: Vec<String>) -> Self {
        Self { prefixes, suffixes }
    }

    /// Apply user overrides on top of the defaults
    pub fn from_overrides(prefix: &RuleOverride, suffix: &RuleOverride) -> Self {
        Self {
            prefixes: prefix.resolve(DEFAULT_EXCLUDE_PREFIX),
            suffixes: suffix.resolve(DEFAULT_EXCLUDE_SUFFIX),
        }
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty() && self.suffixes.is_empty()
    }

    /// Should this path be skipped?
    ///
    /// Rules are tried against the base name first, then against the full
    /// path so a rule written as a path prefix (e.g. `build/`) also works.
    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.is_empty() {
            return false;
        }

        let base = path_utils::base_name(path);
        if self.matches(&base) {
            return true;
        }

        let full = path.to_string_lossy();
        full != base && self.matches(&full)
    }

    fn matches(&self, s: &str) -> bool {
        self.prefixes.iter().any(|p| s.starts_with(p.as_str()))
            || self.suffixes.iter().any(|x| s.ends_with(x.as_str()))
    }
}

/// Inclusion patterns: a path is kept when any pattern matches it
///
/// `*` on its own matches everything; any other pattern is a plain substring test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InclusionFilter {
    patterns: Vec<String>,
}

impl Default for InclusionFilter {
    fn default() -> Self {
        Self::match_all()
    }
}

impl InclusionFilter {
    pub fn new(patterns: Vec<String>) -> Self {
        if patterns.is_empty() {
            Self::match_all()
        } else {
            Self { patterns }
        }
    }

    pub fn match_all() -> Self {
        Self {
            patterns: vec![MATCH_ALL.to_string()],
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn matches(&self, path: &Path) -> bool {
        let full = path.to_string_lossy();
        self.patterns
            .iter()
            .any(|p| p == MATCH_ALL || full.contains(p.as_str()))
    }
}

/// Exclusion and inclusion combined; the predicate applied to every candidate file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathFilter {
    pub exclusions: ExclusionRules,
    pub inclusions: InclusionFilter,
}

impl PathFilter {
    pub fn new(exclusions: ExclusionRules, inclusions: InclusionFilter) -> Self {
        Self {
            exclusions,
            inclusions,
        }
    }

    pub fn keep(&self, path: &Path) -> bool {
        !self.exclusions.is_excluded(path) && self.inclusions.matches(path)
    }
}
