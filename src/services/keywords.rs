//! Infrastructure/library keyword matching.
//!
//! Candidates (archive file stems and mod ids) are compared against a sorted, deduplicated
//! keyword set using whole-word matching: a keyword must be bounded on both sides by the
//! start/end of the candidate or a non-alphanumeric character.

use std::collections::BTreeSet;

/// Loader names, API/library naming conventions, and well-known library mods.
const BUILTIN_KEYWORDS: &[&str] = &[
    // Loaders and their language adapters
    "forge",
    "neoforge",
    "fabric",
    "fabric-api",
    "fabric-language-kotlin",
    "quilt",
    "quilted-fabric-api",
    "qsl",
    "kotlinforforge",
    "kotlin",
    "scala",
    // Naming conventions
    "api",
    "lib",
    "library",
    "core",
    "corelib",
    "compat",
    "config",
    "mixin",
    "mixins",
    "mixinextras",
    "loader",
    "framework",
    "utils",
    "util",
    "common",
    // Well-known library and infrastructure mods
    "architectury",
    "balm",
    "bookshelf",
    "caelus",
    "cardinal-components",
    "citadel",
    "cloth-config",
    "collective",
    "connector",
    "creativecore",
    "cristellib",
    "cupboard",
    "curios",
    "emi",
    "ferritecore",
    "forgeconfigapiport",
    "framework",
    "ftb-library",
    "geckolib",
    "glitchcore",
    "iceberg",
    "jei",
    "kambrik",
    "libx",
    "lithostitched",
    "midnightlib",
    "modmenu",
    "moonlight",
    "owo",
    "owo-lib",
    "patchouli",
    "placebo",
    "playeranimator",
    "prism",
    "puzzleslib",
    "puzzles-lib",
    "rei",
    "resourcefulconfig",
    "resourcefullib",
    "sinytra",
    "supermartijn642corelib",
    "supermartijn642configlib",
    "terrablender",
    "trinkets",
    "yacl",
    "yet-another-config-lib",
    "zeta",
];

/// Immutable set of infrastructure keywords.
///
/// Built once at startup from the builtin list plus configured extras, then passed to the
/// classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfraKeywords {
    keywords: Vec<String>,
}

impl InfraKeywords {
    /// The builtin keyword list.
    pub fn builtin() -> Self {
        Self::from_keywords(BUILTIN_KEYWORDS.iter().copied())
    }

    /// The builtin list extended with `extra` keywords.
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extra: Vec<String> = extra.into_iter().map(|s| s.as_ref().to_string()).collect();
        Self::from_keywords(
            BUILTIN_KEYWORDS
                .iter()
                .copied()
                .chain(extra.iter().map(String::as_str)),
        )
    }

    /// Build a set from arbitrary keywords; they are normalized, sorted and deduplicated.
    pub fn from_keywords<'a, I>(keywords: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let set: BTreeSet<String> = keywords
            .into_iter()
            .map(normalize)
            .filter(|k| !k.is_empty())
            .collect();

        Self {
            keywords: set.into_iter().collect(),
        }
    }

    /// First keyword (in sorted order) occurring as a whole word in `candidate`.
    pub fn find_match(&self, candidate: &str) -> Option<&str> {
        let candidate = normalize(candidate);
        if candidate.is_empty() {
            return None;
        }

        self.keywords
            .iter()
            .find(|keyword| contains_word(&candidate, keyword))
            .map(String::as_str)
    }

    pub fn matches(&self, candidate: &str) -> bool {
        self.find_match(candidate).is_some()
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(String::as_str)
    }
}

impl Default for InfraKeywords {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Lower-case and unify separators so `cloth_config`, `Cloth Config` and `cloth-config`
/// compare equal.
fn normalize(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            '_' | '.' | ' ' => '-',
            other => other,
        })
        .collect()
}

/// Whether `word` occurs in `haystack` bounded by non-alphanumeric characters or the ends.
fn contains_word(haystack: &str, word: &str) -> bool {
    haystack.match_indices(word).any(|(start, _)| {
        let end = start + word.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_is_sorted_and_deduplicated() {
        let keywords = InfraKeywords::builtin();
        let list: Vec<&str> = keywords.iter().collect();
        let mut sorted = list.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(list, sorted);
        // "framework" appears twice in the source list
        assert_eq!(list.iter().filter(|k| **k == "framework").count(), 1);
    }

    #[test]
    fn test_whole_word_match() {
        let keywords = InfraKeywords::builtin();
        assert_eq!(keywords.find_match("core-mod"), Some("core"));
        assert!(keywords.matches("forge-extras"));
        assert!(keywords.matches("geckolib-forge-1.20.1-4.4.2"));
        assert!(keywords.matches("Cloth_Config"));
    }

    #[test]
    fn test_substring_is_not_a_match() {
        let keywords = InfraKeywords::from_keywords(["core"]);
        assert!(!keywords.matches("corelib2000"));
        assert!(!keywords.matches("hardcore"));
        assert!(keywords.matches("core"));
        assert!(keywords.matches("my.core.thing"));
    }

    #[test]
    fn test_content_names_do_not_match() {
        let keywords = InfraKeywords::builtin();
        assert!(!keywords.matches("dragon-quests"));
        assert!(!keywords.matches("create"));
        assert!(!keywords.matches("biomesoplenty"));
        assert!(!keywords.matches(""));
    }

    #[test]
    fn test_with_extra_keywords() {
        let keywords = InfraKeywords::with_extra(["Custom_Lib", "forge"]);
        assert_eq!(keywords.len(), InfraKeywords::builtin().len() + 1);
        assert_eq!(keywords.find_match("my-custom-lib-1.0"), Some("custom-lib"));
    }

    #[test]
    fn test_first_hit_in_sorted_order() {
        let keywords = InfraKeywords::from_keywords(["lib", "api"]);
        assert_eq!(keywords.find_match("lib-api"), Some("api"));
    }
}
