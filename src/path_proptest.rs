//! Property-based tests for path selection and renaming.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::config::FilePattern;
    use crate::defaults::default_renamer;
    use crate::path::{find_equal_path, glob_match, normalize, regex_replace, select_keys};
    use proptest::prelude::*;
    use regex::Regex;
    use std::path::Path;

    // ============================================================================
    // select_keys property tests
    // ============================================================================

    proptest! {
        /// Property: without a pattern every key is selected, in order
        #[test]
        fn select_without_pattern_is_identity(keys in prop::collection::vec("[a-z]{1,8}(/[a-z]{1,8})?\\.[a-z]{2,4}", 0..12)) {
            let selected = select_keys(keys.iter().map(String::as_str), None).unwrap();
            prop_assert_eq!(selected, keys);
        }

        /// Property: a pattern made only of negations selects nothing
        #[test]
        fn negation_only_selects_nothing(keys in prop::collection::vec("[a-z]{1,8}\\.[a-z]{2,4}", 0..12)) {
            let pattern = FilePattern::Many(vec!["!*.md".to_string(), "!**/*".to_string()]);
            let selected = select_keys(keys.iter().map(String::as_str), Some(&pattern)).unwrap();
            prop_assert!(selected.is_empty());
        }

        /// Property: a glob followed by its own negation selects nothing
        #[test]
        fn glob_then_negation_cancels(keys in prop::collection::vec("[a-z]{1,8}(/[a-z]{1,8})?\\.(pug|jade|html)", 0..12)) {
            let pattern = FilePattern::Many(vec!["**/*.pug".to_string(), "!**/*.pug".to_string()]);
            let selected = select_keys(keys.iter().map(String::as_str), Some(&pattern)).unwrap();
            prop_assert!(selected.is_empty());
        }

        /// Property: the selection is always a subsequence of the keys
        #[test]
        fn selection_is_subsequence(keys in prop::collection::vec("[a-z]{1,8}(/[a-z]{1,8})?\\.(pug|jade|html)", 0..12)) {
            let pattern = FilePattern::Many(vec!["**/*".to_string(), "!**/*.html".to_string()]);
            let selected = select_keys(keys.iter().map(String::as_str), Some(&pattern)).unwrap();
            let mut remaining = keys.iter();
            for key in &selected {
                prop_assert!(remaining.any(|k| k == key));
                prop_assert!(!key.ends_with(".html"));
            }
        }
    }

    // ============================================================================
    // glob_match property tests
    // ============================================================================

    proptest! {
        /// Property: "**/*.pug" matches every .pug path at any depth
        #[test]
        fn default_pattern_matches_any_depth(path in "[a-z]{1,8}(/[a-z]{1,8}){0,3}") {
            let file = format!("{path}.pug");
            prop_assert!(glob_match("**/*.pug", &file).unwrap());
        }

        /// Property: exact pattern matches only identical path
        #[test]
        fn glob_exact_match_works(path in "[a-zA-Z0-9_]{1,20}") {
            prop_assert!(glob_match(&path, &path).unwrap());
        }

        /// Property: "*" never crosses a path separator
        #[test]
        fn glob_star_stays_in_component(dir in "[a-z]{1,8}", name in "[a-z]{1,8}") {
            let path = format!("{dir}/{name}");
            prop_assert!(!glob_match("*", &path).unwrap());
        }
    }

    // ============================================================================
    // renamer property tests
    // ============================================================================

    proptest! {
        /// Property: the default renamer maps .pug and .jade to .html
        #[test]
        fn default_renamer_swaps_template_extension(stem in "[a-z]{1,8}(/[a-z]{1,8}){0,2}", ext in "(pug|jade)") {
            let renamer = default_renamer();
            let renamed = renamer.rename(&format!("{stem}.{ext}")).unwrap();
            prop_assert_eq!(renamed, format!("{stem}.html"));
        }

        /// Property: the default renamer leaves other files alone and is idempotent
        #[test]
        fn default_renamer_is_idempotent(path in "[a-z]{1,8}(/[a-z]{1,8}){0,2}\\.(pug|jade|html|css|md)") {
            let renamer = default_renamer();
            let once = renamer.rename(&path).unwrap();
            let twice = renamer.rename(&once).unwrap();
            prop_assert_eq!(&once, &twice);
            if !path.ends_with(".pug") && !path.ends_with(".jade") {
                prop_assert_eq!(once, path);
            }
        }

        /// Property: regex_replace only changes paths that match
        #[test]
        fn regex_replace_none_when_unmatched(path in "[a-z]{1,8}\\.(html|css)") {
            let regex = Regex::new(r"\.pug$").unwrap();
            prop_assert_eq!(regex_replace(&regex, ".html", &path), None);
        }
    }

    // ============================================================================
    // path equality property tests
    // ============================================================================

    proptest! {
        /// Property: normalize is idempotent
        #[test]
        fn normalize_is_idempotent(path in "(/?)([a-z]{1,4}|\\.|\\.\\.)(/([a-z]{1,4}|\\.|\\.\\.)){0,5}") {
            let once = normalize(Path::new(&path));
            let twice = normalize(&once);
            prop_assert_eq!(once, twice);
        }

        /// Property: a key always names the same path as itself
        #[test]
        fn find_equal_path_finds_identical_key(key in "[a-z]{1,8}(/[a-z]{1,8}){0,2}\\.html") {
            let keys = ["other.txt", key.as_str()];
            let found = find_equal_path(Path::new("/site/build"), &key, keys);
            prop_assert_eq!(found.as_deref(), Some(key.as_str()));
        }

        /// Property: redundant "./" segments do not hide an existing key
        #[test]
        fn find_equal_path_ignores_current_dir_segments(dir in "[a-z]{1,8}", name in "[a-z]{1,8}") {
            let key = format!("{dir}/./{name}.html");
            let target = format!("{dir}/{name}.html");
            let found = find_equal_path(Path::new("/site/build"), &target, [key.as_str()]);
            prop_assert_eq!(found, Some(key));
        }
    }
}
