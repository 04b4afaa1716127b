//! Path matching and renaming utilities for render-stages

use crate::config::FilePattern;
use crate::error::Result;
use glob::{MatchOptions, Pattern};
use regex::{Captures, Regex};
use std::path::{Component, Path, PathBuf};

/// Glob options matching minimatch defaults: `*` stays inside one path
/// component and dotfiles must be named explicitly.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Match a path against a glob pattern
pub fn glob_match(pattern: &str, path: &str) -> Result<bool> {
    let pattern = Pattern::new(pattern)?;
    Ok(pattern.matches_with(path, MATCH_OPTIONS))
}

/// Select the keys matched by `pattern`
///
/// Without a pattern every key is selected. Otherwise the globs are applied
/// left to right: a plain glob adds the keys it matches, a glob starting
/// with `!` removes the keys it matches from the selection built so far.
/// The result keeps the order of `keys`.
pub fn select_keys<'a, I>(keys: I, pattern: Option<&FilePattern>) -> Result<Vec<String>>
where
    I: IntoIterator<Item = &'a str>,
{
    let keys: Vec<&str> = keys.into_iter().collect();
    let Some(pattern) = pattern else {
        return Ok(keys.into_iter().map(str::to_string).collect());
    };

    let mut selected = vec![false; keys.len()];
    for glob in pattern.globs() {
        let (negated, glob) = match glob.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, glob),
        };
        let compiled = Pattern::new(glob)?;
        for (index, key) in keys.iter().enumerate() {
            if compiled.matches_with(key, MATCH_OPTIONS) {
                selected[index] = !negated;
            }
        }
    }

    Ok(keys
        .into_iter()
        .zip(selected)
        .filter_map(|(key, keep)| keep.then(|| key.to_string()))
        .collect())
}

/// Replace the first match of `regex` in `path`
///
/// The `replacement` can reference capture groups using $1, $2, etc.
/// Returns None if the regex does not match.
pub fn regex_replace(regex: &Regex, replacement: &str, path: &str) -> Option<String> {
    let captures = regex.captures(path)?;
    let whole = captures.get(0)?;

    let mut result = String::with_capacity(path.len() + replacement.len());
    result.push_str(&path[..whole.start()]);
    expand_captures(&captures, replacement, &mut result);
    result.push_str(&path[whole.end()..]);
    Some(result)
}

fn expand_captures(captures: &Captures<'_>, replacement: &str, out: &mut String) {
    let mut chars = replacement.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' {
            if let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
                chars.next(); // consume the digit
                if let Some(capture) = captures.get(digit as usize) {
                    out.push_str(capture.as_str());
                }
                continue;
            }
        }
        out.push(ch);
    }
}

/// Lexically normalize a path: drop `.` components and resolve `..`
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Find the key that names the same file as `target` under `root`
///
/// Keys spelled differently (`./a.html`, `b/../a.html`) still count as the
/// same path. Returns the existing key's own spelling.
pub fn find_equal_path<'a, I>(root: &Path, target: &str, keys: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let wanted = normalize(&root.join(target));
    keys.into_iter()
        .find(|key| normalize(&root.join(key)) == wanted)
        .map(str::to_string)
}
