//! # Error Suggestions
//!
//! Helpers that build configuration errors carrying a hint, so a pipeline
//! author learns what went wrong AND how to fix it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use crate::suggestions;
//!
//! // Instead of:
//! return Err(Error::ConfigParse { message: format!("Unknown plugin: {name}"), hint: None });
//!
//! // Use:
//! return Err(suggestions::unknown_stage(name));
//! ```

use crate::config::STAGE_NAMES;
use crate::error::Error;

/// Generate an error for an unknown plugin name in a pipeline document.
///
/// Suggests the closest stage name when there is one and lists the valid
/// names.
pub fn unknown_stage(name: &str) -> Error {
    let did_you_mean = find_similar(name, STAGE_NAMES)
        .map(|s| format!("Did you mean '{s}'? "))
        .unwrap_or_default();

    Error::ConfigParse {
        message: format!("Unknown plugin: {name}"),
        hint: Some(format!(
            "{did_you_mean}Valid plugins are: {names}",
            names = STAGE_NAMES.join(", ")
        )),
    }
}

/// Generate an error for an invalid renamer regex.
///
/// Includes a hint about common regex mistakes.
pub fn invalid_regex(pattern: &str, error: &regex::Error) -> Error {
    let hint = match error {
        regex::Error::Syntax(msg) if msg.contains("unclosed") => {
            "Check for unclosed brackets, parentheses, or braces"
        }
        regex::Error::Syntax(msg) if msg.contains("repetition") => {
            "Repetition operators (+, *, ?) must follow a pattern"
        }
        _ => "Test patterns at https://regex101.com (select Rust flavor)",
    };

    Error::ConfigParse {
        message: format!("Invalid renamer regex: {pattern}: {error}"),
        hint: Some(hint.to_string()),
    }
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Calculate the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}
