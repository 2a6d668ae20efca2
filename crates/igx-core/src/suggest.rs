//! # Suggestion Provider
//!
//! Prefix matching of known handles against the `@partial` the user is typing.

use crate::mention::{detect_partial, partial_range};

/// Handles whose lowercase form starts with the lowercased `query`.
///
/// Keeps the relative order of `known`. An empty query matches everything.
pub fn suggest<S: AsRef<str>>(query: &str, known: &[S]) -> Vec<String> {
    let query = query.to_lowercase();
    known
        .iter()
        .map(AsRef::as_ref)
        .filter(|handle| handle.to_lowercase().starts_with(&query))
        .map(str::to_string)
        .collect()
}

/// Keystroke handler: `None` hides the list, `Some` shows it (even if empty).
pub fn suggestions_for<S: AsRef<str>>(text: &str, known: &[S]) -> Option<Vec<String>> {
    detect_partial(text).map(|query| suggest(query, known))
}

/// Replaces the trailing `@partial` with `@chosen ` (note the space).
///
/// Only meaningful while a partial run is active; otherwise `text` comes back
/// unchanged.
pub fn apply_suggestion(text: &str, chosen: &str) -> String {
    match partial_range(text) {
        Some(range) => format!("{}@{} ", &text[..range.start], chosen),
        None => text.to_string(),
    }
}
