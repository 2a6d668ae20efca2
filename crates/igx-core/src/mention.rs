//! # Mention Scanner
//!
//! Finds `@handle` tokens in post text. A token is `@` followed by word
//! characters (ASCII letters, digits, `_`); there are no locale rules.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

/// An in-progress token: `@` plus zero or more word characters at the very end.
static PARTIAL_MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@([A-Za-z0-9_]*)$").expect("valid partial mention regex"));

/// A complete token: `@` plus at least one word character.
static MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@([A-Za-z0-9_]+)").expect("valid mention regex"));

pub fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Returns the word run after a trailing `@`, if the text ends inside one.
///
/// The run may be empty (`"@"` yields `Some("")`). Text ending in whitespace or
/// punctuation after the run yields `None`.
pub fn detect_partial(text: &str) -> Option<&str> {
    PARTIAL_MENTION
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Byte range of the trailing `@partial` run, `@` included.
pub(crate) fn partial_range(text: &str) -> Option<Range<usize>> {
    PARTIAL_MENTION.find(text).map(|m| m.range())
}

/// Every completed mention in order of appearance, repeats included.
pub fn extract_mentions(text: &str) -> Vec<String> {
    mention_spans(text)
        .map(|(_, handle)| handle.to_string())
        .collect()
}

/// Yields `(range of "@handle", handle)` for each completed mention.
pub fn mention_spans(text: &str) -> impl Iterator<Item = (Range<usize>, &str)> {
    MENTION.captures_iter(text).filter_map(|caps| {
        let whole = caps.get(0)?;
        let handle = caps.get(1)?;
        Some((whole.range(), handle.as_str()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_at_end_of_text() {
        assert_eq!(detect_partial("hello @al"), Some("al"));
        assert_eq!(detect_partial("@"), Some(""));
        assert_eq!(detect_partial("hello @"), Some(""));
    }

    #[test]
    fn test_no_partial_after_whitespace_or_without_at() {
        assert_eq!(detect_partial("hello @al "), None);
        assert_eq!(detect_partial("no at sign"), None);
        assert_eq!(detect_partial(""), None);
        assert_eq!(detect_partial("@al!"), None);
    }

    #[test]
    fn test_partial_only_considers_last_run() {
        assert_eq!(detect_partial("@bob hi @ca"), Some("ca"));
        assert_eq!(detect_partial("mail@host"), Some("host"));
    }

    #[test]
    fn test_partial_ignores_non_ascii_word_chars() {
        assert_eq!(detect_partial("@émile"), None);
        assert_eq!(detect_partial("@mil€"), None);
    }

    #[test]
    fn test_extract_preserves_order_and_duplicates() {
        assert_eq!(
            extract_mentions("hi @bob and @bob again"),
            vec!["bob", "bob"]
        );
        assert_eq!(
            extract_mentions("@carol, @dave_2 and @Carol"),
            vec!["carol", "dave_2", "Carol"]
        );
    }

    #[test]
    fn test_bare_at_does_not_stop_scanning() {
        assert_eq!(extract_mentions("@ @! a @x"), vec!["x"]);
        assert!(extract_mentions("trailing @").is_empty());
    }

    #[test]
    fn test_spans_cover_the_at_sign() {
        let text = "yo @ann!";
        let spans: Vec<_> = mention_spans(text).collect();
        assert_eq!(spans, vec![(3..7, "ann")]);
        assert_eq!(&text[spans[0].0.clone()], "@ann");
    }

    #[test]
    fn test_partial_range_includes_at() {
        assert_eq!(partial_range("hi @al"), Some(3..6));
        assert_eq!(partial_range("hi @al "), None);
    }
}
