//! Property-based tests for the mention pipeline.
//!
//! These generate post-like text with a mix of handles, bare `@` signs and
//! punctuation, and check that rendering never loses text and that
//! extraction, rendering and suggestion agree with one another.

use igx_core::mention::{detect_partial, extract_mentions};
use igx_core::render::{concat, render, Segment};
use igx_core::suggest::{apply_suggestion, suggest};
use proptest::prelude::*;

fn handle_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9_]{1,12}").expect("valid regex")
}

/// Text biased towards `@`, word characters and separators.
fn text_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[@a-zA-Z0-9_ .,!\n€é-]{0,60}").expect("valid regex")
}

proptest! {
    #[test]
    fn test_render_is_lossless_with_every_handle_known(text in text_strategy()) {
        let known = extract_mentions(&text);
        let segments = render(&text, &known, None);
        prop_assert_eq!(concat(&segments), text);
    }

    #[test]
    fn test_render_is_lossless_with_no_handles_known(text in text_strategy(), viewer in handle_strategy()) {
        let known: Vec<String> = Vec::new();
        let segments = render(&text, &known, Some(viewer.as_str()));
        prop_assert!(segments.iter().all(|s| matches!(s, Segment::Literal(_))));
        prop_assert_eq!(concat(&segments), text);
    }

    #[test]
    fn test_links_follow_extraction_order(text in text_strategy()) {
        let mentions = extract_mentions(&text);
        let linked: Vec<String> = render(&text, &mentions, None)
            .into_iter()
            .filter_map(|s| match s {
                Segment::MentionLink { handle, .. } => Some(handle),
                Segment::Literal(_) => None,
            })
            .collect();
        prop_assert_eq!(linked, mentions);
    }

    #[test]
    fn test_suggest_is_an_ordered_subsequence(
        query in "[A-Za-z]{0,3}",
        known in prop::collection::vec(handle_strategy(), 0..8),
    ) {
        let picked = suggest(&query, &known);
        let mut rest = known.iter();
        for handle in &picked {
            prop_assert!(rest.any(|k| k == handle));
            prop_assert!(handle.to_lowercase().starts_with(&query.to_lowercase()));
        }
    }

    #[test]
    fn test_applied_suggestion_completes_the_mention(prefix in text_strategy(), partial in "[a-z]{0,5}", chosen in handle_strategy()) {
        let text = format!("{prefix} @{partial}");
        prop_assume!(detect_partial(&text).is_some());
        let applied = apply_suggestion(&text, &chosen);
        let expected_suffix = format!("@{chosen} ");
        prop_assert!(applied.ends_with(&expected_suffix));
        prop_assert_eq!(detect_partial(&applied), None);
        let mentions = extract_mentions(&applied);
        prop_assert_eq!(mentions.last(), Some(&chosen));
    }
}
