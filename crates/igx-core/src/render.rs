//! # Mention Renderer
//!
//! Splits stored post text into literal and mention segments for display.
//! Only handles present in the directory become links; everything else stays
//! literal text, so concatenating the segments always gives back the input.

use std::collections::HashSet;

use serde::Serialize;

use crate::mention::mention_spans;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Segment {
    Literal(String),
    MentionLink {
        handle: String,
        /// The mention names the viewer.
        is_viewer: bool,
    },
}

impl Segment {
    /// The source text this segment covers.
    pub fn text(&self) -> String {
        match self {
            Segment::Literal(text) => text.clone(),
            Segment::MentionLink { handle, .. } => format!("@{handle}"),
        }
    }
}

/// Renders `text` against the known handles, from the point of view of `viewer`.
///
/// With no viewer, no mention is tagged as the viewer's. Adjacent literal
/// pieces are merged into one segment.
pub fn render<S: AsRef<str>>(text: &str, known: &[S], viewer: Option<&str>) -> Vec<Segment> {
    let known: HashSet<&str> = known.iter().map(AsRef::as_ref).collect();
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut cursor = 0;

    for (range, handle) in mention_spans(text) {
        literal.push_str(&text[cursor..range.start]);
        if known.contains(handle) {
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::MentionLink {
                handle: handle.to_string(),
                is_viewer: viewer == Some(handle),
            });
        } else {
            literal.push_str(&text[range.clone()]);
        }
        cursor = range.end;
    }

    literal.push_str(&text[cursor..]);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}

/// Reassembles the original text from rendered segments.
pub fn concat(segments: &[Segment]) -> String {
    segments.iter().map(Segment::text).collect()
}
