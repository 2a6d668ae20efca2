//! # Notification Aggregator
//!
//! Turns the two independently fetched event lists (posts that mention the
//! viewer, follows of the viewer) into a single notification feed.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{FollowEvent, Handle, Post};

/// Sender shown for a follow whose follower handle could not be resolved.
pub const UNKNOWN_SENDER: &str = "Unknown User";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    Mention {
        sender: Handle,
        content: String,
        created_at: DateTime<Utc>,
    },
    Follow {
        sender: Handle,
        created_at: DateTime<Utc>,
    },
}

impl Notification {
    pub fn sender(&self) -> &str {
        match self {
            Notification::Mention { sender, .. } | Notification::Follow { sender, .. } => {
                sender.as_str()
            }
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Notification::Mention { created_at, .. } | Notification::Follow { created_at, .. } => {
                *created_at
            }
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Notification::Mention { .. } => "mentioned you",
            Notification::Follow { .. } => "followed you",
        }
    }
}

/// Tags and concatenates: all mentions first, then all follows.
///
/// Relative input order is kept and nothing is re-sorted. Each input is
/// expected to arrive newest first; the combined list is only globally ordered
/// if the caller sorts it (see [`newest_first`]).
pub fn merge(mentions: &[Post], follows: &[FollowEvent]) -> Vec<Notification> {
    let mentions = mentions.iter().map(|post| Notification::Mention {
        sender: post.username.clone(),
        content: post.content.clone(),
        created_at: post.created_at,
    });
    let follows = follows.iter().map(|follow| Notification::Follow {
        sender: follow
            .follower_username
            .clone()
            .unwrap_or_else(|| UNKNOWN_SENDER.to_string()),
        created_at: follow.created_at,
    });
    mentions.chain(follows).collect()
}

/// [`merge`] over fetch results. A failed source contributes nothing.
pub fn merge_fetched(
    mentions: anyhow::Result<Vec<Post>>,
    follows: anyhow::Result<Vec<FollowEvent>>,
) -> Vec<Notification> {
    let mentions = mentions.unwrap_or_else(|e| {
        log::warn!("mention notifications unavailable: {e:#}");
        Vec::new()
    });
    let follows = follows.unwrap_or_else(|e| {
        log::warn!("follow notifications unavailable: {e:#}");
        Vec::new()
    });
    merge(&mentions, &follows)
}

/// Stable sort, most recent first.
pub fn newest_first(notifications: &mut [Notification]) {
    notifications.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    fn mention_post(author: &str, content: &str, secs: i64) -> Post {
        Post {
            id: Uuid::now_v7(),
            author_id: Uuid::now_v7(),
            username: author.to_string(),
            content: content.to_string(),
            image_url: None,
            mentions: vec!["me".to_string()],
            created_at: at(secs),
        }
    }

    fn follow(follower: Option<&str>, secs: i64) -> FollowEvent {
        FollowEvent {
            follower_id: Uuid::now_v7(),
            follower_username: follower.map(str::to_string),
            created_at: at(secs),
        }
    }

    #[test]
    fn test_empty_inputs_give_empty_feed() {
        assert!(merge(&[], &[]).is_empty());
    }

    #[test]
    fn test_mention_then_follow_in_input_order() {
        let feed = merge(&[mention_post("bob", "hey @me", 20)], &[follow(Some("carol"), 10)]);
        assert_eq!(
            feed,
            vec![
                Notification::Mention {
                    sender: "bob".to_string(),
                    content: "hey @me".to_string(),
                    created_at: at(20),
                },
                Notification::Follow {
                    sender: "carol".to_string(),
                    created_at: at(10),
                },
            ]
        );
    }

    #[test]
    fn test_merge_does_not_resort_interleaved_sources() {
        let feed = merge(&[mention_post("bob", "@me", 5)], &[follow(Some("carol"), 50)]);
        let times: Vec<_> = feed.iter().map(Notification::created_at).collect();
        assert_eq!(times, vec![at(5), at(50)]);
    }

    #[test]
    fn test_unresolved_follower_gets_placeholder() {
        let feed = merge(&[], &[follow(None, 1)]);
        assert_eq!(feed[0].sender(), UNKNOWN_SENDER);
        assert_eq!(feed[0].verb(), "followed you");
    }

    #[test]
    fn test_failed_source_contributes_nothing() {
        let feed = merge_fetched(
            Err(anyhow::anyhow!("posts table offline")),
            Ok(vec![follow(Some("carol"), 3)]),
        );
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].sender(), "carol");

        let feed = merge_fetched(Ok(vec![mention_post("bob", "@me", 1)]), Err(anyhow::anyhow!("boom")));
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].verb(), "mentioned you");
    }

    #[test]
    fn test_newest_first_orders_and_keeps_ties_stable() {
        let mut feed = merge(
            &[mention_post("a", "@me", 5), mention_post("b", "@me", 1)],
            &[follow(Some("c"), 9), follow(Some("d"), 5)],
        );
        newest_first(&mut feed);
        let senders: Vec<_> = feed.iter().map(Notification::sender).collect();
        assert_eq!(senders, vec!["c", "a", "d", "b"]);
    }
}
