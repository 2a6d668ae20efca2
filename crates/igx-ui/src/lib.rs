//! # igx-ui
//!
//! Askama page templates and the view structs they render from.
//! Templates live in `crates/igx-ui/templates/`; all interpolated values are
//! HTML-escaped by askama.

use askama::Template;
use chrono::{DateTime, Utc};
use igx_core::models::{FollowCounts, Post, User};
use igx_core::notify::Notification;
use igx_core::render::{render, Segment};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

fn display_time(at: DateTime<Utc>) -> String {
    at.format(DATE_FORMAT).to_string()
}

/// Where a mention link points.
pub fn mention_href(handle: &str) -> String {
    format!("/people?q={handle}")
}

/// One piece of post text, ready for the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentView {
    pub text: String,
    /// `Some` for linkified mentions
    pub href: Option<String>,
    pub class: &'static str,
}

impl From<&Segment> for SegmentView {
    fn from(segment: &Segment) -> Self {
        match segment {
            Segment::Literal(text) => SegmentView {
                text: text.clone(),
                href: None,
                class: "",
            },
            Segment::MentionLink { handle, is_viewer } => SegmentView {
                text: segment.text(),
                href: Some(mention_href(handle)),
                class: if *is_viewer {
                    "mention mention-self"
                } else {
                    "mention mention-other"
                },
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostView {
    pub username: String,
    pub created_at: String,
    pub segments: Vec<SegmentView>,
    pub image_url: Option<String>,
}

impl PostView {
    /// Renders the stored body against the current directory snapshot.
    pub fn build(post: &Post, known: &[String], viewer: Option<&str>) -> Self {
        Self {
            username: post.username.clone(),
            created_at: display_time(post.created_at),
            segments: render(&post.content, known, viewer)
                .iter()
                .map(SegmentView::from)
                .collect(),
            image_url: post.image_url.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NotificationView {
    pub kind: &'static str,
    pub sender: String,
    pub verb: &'static str,
    pub excerpt: Option<String>,
    pub created_at: String,
}

impl From<&Notification> for NotificationView {
    fn from(notification: &Notification) -> Self {
        let (kind, excerpt) = match notification {
            Notification::Mention { content, .. } => ("mention", Some(content.clone())),
            Notification::Follow { .. } => ("follow", None),
        };
        Self {
            kind,
            sender: notification.sender().to_string(),
            verb: notification.verb(),
            excerpt,
            created_at: display_time(notification.created_at()),
        }
    }
}

/// A row in the people search.
#[derive(Debug, Clone)]
pub struct PersonView {
    pub id: String,
    pub username: String,
    pub followers: u64,
    pub following: u64,
    /// The viewer's own row gets no follow button.
    pub is_self: bool,
    pub is_followed: bool,
}

impl PersonView {
    pub fn build(user: &User, counts: FollowCounts, viewer: &User, is_followed: bool) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone().unwrap_or_default(),
            followers: counts.followers,
            following: counts.following,
            is_self: user.id == viewer.id,
            is_followed,
        }
    }
}

#[derive(Template)]
#[template(path = "auth.html")]
pub struct AuthTemplate<'a> {
    pub title: &'a str,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "username.html")]
pub struct UsernameTemplate<'a> {
    pub title: &'a str,
    pub current: String,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "feed.html")]
pub struct FeedTemplate<'a> {
    pub title: &'a str,
    pub viewer: &'a str,
    pub posts: Vec<PostView>,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "notifications.html")]
pub struct NotificationsTemplate<'a> {
    pub title: &'a str,
    pub viewer: &'a str,
    pub notifications: Vec<NotificationView>,
}

#[derive(Template)]
#[template(path = "mentions.html")]
pub struct MentionsTemplate<'a> {
    pub title: &'a str,
    pub viewer: &'a str,
    pub posts: Vec<PostView>,
}

#[derive(Template)]
#[template(path = "people.html")]
pub struct PeopleTemplate<'a> {
    pub title: &'a str,
    pub viewer: &'a str,
    pub query: String,
    pub people: Vec<PersonView>,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate<'a> {
    pub title: &'a str,
    pub viewer: &'a str,
    pub counts: FollowCounts,
    pub posts: Vec<PostView>,
}
