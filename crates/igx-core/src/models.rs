//! # Domain Models
//!
//! These structs represent the core entities of IGX.
//! We use UUID v7 for time-ordered, globally unique identification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::mention::{extract_mentions, is_word_char};

/// A user-facing, case-sensitive username. Uniqueness is enforced by the repo.
pub type Handle = String;

/// Longest handle accepted by [`validate_handle`].
pub const MAX_HANDLE_LEN: usize = 32;

/// Longest post body accepted by [`NewPost::compose`], in characters.
pub const MAX_POST_LEN: usize = 2000;

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    /// `None` until the account has picked a handle.
    pub username: Option<Handle>,
    pub created_at: DateTime<Utc>,
}

/// A finalized post. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    /// Author handle at posting time
    pub username: Handle,
    pub content: String,
    pub image_url: Option<String>,
    /// Handles extracted from `content` when the post was created.
    /// Never re-validated against the directory, so unknown handles stay here.
    pub mentions: Vec<Handle>,
    pub created_at: DateTime<Utc>,
}

/// A post that has been composed but not yet stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub author_id: Uuid,
    pub username: Handle,
    pub content: String,
    pub image_url: Option<String>,
    pub mentions: Vec<Handle>,
    pub created_at: DateTime<Utc>,
}

impl NewPost {
    /// Finalizes the composing text into a post draft.
    ///
    /// The mention list is computed here, once. A blank image URL counts as no
    /// image. A post needs either some text or an image.
    pub fn compose(
        author_id: Uuid,
        username: Handle,
        content: String,
        image_url: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self> {
        let image_url = image_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        if content.trim().is_empty() && image_url.is_none() {
            return Err(AppError::ValidationError(
                "post needs text or an image".to_string(),
            ));
        }
        if content.chars().count() > MAX_POST_LEN {
            return Err(AppError::ValidationError(format!(
                "post is longer than {MAX_POST_LEN} characters"
            )));
        }

        let mentions = extract_mentions(&content);
        Ok(Self {
            author_id,
            username,
            content,
            image_url,
            mentions,
            created_at,
        })
    }

    /// Attaches the storage-assigned ID.
    pub fn into_post(self, id: Uuid) -> Post {
        Post {
            id,
            author_id: self.author_id,
            username: self.username,
            content: self.content,
            image_url: self.image_url,
            mentions: self.mentions,
            created_at: self.created_at,
        }
    }
}

/// One user following another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Follow {
    pub id: Uuid,
    pub follower_id: Uuid,
    pub following_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A follow of the viewer, as fetched for the notification feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowEvent {
    pub follower_id: Uuid,
    /// `None` when the follower has no handle yet or could not be resolved.
    pub follower_username: Option<Handle>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowCounts {
    pub followers: u64,
    pub following: u64,
}

/// Checks that a handle can be written as `@handle` and still be recognized.
pub fn validate_handle(handle: &str) -> Result<()> {
    if handle.is_empty() {
        return Err(AppError::ValidationError("handle is empty".to_string()));
    }
    if handle.chars().count() > MAX_HANDLE_LEN {
        return Err(AppError::ValidationError(format!(
            "handle is longer than {MAX_HANDLE_LEN} characters"
        )));
    }
    if !handle.chars().all(is_word_char) {
        return Err(AppError::ValidationError(
            "handle may only contain letters, digits and underscores".to_string(),
        ));
    }
    Ok(())
}
