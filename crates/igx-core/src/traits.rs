//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Follow, FollowCounts, FollowEvent, Handle, NewPost, Post, User};

/// Data persistence contract for users, posts, and follows.
///
/// Domain failures (duplicate email, taken handle) are returned as an
/// [`AppError`](crate::error::AppError) inside the `anyhow::Error` so callers can
/// downcast them.
#[async_trait]
pub trait SocialRepo: Send + Sync {
    // User Operations
    async fn create_user(&self, email: &str, password_hash: &str) -> anyhow::Result<User>;
    /// Returns the user together with the stored password hash.
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<(User, String)>>;
    async fn get_user(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn set_username(&self, id: Uuid, handle: &str) -> anyhow::Result<()>;
    /// Every registered handle, in registration order.
    async fn list_handles(&self) -> anyhow::Result<Vec<Handle>>;
    /// Case-insensitive substring search on handles. An empty term finds nobody.
    async fn search_users(&self, term: &str) -> anyhow::Result<Vec<User>>;

    // Post Operations
    async fn create_post(&self, post: NewPost) -> anyhow::Result<Post>;
    /// All posts, newest first.
    async fn list_posts(&self) -> anyhow::Result<Vec<Post>>;
    async fn list_posts_by_author(&self, author_id: Uuid) -> anyhow::Result<Vec<Post>>;
    /// Posts whose stored mention list contains `handle`, newest first.
    async fn mentions_of(&self, handle: &str) -> anyhow::Result<Vec<Post>>;

    // Follow Operations
    /// Records the follow and returns the stored row; following twice returns the first row.
    async fn follow(&self, follower_id: Uuid, following_id: Uuid) -> anyhow::Result<Follow>;
    async fn unfollow(&self, follower_id: Uuid, following_id: Uuid) -> anyhow::Result<()>;
    async fn following_ids(&self, follower_id: Uuid) -> anyhow::Result<Vec<Uuid>>;
    /// Follows of `user_id`, newest first, with follower handles resolved.
    async fn followers_of(&self, user_id: Uuid) -> anyhow::Result<Vec<FollowEvent>>;
    async fn follow_counts(&self, user_id: Uuid) -> anyhow::Result<FollowCounts>;
}

/// Identity contract: password hashing and session tokens.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Produces a self-describing hash string for storage.
    async fn hash_password(&self, password: &str) -> anyhow::Result<String>;

    /// Verifies a password against a stored hash. Malformed hashes never verify.
    async fn verify_password(&self, password: &str, hash: &str) -> bool;

    /// Issues an opaque token naming `user_id`.
    fn issue_session(&self, user_id: Uuid) -> anyhow::Result<String>;

    /// Returns the user a token was issued for, or `None` if it was tampered with.
    fn resolve_session(&self, token: &str) -> Option<Uuid>;
}
