//! # igx-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `igx-core` domain models.
//!
//! Mention lists are stored as JSON arrays and searched with `json_each`, so a
//! post is found by `mentions_of` exactly when its stored list names the handle.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use igx_core::error::AppError;
use igx_core::models::{Follow, FollowCounts, FollowEvent, Handle, NewPost, Post, User};
use igx_core::traits::SocialRepo;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

const SCHEMA: [&str; 5] = [
    "CREATE TABLE IF NOT EXISTS users (
        id            BLOB PRIMARY KEY,
        email         TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        username      TEXT UNIQUE,
        created_at    TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS posts (
        id         BLOB PRIMARY KEY,
        author_id  BLOB NOT NULL REFERENCES users(id),
        username   TEXT NOT NULL,
        content    TEXT NOT NULL,
        image_url  TEXT,
        mentions   TEXT NOT NULL DEFAULT '[]',
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS followers (
        id           BLOB PRIMARY KEY,
        follower_id  BLOB NOT NULL REFERENCES users(id),
        following_id BLOB NOT NULL REFERENCES users(id),
        created_at   TEXT NOT NULL,
        UNIQUE (follower_id, following_id)
    )",
    "CREATE INDEX IF NOT EXISTS posts_created_at ON posts (created_at)",
    "CREATE INDEX IF NOT EXISTS followers_following ON followers (following_id)",
];

const POST_COLUMNS: &str = "id, author_id, username, content, image_url, mentions, created_at";
const USER_COLUMNS: &str = "id, email, username, created_at";

pub struct SqliteSocialRepo {
    pool: SqlitePool,
}

impl SqliteSocialRepo {
    /// Connects and creates the schema if it is missing.
    ///
    /// An in-memory database lives as long as its connection, so `:memory:`
    /// URLs get a single connection that is never recycled.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let mut pool = SqlitePoolOptions::new();
        if url.contains(":memory:") {
            pool = pool
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>);
        } else {
            pool = pool.max_connections(5);
        }

        let repo = Self {
            pool: pool.connect_with(options).await?,
        };
        repo.migrate().await?;
        log::info!("sqlite repository ready at {url}");
        Ok(repo)
    }

    async fn migrate(&self) -> anyhow::Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

// Helper for UUID conversion
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> anyhow::Result<Uuid> {
    Ok(Uuid::from_slice(blob)?)
}

fn user_from_row(row: &SqliteRow) -> anyhow::Result<User> {
    Ok(User {
        id: blob_to_uuid(&row.try_get::<Vec<u8>, _>("id")?)?,
        email: row.try_get("email")?,
        username: row.try_get("username")?,
        created_at: row.try_get("created_at")?,
    })
}

fn post_from_row(row: &SqliteRow) -> anyhow::Result<Post> {
    Ok(Post {
        id: blob_to_uuid(&row.try_get::<Vec<u8>, _>("id")?)?,
        author_id: blob_to_uuid(&row.try_get::<Vec<u8>, _>("author_id")?)?,
        username: row.try_get("username")?,
        content: row.try_get("content")?,
        image_url: row.try_get("image_url")?,
        mentions: serde_json::from_str(&row.try_get::<String, _>("mentions")?)?,
        created_at: row.try_get("created_at")?,
    })
}

/// Turns a unique-constraint violation into a domain conflict.
fn conflict_or(err: sqlx::Error, what: &str) -> anyhow::Error {
    let unique = err
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation());
    if unique {
        AppError::Conflict(format!("{what} is already taken")).into()
    } else {
        err.into()
    }
}

/// Escapes LIKE wildcards so the term matches literally.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl SocialRepo for SqliteSocialRepo {
    async fn create_user(&self, email: &str, password_hash: &str) -> anyhow::Result<User> {
        let user = User {
            id: Uuid::now_v7(),
            email: email.to_string(),
            username: None,
            created_at: Utc::now(),
        };

        sqlx::query("INSERT INTO users (id, email, password_hash, created_at) VALUES (?, ?, ?, ?)")
            .bind(uuid_to_blob(user.id))
            .bind(&user.email)
            .bind(password_hash)
            .bind(user.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| conflict_or(e, "email"))?;

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<(User, String)>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some((user_from_row(&row)?, row.try_get("password_hash")?))),
            None => Ok(None),
        }
    }

    async fn get_user(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn set_username(&self, id: Uuid, handle: &str) -> anyhow::Result<()> {
        let result = sqlx::query("UPDATE users SET username = ? WHERE id = ?")
            .bind(handle)
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await
            .map_err(|e| conflict_or(e, "handle"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User".to_string(), id.to_string()).into());
        }
        Ok(())
    }

    async fn list_handles(&self) -> anyhow::Result<Vec<Handle>> {
        let handles: Vec<Handle> = sqlx::query_scalar(
            "SELECT username FROM users WHERE username IS NOT NULL ORDER BY created_at ASC, rowid ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(handles)
    }

    async fn search_users(&self, term: &str) -> anyhow::Result<Vec<User>> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username LIKE ? ESCAPE '\\' ORDER BY username"
        ))
        .bind(like_pattern(term))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(user_from_row).collect()
    }

    async fn create_post(&self, post: NewPost) -> anyhow::Result<Post> {
        let post = post.into_post(Uuid::now_v7());

        sqlx::query(&format!("INSERT INTO posts ({POST_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?)"))
            .bind(uuid_to_blob(post.id))
            .bind(uuid_to_blob(post.author_id))
            .bind(&post.username)
            .bind(&post.content)
            .bind(&post.image_url)
            .bind(serde_json::to_string(&post.mentions)?)
            .bind(post.created_at)
            .execute(&self.pool)
            .await?;

        log::debug!("stored post {} with {} mention(s)", post.id, post.mentions.len());
        Ok(post)
    }

    async fn list_posts(&self) -> anyhow::Result<Vec<Post>> {
        let rows = sqlx::query(&format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC, rowid DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(post_from_row).collect()
    }

    async fn list_posts_by_author(&self, author_id: Uuid) -> anyhow::Result<Vec<Post>> {
        let rows = sqlx::query(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE author_id = ? ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(uuid_to_blob(author_id))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(post_from_row).collect()
    }

    async fn mentions_of(&self, handle: &str) -> anyhow::Result<Vec<Post>> {
        let rows = sqlx::query(&format!(
            "SELECT {POST_COLUMNS} FROM posts
             WHERE EXISTS (SELECT 1 FROM json_each(posts.mentions) WHERE json_each.value = ?)
             ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(handle)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(post_from_row).collect()
    }

    async fn follow(&self, follower_id: Uuid, following_id: Uuid) -> anyhow::Result<Follow> {
        if follower_id == following_id {
            return Err(AppError::ValidationError("cannot follow yourself".to_string()).into());
        }

        sqlx::query(
            "INSERT OR IGNORE INTO followers (id, follower_id, following_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(Uuid::now_v7()))
        .bind(uuid_to_blob(follower_id))
        .bind(uuid_to_blob(following_id))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let row = sqlx::query(
            "SELECT id, follower_id, following_id, created_at FROM followers
             WHERE follower_id = ? AND following_id = ?",
        )
        .bind(uuid_to_blob(follower_id))
        .bind(uuid_to_blob(following_id))
        .fetch_one(&self.pool)
        .await?;

        Ok(Follow {
            id: blob_to_uuid(&row.try_get::<Vec<u8>, _>("id")?)?,
            follower_id: blob_to_uuid(&row.try_get::<Vec<u8>, _>("follower_id")?)?,
            following_id: blob_to_uuid(&row.try_get::<Vec<u8>, _>("following_id")?)?,
            created_at: row.try_get("created_at")?,
        })
    }

    async fn unfollow(&self, follower_id: Uuid, following_id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM followers WHERE follower_id = ? AND following_id = ?")
            .bind(uuid_to_blob(follower_id))
            .bind(uuid_to_blob(following_id))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn following_ids(&self, follower_id: Uuid) -> anyhow::Result<Vec<Uuid>> {
        let blobs: Vec<Vec<u8>> =
            sqlx::query_scalar("SELECT following_id FROM followers WHERE follower_id = ?")
                .bind(uuid_to_blob(follower_id))
                .fetch_all(&self.pool)
                .await?;

        blobs.iter().map(|blob| blob_to_uuid(blob)).collect()
    }

    async fn followers_of(&self, user_id: Uuid) -> anyhow::Result<Vec<FollowEvent>> {
        let rows = sqlx::query(
            "SELECT f.follower_id, u.username, f.created_at
             FROM followers f LEFT JOIN users u ON u.id = f.follower_id
             WHERE f.following_id = ?
             ORDER BY f.created_at DESC, f.rowid DESC",
        )
        .bind(uuid_to_blob(user_id))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(FollowEvent {
                    follower_id: blob_to_uuid(&row.try_get::<Vec<u8>, _>("follower_id")?)?,
                    follower_username: row.try_get("username")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }

    async fn follow_counts(&self, user_id: Uuid) -> anyhow::Result<FollowCounts> {
        let id = uuid_to_blob(user_id);
        let followers: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM followers WHERE following_id = ?")
                .bind(&id)
                .fetch_one(&self.pool)
                .await?;
        let following: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM followers WHERE follower_id = ?")
                .bind(&id)
                .fetch_one(&self.pool)
                .await?;

        Ok(FollowCounts {
            followers: u64::try_from(followers)?,
            following: u64::try_from(following)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};
    use pretty_assertions::assert_eq;

    async fn repo() -> SqliteSocialRepo {
        SqliteSocialRepo::new("sqlite::memory:").await.unwrap()
    }

    async fn user(repo: &SqliteSocialRepo, handle: &str) -> User {
        let user = repo
            .create_user(&format!("{handle}@example.com"), "hash")
            .await
            .unwrap();
        repo.set_username(user.id, handle).await.unwrap();
        user
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    async fn post(repo: &SqliteSocialRepo, author: &User, content: &str, secs: i64) -> Post {
        let draft = NewPost::compose(
            author.id,
            author.username.clone().unwrap(),
            content.to_string(),
            None,
            at(secs),
        )
        .unwrap();
        repo.create_post(draft).await.unwrap()
    }

    fn app_error(err: anyhow::Error) -> AppError {
        err.downcast::<AppError>().unwrap()
    }

    #[tokio::test]
    async fn test_users_and_handles() {
        let repo = repo().await;
        let alice = user(&repo, "alice").await;
        user(&repo, "bob").await;
        repo.create_user("pending@example.com", "hash").await.unwrap();

        assert_eq!(repo.list_handles().await.unwrap(), vec!["alice", "bob"]);

        let (found, hash) = repo
            .find_user_by_email("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, alice.id);
        assert_eq!(found.username.as_deref(), Some("alice"));
        assert_eq!(hash, "hash");
        assert!(repo.find_user_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_and_handle_conflict() {
        let repo = repo().await;
        let alice = user(&repo, "alice").await;
        let other = repo.create_user("other@example.com", "hash").await.unwrap();

        let err = repo.create_user("alice@example.com", "x").await.unwrap_err();
        assert!(matches!(app_error(err), AppError::Conflict(_)));

        let err = repo.set_username(other.id, "alice").await.unwrap_err();
        assert!(matches!(app_error(err), AppError::Conflict(_)));

        // Re-saving your own handle is fine.
        repo.set_username(alice.id, "alice").await.unwrap();
    }

    #[tokio::test]
    async fn test_set_username_unknown_user() {
        let repo = repo().await;
        let err = repo.set_username(Uuid::now_v7(), "ghost").await.unwrap_err();
        assert!(matches!(app_error(err), AppError::NotFound(..)));
    }

    #[tokio::test]
    async fn test_posts_round_trip_newest_first() {
        let repo = repo().await;
        let alice = user(&repo, "alice").await;
        let first = post(&repo, &alice, "first @bob", 10).await;
        let second = post(&repo, &alice, "second", 20).await;

        let posts = repo.list_posts().await.unwrap();
        assert_eq!(posts, vec![second.clone(), first.clone()]);
        assert_eq!(posts[1].mentions, vec!["bob"]);

        let own = repo.list_posts_by_author(alice.id).await.unwrap();
        assert_eq!(own.len(), 2);
        assert!(repo.list_posts_by_author(Uuid::now_v7()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mentions_of_uses_stored_list() {
        let repo = repo().await;
        let alice = user(&repo, "alice").await;
        let bob = user(&repo, "bob").await;
        post(&repo, &alice, "hey @bob", 1).await;
        post(&repo, &alice, "@bobby is someone else", 2).await;
        post(&repo, &bob, "talking to myself @bob @bob", 3).await;
        post(&repo, &alice, "@ghost never registered", 4).await;

        let mentions = repo.mentions_of("bob").await.unwrap();
        let bodies: Vec<_> = mentions.iter().map(|p| p.content.as_str()).collect();
        assert_eq!(bodies, vec!["talking to myself @bob @bob", "hey @bob"]);

        // Stored even though no such user exists.
        assert_eq!(repo.mentions_of("ghost").await.unwrap().len(), 1);
        assert!(repo.mentions_of("Bob").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_follow_unfollow_and_counts() {
        let repo = repo().await;
        let alice = user(&repo, "alice").await;
        let bob = user(&repo, "bob").await;
        let carol = user(&repo, "carol").await;

        let first = repo.follow(alice.id, bob.id).await.unwrap();
        assert_eq!(first.follower_id, alice.id);
        assert_eq!(first.following_id, bob.id);
        let again = repo.follow(alice.id, bob.id).await.unwrap();
        assert_eq!(again, first);
        repo.follow(carol.id, bob.id).await.unwrap();
        repo.follow(alice.id, carol.id).await.unwrap();

        assert_eq!(
            repo.follow_counts(bob.id).await.unwrap(),
            FollowCounts { followers: 2, following: 0 }
        );
        assert_eq!(
            repo.follow_counts(alice.id).await.unwrap(),
            FollowCounts { followers: 0, following: 2 }
        );

        let mut following = repo.following_ids(alice.id).await.unwrap();
        following.sort();
        let mut expected = vec![bob.id, carol.id];
        expected.sort();
        assert_eq!(following, expected);

        repo.unfollow(alice.id, bob.id).await.unwrap();
        assert_eq!(repo.follow_counts(bob.id).await.unwrap().followers, 1);

        let err = repo.follow(alice.id, alice.id).await.unwrap_err();
        assert!(matches!(app_error(err), AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_followers_of_resolves_handles() {
        let repo = repo().await;
        let alice = user(&repo, "alice").await;
        let bob = user(&repo, "bob").await;
        let nameless = repo.create_user("nameless@example.com", "hash").await.unwrap();

        repo.follow(bob.id, alice.id).await.unwrap();
        repo.follow(nameless.id, alice.id).await.unwrap();

        let events = repo.followers_of(alice.id).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].follower_id, nameless.id);
        assert_eq!(events[0].follower_username, None);
        assert_eq!(events[1].follower_username.as_deref(), Some("bob"));
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_and_literal() {
        let repo = repo().await;
        user(&repo, "Alice").await;
        user(&repo, "malice").await;
        user(&repo, "a_b").await;
        user(&repo, "axb").await;

        let names = |users: Vec<User>| -> Vec<String> {
            users.into_iter().filter_map(|u| u.username).collect()
        };

        assert_eq!(names(repo.search_users("ALI").await.unwrap()), vec!["Alice", "malice"]);
        assert_eq!(names(repo.search_users("a_").await.unwrap()), vec!["a_b"]);
        assert!(repo.search_users("  ").await.unwrap().is_empty());
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("a_b%c\\"), "%a\\_b\\%c\\\\%");
    }
}
