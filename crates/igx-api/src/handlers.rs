//! # igx-api Handlers
//!
//! This module coordinates the flow between HTTP requests, the core traits,
//! and the pure mention/notification logic.

use actix_web::http::{header, StatusCode};
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use askama::Template;
use chrono::Utc;
use futures_util::future::try_join_all;
use igx_core::error::AppError;
use igx_core::models::{validate_handle, NewPost, User};
use igx_core::notify::{merge_fetched, newest_first};
use igx_core::suggest::{apply_suggestion, suggestions_for};
use igx_core::traits::{AuthProvider, SocialRepo};
use igx_ui::{
    AuthTemplate, FeedTemplate, MentionsTemplate, NotificationView, NotificationsTemplate,
    PeopleTemplate, PersonView, PostView, ProfileTemplate, UsernameTemplate,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::session::{
    removal_cookie, require_user, require_viewer, session_cookie, session_user, Viewer,
};

/// Shortest password accepted at sign-up.
pub const MIN_PASSWORD_LEN: usize = 6;

/// State shared across all Actix-web workers.
pub struct AppState {
    pub repo: Box<dyn SocialRepo>,
    pub auth: Box<dyn AuthProvider>,
}

type HandlerResult = Result<HttpResponse, ApiError>;

fn html(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(body)
}

fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Where a freshly signed-in user should land.
fn landing_for(user: &User) -> &'static str {
    if user.username.is_some() {
        "/feed"
    } else {
        "/username"
    }
}

// ── Auth ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    pub email: String,
    pub password: String,
}

pub async fn index(data: web::Data<AppState>, req: HttpRequest) -> HandlerResult {
    Ok(match session_user(&req, &data).await? {
        Some(user) => see_other(landing_for(&user)),
        None => see_other("/auth"),
    })
}

fn auth_page(status: StatusCode, error: Option<String>) -> HandlerResult {
    let body = AuthTemplate {
        title: "Sign in",
        error,
    }
    .render()?;
    Ok(html(status, body))
}

pub async fn auth_form() -> HandlerResult {
    auth_page(StatusCode::OK, None)
}

pub async fn login(data: web::Data<AppState>, form: web::Form<CredentialsForm>) -> HandlerResult {
    let form = form.into_inner();
    let email = form.email.trim().to_lowercase();

    let verified = match data.repo.find_user_by_email(&email).await? {
        Some((user, hash)) => data
            .auth
            .verify_password(&form.password, &hash)
            .await
            .then_some(user),
        None => {
            // Unknown emails cost one argon2 run as well.
            data.auth.hash_password(&form.password).await?;
            None
        }
    };
    let Some(user) = verified else {
        log::info!("failed sign-in attempt");
        return auth_page(
            StatusCode::UNAUTHORIZED,
            Some("Invalid email or password".to_string()),
        );
    };

    let token = data.auth.issue_session(user.id)?;
    Ok(HttpResponse::SeeOther()
        .cookie(session_cookie(token))
        .insert_header((header::LOCATION, landing_for(&user)))
        .finish())
}

pub async fn signup(data: web::Data<AppState>, form: web::Form<CredentialsForm>) -> HandlerResult {
    let form = form.into_inner();
    let email = form.email.trim().to_lowercase();

    if !email.contains('@') {
        return auth_page(StatusCode::BAD_REQUEST, Some("Enter a valid email".to_string()));
    }
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        return auth_page(
            StatusCode::BAD_REQUEST,
            Some(format!("Password must be at least {MIN_PASSWORD_LEN} characters")),
        );
    }

    let hash = data.auth.hash_password(&form.password).await?;
    let user = match data.repo.create_user(&email, &hash).await.map_err(ApiError::from) {
        Ok(user) => user,
        Err(ApiError::App(AppError::Conflict(_))) => {
            return auth_page(
                StatusCode::CONFLICT,
                Some("An account with that email already exists".to_string()),
            );
        }
        Err(err) => return Err(err),
    };
    log::info!("registered user {}", user.id);

    let token = data.auth.issue_session(user.id)?;
    Ok(HttpResponse::SeeOther()
        .cookie(session_cookie(token))
        .insert_header((header::LOCATION, "/username"))
        .finish())
}

pub async fn logout() -> HttpResponse {
    HttpResponse::SeeOther()
        .cookie(removal_cookie())
        .insert_header((header::LOCATION, "/auth"))
        .finish()
}

// ── Handle ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UsernameForm {
    pub username: String,
}

fn username_page(status: StatusCode, current: String, error: Option<String>) -> HandlerResult {
    let body = UsernameTemplate {
        title: "Set your username",
        current,
        error,
    }
    .render()?;
    Ok(html(status, body))
}

pub async fn username_form(data: web::Data<AppState>, req: HttpRequest) -> HandlerResult {
    let user = require_user(&req, &data).await?;
    username_page(StatusCode::OK, user.username.unwrap_or_default(), None)
}

pub async fn set_username(
    data: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<UsernameForm>,
) -> HandlerResult {
    let user = require_user(&req, &data).await?;
    let handle = form.into_inner().username.trim().to_string();

    let saved = match validate_handle(&handle) {
        Ok(()) => data.repo.set_username(user.id, &handle).await.map_err(ApiError::from),
        Err(err) => Err(ApiError::App(err)),
    };
    match saved {
        Ok(()) => Ok(see_other("/profile")),
        Err(err @ ApiError::App(AppError::ValidationError(_) | AppError::Conflict(_))) => {
            username_page(err.status_code(), handle, Some(err.to_string()))
        }
        Err(err) => Err(err),
    }
}

// ── Feed ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PostForm {
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

async fn feed_page(
    state: &AppState,
    viewer: &Viewer,
    status: StatusCode,
    error: Option<String>,
) -> HandlerResult {
    let (posts, known) = futures_util::join!(state.repo.list_posts(), state.repo.list_handles());
    let (posts, known) = (posts?, known?);

    let body = FeedTemplate {
        title: "Feed",
        viewer: &viewer.handle,
        posts: posts
            .iter()
            .map(|post| PostView::build(post, &known, Some(viewer.handle.as_str())))
            .collect(),
        error,
    }
    .render()?;
    Ok(html(status, body))
}

pub async fn feed(data: web::Data<AppState>, req: HttpRequest) -> HandlerResult {
    let viewer = require_viewer(&req, &data).await?;
    feed_page(&data, &viewer, StatusCode::OK, None).await
}

/// Finalizes the composed text. Mentions are extracted here, once, and stored
/// as-is; they are never checked against the directory.
pub async fn create_post(
    data: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<PostForm>,
) -> HandlerResult {
    let viewer = require_viewer(&req, &data).await?;
    let form = form.into_inner();

    let draft = match NewPost::compose(
        viewer.user.id,
        viewer.handle.clone(),
        form.content,
        form.image_url,
        Utc::now(),
    ) {
        Ok(draft) => draft,
        Err(err) => {
            let err = ApiError::App(err);
            return feed_page(&data, &viewer, err.status_code(), Some(err.to_string())).await;
        }
    };

    let post = data.repo.create_post(draft).await?;
    log::info!(
        "@{} posted {} mentioning {:?}",
        viewer.handle,
        post.id,
        post.mentions
    );
    Ok(see_other("/feed"))
}

// ── Suggestions (JSON) ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SuggestQuery {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuggestResponse {
    /// Whether the caret sits in an `@partial` run (show the list).
    pub active: bool,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    pub text: String,
    pub handle: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApplyResponse {
    pub text: String,
}

pub async fn api_suggest(
    data: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<SuggestQuery>,
) -> HandlerResult {
    require_viewer(&req, &data).await.map_err(ApiError::for_api)?;

    let known = data.repo.list_handles().await?;
    let response = match suggestions_for(&query.text, &known) {
        Some(suggestions) => SuggestResponse {
            active: true,
            suggestions,
        },
        None => SuggestResponse {
            active: false,
            suggestions: Vec::new(),
        },
    };
    Ok(HttpResponse::Ok().json(response))
}

pub async fn api_apply_suggestion(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<ApplyRequest>,
) -> HandlerResult {
    require_viewer(&req, &data).await.map_err(ApiError::for_api)?;

    let text = apply_suggestion(&body.text, &body.handle);
    Ok(HttpResponse::Ok().json(ApplyResponse { text }))
}

// ── Notifications & mentions ────────────────────────────────────────────────

pub async fn notifications(data: web::Data<AppState>, req: HttpRequest) -> HandlerResult {
    let viewer = require_viewer(&req, &data).await?;

    // Both sources are fetched concurrently; the merge runs once both resolve.
    let (mentions, follows) = futures_util::join!(
        data.repo.mentions_of(&viewer.handle),
        data.repo.followers_of(viewer.user.id),
    );
    let mut merged = merge_fetched(mentions, follows);
    newest_first(&mut merged);

    let body = NotificationsTemplate {
        title: "Notifications",
        viewer: &viewer.handle,
        notifications: merged.iter().map(NotificationView::from).collect(),
    }
    .render()?;
    Ok(html(StatusCode::OK, body))
}

pub async fn mentions(data: web::Data<AppState>, req: HttpRequest) -> HandlerResult {
    let viewer = require_viewer(&req, &data).await?;
    let (posts, known) = futures_util::join!(
        data.repo.mentions_of(&viewer.handle),
        data.repo.list_handles(),
    );
    let (posts, known) = (posts?, known?);

    let body = MentionsTemplate {
        title: "Mentions",
        viewer: &viewer.handle,
        posts: posts
            .iter()
            .map(|post| PostView::build(post, &known, Some(viewer.handle.as_str())))
            .collect(),
    }
    .render()?;
    Ok(html(StatusCode::OK, body))
}

// ── People ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct PeopleQuery {
    #[serde(default)]
    pub q: String,
}

pub async fn people(
    data: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<PeopleQuery>,
) -> HandlerResult {
    let viewer = require_viewer(&req, &data).await?;
    let query = query.into_inner().q;

    let (users, following) = futures_util::join!(
        data.repo.search_users(&query),
        data.repo.following_ids(viewer.user.id),
    );
    let (users, following) = (users?, following?);
    let counts = try_join_all(users.iter().map(|user| data.repo.follow_counts(user.id))).await?;

    let people = users
        .iter()
        .zip(counts)
        .map(|(user, counts)| {
            PersonView::build(user, counts, &viewer.user, following.contains(&user.id))
        })
        .collect();

    let body = PeopleTemplate {
        title: "People",
        viewer: &viewer.handle,
        query,
        people,
    }
    .render()?;
    Ok(html(StatusCode::OK, body))
}

/// Follows the target, or unfollows if already following.
pub async fn toggle_follow(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    form: web::Form<PeopleQuery>,
) -> HandlerResult {
    let viewer = require_viewer(&req, &data).await?;
    let target = path.into_inner();

    if data.repo.get_user(target).await?.is_none() {
        return Err(AppError::NotFound("User".to_string(), target.to_string()).into());
    }

    let following = data.repo.following_ids(viewer.user.id).await?;
    if following.contains(&target) {
        data.repo.unfollow(viewer.user.id, target).await?;
        log::info!("@{} unfollowed {target}", viewer.handle);
    } else {
        data.repo.follow(viewer.user.id, target).await?;
        log::info!("@{} followed {target}", viewer.handle);
    }

    let q = form.into_inner().q;
    let query = serde_urlencoded::to_string([("q", q.as_str())])
        .map_err(|e| ApiError::Internal(e.into()))?;
    Ok(see_other(&format!("/people?{query}")))
}

// ── Profile ─────────────────────────────────────────────────────────────────

pub async fn profile(data: web::Data<AppState>, req: HttpRequest) -> HandlerResult {
    let viewer = require_viewer(&req, &data).await?;
    let (posts, counts, known) = futures_util::join!(
        data.repo.list_posts_by_author(viewer.user.id),
        data.repo.follow_counts(viewer.user.id),
        data.repo.list_handles(),
    );
    let (posts, counts, known) = (posts?, counts?, known?);

    let body = ProfileTemplate {
        title: "Profile",
        viewer: &viewer.handle,
        counts,
        posts: posts
            .iter()
            .map(|post| PostView::build(post, &known, Some(viewer.handle.as_str())))
            .collect(),
    }
    .render()?;
    Ok(html(StatusCode::OK, body))
}
