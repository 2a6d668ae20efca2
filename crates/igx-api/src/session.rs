//! Resolves the session cookie into the current viewer.
//!
//! The viewer is looked up once per request and passed explicitly to
//! whatever needs it.

use actix_web::cookie::{Cookie, SameSite};
use actix_web::HttpRequest;
use igx_core::models::{Handle, User};

use crate::error::ApiError;
use crate::handlers::AppState;

pub const SESSION_COOKIE: &str = "igx_session";

/// A signed-in user who has picked a handle.
#[derive(Debug, Clone)]
pub struct Viewer {
    pub user: User,
    pub handle: Handle,
}

pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish()
}

pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::named(SESSION_COOKIE);
    cookie.set_path("/");
    cookie.make_removal();
    cookie
}

/// The signed-in user, if the cookie is present, untampered, and still names a user.
pub async fn session_user(req: &HttpRequest, state: &AppState) -> Result<Option<User>, ApiError> {
    let Some(cookie) = req.cookie(SESSION_COOKIE) else {
        return Ok(None);
    };
    let Some(user_id) = state.auth.resolve_session(cookie.value()) else {
        log::debug!("ignoring session cookie with a bad signature");
        return Ok(None);
    };
    Ok(state.repo.get_user(user_id).await?)
}

pub async fn require_user(req: &HttpRequest, state: &AppState) -> Result<User, ApiError> {
    session_user(req, state)
        .await?
        .ok_or(ApiError::SignInRequired)
}

pub async fn require_viewer(req: &HttpRequest, state: &AppState) -> Result<Viewer, ApiError> {
    let user = require_user(req, state).await?;
    let handle = user.username.clone().ok_or(ApiError::HandleRequired)?;
    Ok(Viewer { user, handle })
}
