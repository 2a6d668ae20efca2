//! # igx-api
//!
//! The web routing and orchestration layer for IGX.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod session;

use actix_web::web;

pub use handlers::AppState;

/// Configures the routes for the app.
///
/// The binary wraps these with logging and security headers and mounts
/// `/static` itself, so tests can build the same routes without either.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .wrap(middleware::cors_policy())
            .route("/suggest", web::get().to(handlers::api_suggest))
            .route("/suggest/apply", web::post().to(handlers::api_apply_suggestion)),
    )
    .route("/", web::get().to(handlers::index))
    .route("/auth", web::get().to(handlers::auth_form))
    .route("/auth/login", web::post().to(handlers::login))
    .route("/auth/signup", web::post().to(handlers::signup))
    .route("/auth/logout", web::post().to(handlers::logout))
    .route("/username", web::get().to(handlers::username_form))
    .route("/username", web::post().to(handlers::set_username))
    .route("/feed", web::get().to(handlers::feed))
    .route("/feed/post", web::post().to(handlers::create_post))
    .route("/notifications", web::get().to(handlers::notifications))
    .route("/mentions", web::get().to(handlers::mentions))
    .route("/people", web::get().to(handlers::people))
    .route("/people/{id}/follow", web::post().to(handlers::toggle_follow))
    .route("/profile", web::get().to(handlers::profile));
}
