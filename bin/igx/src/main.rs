//! # IGX Binary
//!
//! The entry point that assembles the application based on compile-time features.

use actix_web::{web, App, HttpServer};
use igx_api::{configure_routes, middleware, AppState};
use igx_configs::Settings;

// Feature-gated imports: the adapters are chosen at compile time
#[cfg(feature = "db-sqlite")]
use igx_db_sqlite::SqliteSocialRepo;

#[cfg(feature = "auth-simple")]
use igx_auth_simple::SimpleAuthProvider;

#[cfg(not(all(feature = "db-sqlite", feature = "auth-simple")))]
compile_error!("igx needs a repository and an auth provider: enable `db-sqlite` and `auth-simple`");

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // `.env` first, so a `RUST_LOG` set there reaches the logger.
    let dotenv = igx_configs::load_dotenv();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    if let Some(path) = dotenv {
        log::debug!("loaded environment from {}", path.display());
    }

    let settings = Settings::load()?;
    let (host, port) = settings.bind_addr();
    let static_dir = settings.static_dir.clone();

    // 1. Initialize Database Implementation
    #[cfg(feature = "db-sqlite")]
    let repo = SqliteSocialRepo::new(&settings.database_url).await?;

    // 2. Initialize Auth Implementation
    #[cfg(feature = "auth-simple")]
    let auth = SimpleAuthProvider::new(settings.session_secret);

    // 3. Wrap in AppState (dynamic dispatch keeps handlers adapter-agnostic)
    let state = web::Data::new(AppState {
        repo: Box::new(repo),
        auth: Box::new(auth),
    });

    log::info!("IGX starting on http://{host}:{port}");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::security_headers())
            .wrap(middleware::standard_middleware())
            .service(actix_files::Files::new("/static", &static_dir))
            .configure(configure_routes)
    })
    .bind((host, port))?
    .run()
    .await?;

    Ok(())
}
