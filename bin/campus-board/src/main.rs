//! # Campus Board Binary
//!
//! The entry point that assembles the application based on compile-time features.

use actix_web::{web, App, HttpServer};
use cb_api::handlers::AppState;
use std::sync::Arc;

// Feature-gated imports: swap plugins without touching the wiring below
#[cfg(feature = "db-sqlite")]
use cb_db_sqlite::SqliteForumRepo;

#[cfg(feature = "anon-simple")]
use cb_anon_simple::AnonIdentity;

mod config;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cfg = config::Config::load();

    // 1. Initialize Database Implementation
    #[cfg(feature = "db-sqlite")]
    let repo = {
        let repo = SqliteForumRepo::new(&cfg.database_url).await?;
        repo.seed_default_categories().await?;
        Arc::new(repo)
    };

    // 2. Initialize Identity Implementation
    #[cfg(feature = "anon-simple")]
    let identity = Arc::new(AnonIdentity::new());

    // 3. Wrap in AppState (dynamic dispatch keeps the plugins swappable)
    let state = web::Data::new(AppState {
        repo: repo.clone(),
        votes: repo,
        identity,
        admin_key: cfg.admin_key.clone(),
        http: reqwest::Client::new(),
    });

    log::info!("campus-board listening on http://{}", cfg.bind);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(cb_api::middleware::cors_policy())
            .wrap(cb_api::middleware::standard_middleware())
            .configure(cb_api::configure_routes)
    })
    .bind(cfg.bind.as_str())?
    .run()
    .await?;

    Ok(())
}
