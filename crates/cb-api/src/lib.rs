//! # cb-api
//!
//! The web routing and orchestration layer for Campus Board.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod preview;
pub mod session;

use actix_web::web;

/// Configures the routes for the forum.
///
/// # Developer Note
/// We use a scoped configuration to allow the main binary to mount
/// the app under different paths if needed (e.g., /forum/).
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("")
            // Landing page: categories + popular threads
            .route("/", web::get().to(handlers::index))
            // One category and its threads
            .route("/forum/{category_id}", web::get().to(handlers::category_page))
            .route("/forum/{category_id}/threads", web::post().to(handlers::create_thread))
            // A thread with its comments
            .route("/thread/{thread_id}", web::get().to(handlers::thread_page))
            .route("/thread/{thread_id}/comments", web::post().to(handlers::create_comment))
            // Voting
            .route("/thread/{thread_id}/vote", web::post().to(handlers::vote_thread))
            .route("/comment/{comment_id}/vote", web::post().to(handlers::vote_comment))
            // Presentation endpoints
            .route("/avatar/{token}.svg", web::get().to(handlers::avatar_svg))
            .route("/theme", web::post().to(handlers::toggle_theme))
            .route("/preview", web::post().to(preview::link_preview))
            // Admin gate
            .route("/admin", web::get().to(handlers::admin_page))
            .route("/admin/login", web::post().to(handlers::admin_login))
            .route("/admin/logout", web::post().to(handlers::admin_logout))
            .route("/admin/threads/{thread_id}/delete", web::post().to(handlers::admin_delete_thread))
            .route("/admin/comments/{comment_id}/delete", web::post().to(handlers::admin_delete_comment)),
    );
}
