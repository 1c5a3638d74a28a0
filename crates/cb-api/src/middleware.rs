//! campus-board/crates/cb-api/src/middleware.rs Middleware
//!
//! Custom middleware for logging and traffic control.

use actix_cors::Cors;
use actix_web::middleware::Logger;

// Returns the standard request logger for the Campus Board API.
pub fn standard_middleware() -> Logger {
    // The 'default' logger outputs:
    // remote-ip "request-line" status-code response-size "referrer" "user-agent"
    Logger::default()
}

// Configures CORS (Cross-Origin Resource Sharing).
// Pages are same-origin; the JSON preview endpoint may be called from
// embedded clients.
pub fn cors_policy() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST"])
        .max_age(3600)
}
