//! Environment-driven configuration with logged defaults.

use std::env;

pub struct Config {
    pub bind: String,
    pub database_url: String,
    /// Plain compared admin gate key; empty disables the admin panel.
    pub admin_key: String,
}

impl Config {
    pub fn load() -> Self {
        Self {
            bind: var_or("CB_BIND", "127.0.0.1:8080"),
            database_url: var_or("CB_DATABASE_URL", "sqlite:campus_board.db"),
            admin_key: env::var("CB_ADMIN_KEY").unwrap_or_else(|_| {
                log::warn!("CB_ADMIN_KEY not set, the admin panel is disabled");
                String::new()
            }),
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        log::info!("{key} not set, using default: {default}");
        default.to_string()
    })
}
