//! campus-board/crates/cb-core/src/lib.rs
//!
//! The central domain logic and interface definitions for Campus Board.

pub mod avatar;
pub mod error;
pub mod models;
pub mod traits;
pub mod vote;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;
