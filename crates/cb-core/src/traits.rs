//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    Category, Comment, NewComment, NewThread, Thread, ThreadListing, VoteOutcome, VoteTarget,
};

/// Data persistence contract for categories, threads, and comments.
#[async_trait]
pub trait ForumRepo: Send + Sync {
    // Category Operations
    async fn list_categories(&self) -> Result<Vec<Category>>;
    async fn get_category(&self, id: Uuid) -> Result<Option<Category>>;

    // Thread Operations
    async fn create_thread(&self, new: NewThread) -> Result<Thread>;
    async fn get_thread(&self, id: Uuid) -> Result<Option<Thread>>;
    async fn list_threads(&self, category_id: Uuid) -> Result<Vec<Thread>>;
    async fn popular_threads(&self, limit: i64) -> Result<Vec<ThreadListing>>;
    async fn all_threads(&self) -> Result<Vec<Thread>>;
    /// Removes a thread together with its comments and every vote record
    /// referencing either.
    async fn delete_thread_cascade(&self, id: Uuid) -> Result<()>;

    // Comment Operations
    async fn create_comment(&self, new: NewComment) -> Result<Comment>;
    async fn get_comment(&self, id: Uuid) -> Result<Option<Comment>>;
    async fn list_comments(&self, thread_id: Uuid) -> Result<Vec<Comment>>;
    async fn all_comments(&self) -> Result<Vec<Comment>>;
    /// Removes a comment, its vote records, and decrements the parent
    /// thread's reply counter.
    async fn delete_comment_cascade(&self, id: Uuid) -> Result<()>;
}

/// Vote bookkeeping contract.
///
/// `record_vote` must be atomic with respect to the counter it adjusts:
/// the vote row and the counter bump land together or not at all, and a
/// duplicate (session, target) insert reports `AlreadyVoted` instead of
/// creating a second row.
#[async_trait]
pub trait VoteRepo: Send + Sync {
    async fn has_voted(&self, session: &str, target: VoteTarget) -> Result<bool>;

    /// All targets within `thread_id` (the thread itself plus its comments)
    /// that `session` has already voted on. One query per page render.
    async fn voted_in_thread(&self, session: &str, thread_id: Uuid) -> Result<Vec<Uuid>>;

    async fn record_vote(&self, session: &str, target: VoteTarget, value: i64)
        -> Result<VoteOutcome>;
}

/// Local key-value persistence scoped to one visitor (a cookie jar in
/// production, a plain map in tests). Holds only the identity token and
/// the theme flag.
pub trait SessionScope {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Identity contract: a stable pseudonymous token per visitor scope.
pub trait IdentityProvider: Send + Sync {
    /// Returns the scope's anonymous token, creating and persisting one on
    /// first use. Must not fail: an unusable scope degrades to a per-call
    /// ephemeral token.
    fn get_or_create(&self, scope: &mut dyn SessionScope) -> String;
}
