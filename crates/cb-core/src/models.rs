//! # Domain Models
//!
//! These structs represent the core entities of Campus Board.
//! We use UUID v7 for time-ordered, globally unique identification; the
//! anonymous visitor token is a separate opaque string (see `cb-anon-simple`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Threads longer than this get an elided preview on list pages.
const PREVIEW_CHARS: usize = 150;

/// A top-level discussion area (e.g. "Academics", "Campus Life").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Accent color as a hex string (e.g. "#6366f1")
    pub color: String,
    pub icon: CategoryIcon,
    /// Number of threads in this category, computed at query time
    pub threads_count: i64,
    pub created_at: DateTime<Utc>,
}

/// The icon shown next to a category name.
///
/// Icon names arrive from the database as free-form strings; unknown names
/// fall back to `Chat` rather than failing the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryIcon {
    Chat,
    Book,
    GraduationCap,
    Coffee,
    Home,
    Megaphone,
    Lightbulb,
}

impl CategoryIcon {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "book" => Self::Book,
            "graduation_cap" | "graduation-cap" => Self::GraduationCap,
            "coffee" => Self::Coffee,
            "home" => Self::Home,
            "megaphone" => Self::Megaphone,
            "lightbulb" => Self::Lightbulb,
            _ => Self::Chat,
        }
    }

    /// The canonical storage name for this icon.
    pub fn name(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Book => "book",
            Self::GraduationCap => "graduation_cap",
            Self::Coffee => "coffee",
            Self::Home => "home",
            Self::Megaphone => "megaphone",
            Self::Lightbulb => "lightbulb",
        }
    }
}

/// A discussion thread within a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub content: String,
    /// Elided content shown on list pages, derived at creation time
    pub preview: String,
    /// Denormalized vote counter, adjusted only inside `VoteRepo::record_vote`
    pub votes: i64,
    /// Denormalized reply counter, adjusted with each comment insert/delete
    pub comments_count: i64,
    /// Opaque anonymous token of the author
    pub author_session: String,
    pub created_at: DateTime<Utc>,
}

/// A thread joined with its category's display fields, for cross-category
/// listings such as the popular-threads block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadListing {
    pub thread: Thread,
    pub category_name: String,
    pub category_color: String,
}

/// A reply within a thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub thread_id: Uuid,
    pub content: String,
    pub votes: i64,
    pub author_session: String,
    pub created_at: DateTime<Utc>,
}

/// A vote references exactly one thread or one comment, never both and
/// never neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoteTarget {
    Thread(Uuid),
    Comment(Uuid),
}

impl VoteTarget {
    pub fn id(self) -> Uuid {
        match self {
            Self::Thread(id) | Self::Comment(id) => id,
        }
    }
}

/// The result of a vote attempt. `AlreadyVoted` is a valid outcome, not an
/// error; failures travel on the `Result` error channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    Accepted,
    AlreadyVoted,
}

/// Validated input for a new thread.
#[derive(Debug, Clone)]
pub struct NewThread {
    pub category_id: Uuid,
    pub title: String,
    pub content: String,
    pub preview: String,
    pub author_session: String,
}

impl NewThread {
    pub fn new(category_id: Uuid, title: &str, content: &str, author_session: &str) -> Result<Self> {
        let title = title.trim();
        let content = content.trim();
        if title.is_empty() {
            return Err(AppError::Validation("thread title must not be empty".into()));
        }
        if content.is_empty() {
            return Err(AppError::Validation("thread content must not be empty".into()));
        }
        Ok(Self {
            category_id,
            title: title.to_string(),
            content: content.to_string(),
            preview: derive_preview(content),
            author_session: author_session.to_string(),
        })
    }
}

/// Validated input for a new comment.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub thread_id: Uuid,
    pub content: String,
    pub author_session: String,
}

impl NewComment {
    pub fn new(thread_id: Uuid, content: &str, author_session: &str) -> Result<Self> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation("comment must not be empty".into()));
        }
        Ok(Self {
            thread_id,
            content: content.to_string(),
            author_session: author_session.to_string(),
        })
    }
}

fn derive_preview(content: &str) -> String {
    if content.chars().count() <= PREVIEW_CHARS {
        return content.to_string();
    }
    let mut preview: String = content.chars().take(PREVIEW_CHARS).collect();
    preview.push_str("...");
    preview
}
