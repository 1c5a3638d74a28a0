//! # cb-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational
//! model and the `cb-core` domain models.
//!
//! Votes are the one subtle part: the `votes` table carries partial UNIQUE
//! indexes on `(session_id, thread_id)` and `(session_id, comment_id)`, so
//! a duplicate cast loses the race at the storage layer no matter how the
//! callers interleave. `record_vote` inserts the vote row and bumps the
//! denormalized counter inside one transaction — the row and the counter
//! land together or not at all.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

use cb_core::error::{AppError, Result};
use cb_core::models::{
    Category, CategoryIcon, Comment, NewComment, NewThread, Thread, ThreadListing, VoteOutcome,
    VoteTarget,
};
use cb_core::traits::{ForumRepo, VoteRepo};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS categories (
        id          BLOB PRIMARY KEY,
        name        TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL DEFAULT '',
        color       TEXT NOT NULL,
        icon        TEXT NOT NULL,
        created_at  TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS threads (
        id             BLOB PRIMARY KEY,
        category_id    BLOB NOT NULL REFERENCES categories(id),
        title          TEXT NOT NULL,
        content        TEXT NOT NULL,
        preview        TEXT NOT NULL,
        votes          INTEGER NOT NULL DEFAULT 0,
        comments_count INTEGER NOT NULL DEFAULT 0,
        author_session TEXT NOT NULL,
        created_at     TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS comments (
        id             BLOB PRIMARY KEY,
        thread_id      BLOB NOT NULL REFERENCES threads(id),
        content        TEXT NOT NULL,
        votes          INTEGER NOT NULL DEFAULT 0,
        author_session TEXT NOT NULL,
        created_at     TEXT NOT NULL
    )",
    // A vote row references exactly one of thread_id / comment_id.
    "CREATE TABLE IF NOT EXISTS votes (
        id         BLOB PRIMARY KEY,
        thread_id  BLOB,
        comment_id BLOB,
        session_id TEXT NOT NULL,
        created_at TEXT NOT NULL,
        CHECK ((thread_id IS NULL) <> (comment_id IS NULL))
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS votes_one_per_thread
        ON votes(session_id, thread_id) WHERE thread_id IS NOT NULL",
    "CREATE UNIQUE INDEX IF NOT EXISTS votes_one_per_comment
        ON votes(session_id, comment_id) WHERE comment_id IS NOT NULL",
    "CREATE INDEX IF NOT EXISTS threads_by_category ON threads(category_id, created_at)",
    "CREATE INDEX IF NOT EXISTS comments_by_thread ON comments(thread_id, created_at)",
];

/// The category set a fresh install starts with.
const DEFAULT_CATEGORIES: &[(&str, &str, &str, CategoryIcon)] = &[
    ("General", "Anything that doesn't fit elsewhere", "#6366f1", CategoryIcon::Chat),
    ("Academics", "Courses, professors, exams, and study tips", "#0ea5e9", CategoryIcon::Book),
    ("Campus Life", "Dorms, dining, clubs, and everything in between", "#f97316", CategoryIcon::Coffee),
    ("Housing", "Finding roommates and places to live", "#22c55e", CategoryIcon::Home),
    ("Events", "What's happening on and around campus", "#e11d48", CategoryIcon::Megaphone),
    ("Ideas & Feedback", "Suggestions for the forum and the campus", "#eab308", CategoryIcon::Lightbulb),
];

pub struct SqliteForumRepo {
    pool: SqlitePool,
}

// Helpers for UUID conversion
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> Uuid {
    Uuid::from_slice(blob).unwrap_or_default()
}

fn db_err(err: sqlx::Error) -> AppError {
    AppError::internal(err)
}

fn category_from_row(row: &SqliteRow) -> Category {
    Category {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        name: row.get("name"),
        description: row.get("description"),
        color: row.get("color"),
        icon: CategoryIcon::from_name(&row.get::<String, _>("icon")),
        threads_count: row.get("threads_count"),
        created_at: row.get("created_at"),
    }
}

fn thread_from_row(row: &SqliteRow) -> Thread {
    Thread {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        category_id: blob_to_uuid(row.get::<Vec<u8>, _>("category_id").as_slice()),
        title: row.get("title"),
        content: row.get("content"),
        preview: row.get("preview"),
        votes: row.get("votes"),
        comments_count: row.get("comments_count"),
        author_session: row.get("author_session"),
        created_at: row.get("created_at"),
    }
}

fn comment_from_row(row: &SqliteRow) -> Comment {
    Comment {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        thread_id: blob_to_uuid(row.get::<Vec<u8>, _>("thread_id").as_slice()),
        content: row.get("content"),
        votes: row.get("votes"),
        author_session: row.get("author_session"),
        created_at: row.get("created_at"),
    }
}

impl SqliteForumRepo {
    /// Opens (creating if missing) the database at `url` and ensures the
    /// schema exists.
    pub async fn new(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(db_err)?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(db_err)?;
        let repo = Self { pool };
        repo.init_schema().await?;
        Ok(repo)
    }

    /// A private in-memory database for tests. The pool is pinned to a
    /// single connection: each SQLite `:memory:` connection is its own
    /// database, so a wider pool would scatter the schema.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(db_err)?;
        let repo = Self { pool };
        repo.init_schema().await?;
        Ok(repo)
    }

    async fn init_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await.map_err(db_err)?;
        }
        Ok(())
    }

    /// Inserts the default category set into an empty database.
    pub async fn seed_default_categories(&self) -> Result<()> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        if count > 0 {
            return Ok(());
        }
        log::info!("seeding {} default categories", DEFAULT_CATEGORIES.len());
        for (name, description, color, icon) in DEFAULT_CATEGORIES {
            sqlx::query(
                "INSERT INTO categories (id, name, description, color, icon, created_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(uuid_to_blob(Uuid::now_v7()))
            .bind(name)
            .bind(description)
            .bind(color)
            .bind(icon.name())
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        }
        Ok(())
    }
}

const CATEGORY_COLUMNS: &str = "c.id, c.name, c.description, c.color, c.icon, c.created_at,
    (SELECT COUNT(*) FROM threads t WHERE t.category_id = c.id) AS threads_count";

#[async_trait]
impl ForumRepo for SqliteForumRepo {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories c ORDER BY c.name ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows.iter().map(category_from_row).collect())
    }

    async fn get_category(&self, id: Uuid) -> Result<Option<Category>> {
        let row = sqlx::query(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories c WHERE c.id = ?"
        ))
        .bind(uuid_to_blob(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.as_ref().map(category_from_row))
    }

    async fn create_thread(&self, new: NewThread) -> Result<Thread> {
        let thread = Thread {
            id: Uuid::now_v7(),
            category_id: new.category_id,
            title: new.title,
            content: new.content,
            preview: new.preview,
            votes: 0,
            comments_count: 0,
            author_session: new.author_session,
            created_at: Utc::now(),
        };
        sqlx::query(
            "INSERT INTO threads (id, category_id, title, content, preview, votes,
                                  comments_count, author_session, created_at)
             VALUES (?, ?, ?, ?, ?, 0, 0, ?, ?)",
        )
        .bind(uuid_to_blob(thread.id))
        .bind(uuid_to_blob(thread.category_id))
        .bind(&thread.title)
        .bind(&thread.content)
        .bind(&thread.preview)
        .bind(&thread.author_session)
        .bind(thread.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(thread)
    }

    async fn get_thread(&self, id: Uuid) -> Result<Option<Thread>> {
        let row = sqlx::query("SELECT * FROM threads WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.as_ref().map(thread_from_row))
    }

    async fn list_threads(&self, category_id: Uuid) -> Result<Vec<Thread>> {
        let rows = sqlx::query(
            "SELECT * FROM threads WHERE category_id = ? ORDER BY created_at DESC",
        )
        .bind(uuid_to_blob(category_id))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows.iter().map(thread_from_row).collect())
    }

    async fn popular_threads(&self, limit: i64) -> Result<Vec<ThreadListing>> {
        let rows = sqlx::query(
            "SELECT t.*, c.name AS category_name, c.color AS category_color
             FROM threads t JOIN categories c ON c.id = t.category_id
             ORDER BY t.votes DESC, t.created_at DESC
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows
            .iter()
            .map(|row| ThreadListing {
                thread: thread_from_row(row),
                category_name: row.get("category_name"),
                category_color: row.get("category_color"),
            })
            .collect())
    }

    async fn all_threads(&self) -> Result<Vec<Thread>> {
        let rows = sqlx::query("SELECT * FROM threads ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(rows.iter().map(thread_from_row).collect())
    }

    /// Removes a thread, its comments, and every vote referencing either,
    /// inside one transaction.
    async fn delete_thread_cascade(&self, id: Uuid) -> Result<()> {
        let blob = uuid_to_blob(id);
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query(
            "DELETE FROM votes WHERE comment_id IN (SELECT id FROM comments WHERE thread_id = ?)",
        )
        .bind(&blob)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;
        sqlx::query("DELETE FROM votes WHERE thread_id = ?")
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        sqlx::query("DELETE FROM comments WHERE thread_id = ?")
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        let result = sqlx::query("DELETE FROM threads WHERE id = ?")
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Thread".into(), id.to_string()));
        }

        tx.commit().await.map_err(db_err)
    }

    /// Inserts the comment and bumps the parent thread's reply counter in
    /// the same transaction.
    async fn create_comment(&self, new: NewComment) -> Result<Comment> {
        let comment = Comment {
            id: Uuid::now_v7(),
            thread_id: new.thread_id,
            content: new.content,
            votes: 0,
            author_session: new.author_session,
            created_at: Utc::now(),
        };
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query(
            "INSERT INTO comments (id, thread_id, content, votes, author_session, created_at)
             VALUES (?, ?, ?, 0, ?, ?)",
        )
        .bind(uuid_to_blob(comment.id))
        .bind(uuid_to_blob(comment.thread_id))
        .bind(&comment.content)
        .bind(&comment.author_session)
        .bind(comment.created_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        let bumped = sqlx::query(
            "UPDATE threads SET comments_count = comments_count + 1 WHERE id = ?",
        )
        .bind(uuid_to_blob(comment.thread_id))
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;
        if bumped.rows_affected() == 0 {
            return Err(AppError::NotFound("Thread".into(), comment.thread_id.to_string()));
        }

        tx.commit().await.map_err(db_err)?;
        Ok(comment)
    }

    async fn get_comment(&self, id: Uuid) -> Result<Option<Comment>> {
        let row = sqlx::query("SELECT * FROM comments WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.as_ref().map(comment_from_row))
    }

    async fn list_comments(&self, thread_id: Uuid) -> Result<Vec<Comment>> {
        let rows = sqlx::query(
            "SELECT * FROM comments WHERE thread_id = ? ORDER BY created_at ASC",
        )
        .bind(uuid_to_blob(thread_id))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows.iter().map(comment_from_row).collect())
    }

    async fn all_comments(&self) -> Result<Vec<Comment>> {
        let rows = sqlx::query("SELECT * FROM comments ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(rows.iter().map(comment_from_row).collect())
    }

    /// Removes a comment and its votes, and decrements the parent thread's
    /// reply counter, inside one transaction.
    async fn delete_comment_cascade(&self, id: Uuid) -> Result<()> {
        let blob = uuid_to_blob(id);
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let thread_id: Option<Vec<u8>> =
            sqlx::query_scalar("SELECT thread_id FROM comments WHERE id = ?")
                .bind(&blob)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_err)?;
        let Some(thread_id) = thread_id else {
            return Err(AppError::NotFound("Comment".into(), id.to_string()));
        };

        sqlx::query("DELETE FROM votes WHERE comment_id = ?")
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        sqlx::query(
            "UPDATE threads SET comments_count = MAX(comments_count - 1, 0) WHERE id = ?",
        )
        .bind(&thread_id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)
    }
}

#[async_trait]
impl VoteRepo for SqliteForumRepo {
    async fn has_voted(&self, session: &str, target: VoteTarget) -> Result<bool> {
        let (sql, id) = match target {
            VoteTarget::Thread(id) => {
                ("SELECT EXISTS(SELECT 1 FROM votes WHERE session_id = ? AND thread_id = ?)", id)
            }
            VoteTarget::Comment(id) => {
                ("SELECT EXISTS(SELECT 1 FROM votes WHERE session_id = ? AND comment_id = ?)", id)
            }
        };
        sqlx::query_scalar(sql)
            .bind(session)
            .bind(uuid_to_blob(id))
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn voted_in_thread(&self, session: &str, thread_id: Uuid) -> Result<Vec<Uuid>> {
        let blob = uuid_to_blob(thread_id);
        let rows: Vec<Vec<u8>> = sqlx::query_scalar(
            "SELECT COALESCE(thread_id, comment_id) FROM votes
             WHERE session_id = ?
               AND (thread_id = ? OR comment_id IN (SELECT id FROM comments WHERE thread_id = ?))",
        )
        .bind(session)
        .bind(&blob)
        .bind(&blob)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows.iter().map(|b| blob_to_uuid(b)).collect())
    }

    /// The hardened cast: vote row and counter bump in one transaction,
    /// duplicates rejected by the unique index rather than by a racy
    /// read-before-write.
    async fn record_vote(
        &self,
        session: &str,
        target: VoteTarget,
        value: i64,
    ) -> Result<VoteOutcome> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let insert = match target {
            VoteTarget::Thread(id) => {
                sqlx::query(
                    "INSERT INTO votes (id, thread_id, session_id, created_at) VALUES (?, ?, ?, ?)",
                )
                .bind(uuid_to_blob(Uuid::now_v7()))
                .bind(uuid_to_blob(id))
                .bind(session)
                .bind(Utc::now())
                .execute(&mut *tx)
                .await
            }
            VoteTarget::Comment(id) => {
                sqlx::query(
                    "INSERT INTO votes (id, comment_id, session_id, created_at) VALUES (?, ?, ?, ?)",
                )
                .bind(uuid_to_blob(Uuid::now_v7()))
                .bind(uuid_to_blob(id))
                .bind(session)
                .bind(Utc::now())
                .execute(&mut *tx)
                .await
            }
        };
        match insert {
            Ok(_) => {}
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                return Ok(VoteOutcome::AlreadyVoted);
            }
            Err(err) => return Err(db_err(err)),
        }

        let bump = match target {
            VoteTarget::Thread(id) => sqlx::query("UPDATE threads SET votes = votes + ? WHERE id = ?")
                .bind(value)
                .bind(uuid_to_blob(id))
                .execute(&mut *tx)
                .await,
            VoteTarget::Comment(id) => {
                sqlx::query("UPDATE comments SET votes = votes + ? WHERE id = ?")
                    .bind(value)
                    .bind(uuid_to_blob(id))
                    .execute(&mut *tx)
                    .await
            }
        };
        match bump {
            Ok(result) if result.rows_affected() == 0 => {
                // Vote insert rolls back with the dropped transaction.
                let kind = match target {
                    VoteTarget::Thread(_) => "Thread",
                    VoteTarget::Comment(_) => "Comment",
                };
                Err(AppError::NotFound(kind.into(), target.id().to_string()))
            }
            Ok(_) => {
                tx.commit().await.map_err(db_err)?;
                Ok(VoteOutcome::Accepted)
            }
            Err(err) => {
                log::warn!("vote counter bump failed, rolling back vote row: {err}");
                Err(db_err(err))
            }
        }
    }
}
