//! # cb-ui
//!
//! Askama templates and presentation helpers for Campus Board.

pub mod render;
pub mod text;

use askama::Template;
use cb_core::models::{Category, Comment, Thread, ThreadListing};

pub use render::{icon_glyph, render_avatar_svg, Theme};

/// The landing page: categories plus the most-voted threads.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate<'a> {
    pub categories: &'a [Category],
    pub popular: &'a [ThreadListing],
    pub viewer: &'a str,
    pub theme: &'a str,
}

/// One category with its threads, newest first.
#[derive(Template)]
#[template(path = "category.html")]
pub struct CategoryTemplate<'a> {
    pub category: &'a Category,
    pub threads: &'a [Thread],
    pub viewer: &'a str,
    pub theme: &'a str,
    pub notice: Option<&'a str>,
}

/// A comment paired with whether the viewer already voted on it.
pub struct CommentView<'a> {
    pub comment: &'a Comment,
    pub voted: bool,
}

#[derive(Template)]
#[template(path = "thread.html")]
pub struct ThreadTemplate<'a> {
    pub category: &'a Category,
    pub thread: &'a Thread,
    pub thread_voted: bool,
    pub comments: &'a [CommentView<'a>],
    pub viewer: &'a str,
    pub theme: &'a str,
    pub notice: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "admin_login.html")]
pub struct AdminLoginTemplate<'a> {
    pub viewer: &'a str,
    pub theme: &'a str,
    pub notice: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "admin.html")]
pub struct AdminTemplate<'a> {
    pub threads: &'a [Thread],
    pub comments: &'a [Comment],
    pub viewer: &'a str,
    pub theme: &'a str,
}

mod filters {
    use cb_core::models::CategoryIcon;
    use chrono::{DateTime, Utc};

    pub fn ago(ts: &DateTime<Utc>) -> ::askama::Result<String> {
        Ok(crate::text::relative_date(ts))
    }

    pub fn glyph(icon: &CategoryIcon) -> ::askama::Result<&'static str> {
        Ok(crate::render::icon_glyph(*icon))
    }

    /// Escapes user text, turns bare URLs into anchors, and preserves line
    /// breaks. Use together with `|safe`.
    pub fn markup(raw: &str) -> ::askama::Result<String> {
        Ok(crate::text::markup(raw))
    }
}
