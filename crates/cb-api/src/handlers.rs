//! # cb-api Handlers
//!
//! This module coordinates the flow between HTTP requests and Core traits.
//! Every page render resolves the visitor first: cookie scope in, anonymous
//! token out, buffered cookie writes applied to whatever response goes back.

use std::collections::HashSet;
use std::sync::Arc;

use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use askama::Template;
use serde::Deserialize;
use uuid::Uuid;

use cb_core::avatar::derive_avatar;
use cb_core::error::AppError;
use cb_core::models::{NewComment, NewThread, VoteOutcome, VoteTarget};
use cb_core::traits::{ForumRepo, IdentityProvider, SessionScope, VoteRepo};
use cb_core::vote;
use cb_ui::{
    render_avatar_svg, AdminLoginTemplate, AdminTemplate, CategoryTemplate, CommentView,
    IndexTemplate, Theme, ThreadTemplate,
};

use crate::error::ApiError;
use crate::session::{CookieScope, THEME_KEY};

/// Cookie holding the admin key once the gate has been passed.
const ADMIN_COOKIE: &str = "cb_admin";

/// State shared across all actix workers.
pub struct AppState {
    pub repo: Arc<dyn ForumRepo>,
    pub votes: Arc<dyn VoteRepo>,
    pub identity: Arc<dyn IdentityProvider>,
    /// Plain compared gate key; empty disables the admin panel entirely.
    pub admin_key: String,
    pub http: reqwest::Client,
}

/// Everything a handler needs to know about the calling browser.
struct Visitor {
    token: String,
    theme: Theme,
    scope: CookieScope,
}

fn visitor(state: &AppState, req: &HttpRequest) -> Visitor {
    let mut scope = CookieScope::from_request(req);
    let token = state.identity.get_or_create(&mut scope);
    let theme = Theme::from_flag(scope.get(THEME_KEY).ok().flatten().as_deref());
    Visitor { token, theme, scope }
}

fn render<T: Template>(template: &T) -> Result<String, ApiError> {
    template.render().map_err(|err| ApiError(AppError::internal(err)))
}

fn page(scope: &CookieScope, body: String) -> HttpResponse {
    let mut resp = HttpResponse::Ok();
    resp.content_type("text/html; charset=utf-8");
    scope.apply_to(&mut resp);
    resp.body(body)
}

fn see_other(scope: &CookieScope, location: &str) -> HttpResponse {
    let mut resp = HttpResponse::SeeOther();
    resp.insert_header((header::LOCATION, location));
    scope.apply_to(&mut resp);
    resp.finish()
}

/// Flash codes carried through redirects; unknown codes render nothing.
fn notice_text(code: &str) -> Option<&'static str> {
    match code {
        "vote-counted" => Some("Your vote was counted."),
        "already-voted" => Some("You already voted on this."),
        "missing-fields" => Some("Please provide both a title and content for your thread."),
        "empty-comment" => Some("Please write something before commenting."),
        "bad-key" => Some("That key is not correct."),
        _ => None,
    }
}

#[derive(Deserialize)]
pub struct NoticeQuery {
    notice: Option<String>,
}

impl NoticeQuery {
    fn text(&self) -> Option<&'static str> {
        self.notice.as_deref().and_then(notice_text)
    }
}

/// Renders the landing page: categories plus the most-voted threads.
pub async fn index(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let v = visitor(&state, &req);
    let categories = state.repo.list_categories().await?;
    let popular = state.repo.popular_threads(3).await?;

    let html = render(&IndexTemplate {
        categories: &categories,
        popular: &popular,
        viewer: &v.token,
        theme: v.theme.class(),
    })?;
    Ok(page(&v.scope, html))
}

/// Renders one category with its threads, newest first.
pub async fn category_page(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    query: web::Query<NoticeQuery>,
) -> Result<HttpResponse, ApiError> {
    let v = visitor(&state, &req);
    let category_id = path.into_inner();
    let category = state
        .repo
        .get_category(category_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Category".into(), category_id.to_string()))?;
    let threads = state.repo.list_threads(category_id).await?;

    let html = render(&CategoryTemplate {
        category: &category,
        threads: &threads,
        viewer: &v.token,
        theme: v.theme.class(),
        notice: query.text(),
    })?;
    Ok(page(&v.scope, html))
}

#[derive(Deserialize)]
pub struct ThreadForm {
    title: String,
    content: String,
}

pub async fn create_thread(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    form: web::Form<ThreadForm>,
) -> Result<HttpResponse, ApiError> {
    let v = visitor(&state, &req);
    let category_id = path.into_inner();
    if state.repo.get_category(category_id).await?.is_none() {
        return Err(AppError::NotFound("Category".into(), category_id.to_string()).into());
    }

    let new = match NewThread::new(category_id, &form.title, &form.content, &v.token) {
        Ok(new) => new,
        Err(AppError::Validation(_)) => {
            return Ok(see_other(&v.scope, &format!("/forum/{category_id}?notice=missing-fields")));
        }
        Err(err) => return Err(err.into()),
    };
    let thread = state.repo.create_thread(new).await?;
    Ok(see_other(&v.scope, &format!("/thread/{}", thread.id)))
}

/// Renders a thread with its comments, marking everything the viewer has
/// already voted on so the buttons reflect it.
pub async fn thread_page(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    query: web::Query<NoticeQuery>,
) -> Result<HttpResponse, ApiError> {
    let v = visitor(&state, &req);
    let thread_id = path.into_inner();
    let thread = state
        .repo
        .get_thread(thread_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Thread".into(), thread_id.to_string()))?;
    let category = state
        .repo
        .get_category(thread.category_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Category".into(), thread.category_id.to_string()))?;
    let comments = state.repo.list_comments(thread_id).await?;

    // One query covers the thread and all its comments for this render.
    let voted: HashSet<Uuid> =
        state.votes.voted_in_thread(&v.token, thread_id).await?.into_iter().collect();
    let views: Vec<CommentView<'_>> = comments
        .iter()
        .map(|comment| CommentView { comment, voted: voted.contains(&comment.id) })
        .collect();

    let html = render(&ThreadTemplate {
        category: &category,
        thread: &thread,
        thread_voted: voted.contains(&thread.id),
        comments: &views,
        viewer: &v.token,
        theme: v.theme.class(),
        notice: query.text(),
    })?;
    Ok(page(&v.scope, html))
}

#[derive(Deserialize)]
pub struct CommentForm {
    content: String,
}

pub async fn create_comment(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    form: web::Form<CommentForm>,
) -> Result<HttpResponse, ApiError> {
    let v = visitor(&state, &req);
    let thread_id = path.into_inner();

    let new = match NewComment::new(thread_id, &form.content, &v.token) {
        Ok(new) => new,
        Err(AppError::Validation(_)) => {
            return Ok(see_other(&v.scope, &format!("/thread/{thread_id}?notice=empty-comment")));
        }
        Err(err) => return Err(err.into()),
    };
    state.repo.create_comment(new).await?;
    Ok(see_other(&v.scope, &format!("/thread/{thread_id}")))
}

fn outcome_notice(outcome: VoteOutcome) -> &'static str {
    match outcome {
        VoteOutcome::Accepted => "vote-counted",
        VoteOutcome::AlreadyVoted => "already-voted",
    }
}

pub async fn vote_thread(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let v = visitor(&state, &req);
    let thread_id = path.into_inner();

    let outcome =
        vote::cast_vote(state.votes.as_ref(), &v.token, VoteTarget::Thread(thread_id), 1).await?;
    Ok(see_other(&v.scope, &format!("/thread/{thread_id}?notice={}", outcome_notice(outcome))))
}

pub async fn vote_comment(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let v = visitor(&state, &req);
    let comment_id = path.into_inner();
    let comment = state
        .repo
        .get_comment(comment_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment".into(), comment_id.to_string()))?;

    let outcome =
        vote::cast_vote(state.votes.as_ref(), &v.token, VoteTarget::Comment(comment_id), 1).await?;
    Ok(see_other(
        &v.scope,
        &format!("/thread/{}?notice={}", comment.thread_id, outcome_notice(outcome)),
    ))
}

#[derive(Deserialize)]
pub struct AvatarQuery {
    size: Option<u32>,
}

/// Serves the deterministic avatar for a token. Cacheable: the same token
/// always draws the same image.
pub async fn avatar_svg(
    path: web::Path<String>,
    query: web::Query<AvatarQuery>,
) -> HttpResponse {
    let token = path.into_inner();
    let size = query.size.unwrap_or(40).clamp(16, 160);
    let spec = derive_avatar(&token);
    HttpResponse::Ok()
        .content_type("image/svg+xml")
        .insert_header((header::CACHE_CONTROL, "public, max-age=86400"))
        .body(render_avatar_svg(&spec, size))
}

/// Where to send the browser back to after a side-effect-only POST.
fn back_path(req: &HttpRequest) -> String {
    req.headers()
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .and_then(|referer| referer.parse::<actix_web::http::Uri>().ok())
        .and_then(|uri| uri.path_and_query().map(|pq| pq.as_str().to_string()))
        .filter(|path| path.starts_with('/'))
        .unwrap_or_else(|| "/".to_string())
}

pub async fn toggle_theme(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let mut v = visitor(&state, &req);
    let next = v.theme.toggled();
    if let Err(err) = v.scope.set(THEME_KEY, next.class()) {
        log::warn!("theme flag not persisted: {err}");
    }
    Ok(see_other(&v.scope, &back_path(&req)))
}

// ── Admin ────────────────────────────────────────────────────────────────

fn is_admin(state: &AppState, req: &HttpRequest) -> bool {
    !state.admin_key.is_empty()
        && req
            .cookie(ADMIN_COOKIE)
            .map(|cookie| cookie.value() == state.admin_key)
            .unwrap_or(false)
}

fn require_admin(state: &AppState, req: &HttpRequest) -> Result<(), ApiError> {
    if is_admin(state, req) {
        Ok(())
    } else {
        Err(AppError::Unauthorized("admin key required".into()).into())
    }
}

pub async fn admin_page(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<NoticeQuery>,
) -> Result<HttpResponse, ApiError> {
    let v = visitor(&state, &req);
    if !is_admin(&state, &req) {
        let html = render(&AdminLoginTemplate {
            viewer: &v.token,
            theme: v.theme.class(),
            notice: query.text(),
        })?;
        return Ok(page(&v.scope, html));
    }

    let threads = state.repo.all_threads().await?;
    let comments = state.repo.all_comments().await?;
    let html = render(&AdminTemplate {
        threads: &threads,
        comments: &comments,
        viewer: &v.token,
        theme: v.theme.class(),
    })?;
    Ok(page(&v.scope, html))
}

#[derive(Deserialize)]
pub struct AdminLoginForm {
    key: String,
}

/// The gate is a plain key compare, as the product intends: it keeps casual
/// visitors out of the delete buttons, nothing more.
pub async fn admin_login(
    state: web::Data<AppState>,
    form: web::Form<AdminLoginForm>,
) -> HttpResponse {
    if state.admin_key.is_empty() || form.key != state.admin_key {
        return redirect_plain("/admin?notice=bad-key");
    }
    let mut resp = HttpResponse::SeeOther();
    resp.insert_header((header::LOCATION, "/admin"));
    resp.cookie(
        actix_web::cookie::Cookie::build(ADMIN_COOKIE, form.into_inner().key)
            .path("/")
            .finish(),
    );
    resp.finish()
}

pub async fn admin_logout() -> HttpResponse {
    let mut resp = HttpResponse::SeeOther();
    resp.insert_header((header::LOCATION, "/"));
    resp.cookie(
        actix_web::cookie::Cookie::build(ADMIN_COOKIE, "")
            .path("/")
            .max_age(actix_web::cookie::time::Duration::ZERO)
            .finish(),
    );
    resp.finish()
}

fn redirect_plain(location: &str) -> HttpResponse {
    let mut resp = HttpResponse::SeeOther();
    resp.insert_header((header::LOCATION, location));
    resp.finish()
}

pub async fn admin_delete_thread(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    require_admin(&state, &req)?;
    state.repo.delete_thread_cascade(path.into_inner()).await?;
    Ok(redirect_plain("/admin"))
}

pub async fn admin_delete_comment(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    require_admin(&state, &req)?;
    state.repo.delete_comment_cascade(path.into_inner()).await?;
    Ok(redirect_plain("/admin"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_codes_map_to_text() {
        assert!(notice_text("already-voted").is_some());
        assert!(notice_text("vote-counted").is_some());
        assert_eq!(notice_text("nonsense"), None);
    }

    #[test]
    fn back_path_accepts_only_local_paths() {
        use actix_web::test::TestRequest;

        let req = TestRequest::default()
            .insert_header((header::REFERER, "http://localhost:8080/forum/abc?notice=x"))
            .to_http_request();
        assert_eq!(back_path(&req), "/forum/abc?notice=x");

        let req = TestRequest::default().to_http_request();
        assert_eq!(back_path(&req), "/");
    }
}
