//! Link previews: fetch a URL and scrape the few tags worth showing.
//!
//! Attempt-once, no retries; a failed fetch is reported to the caller and
//! the page simply renders without a preview card.

use actix_web::{web, HttpResponse};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use cb_core::error::AppError;

use crate::error::ApiError;
use crate::handlers::AppState;

static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title[^>]*>([^<]+)</title>").unwrap());
static DESC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<meta\s+name="description"\s+content="([^"]+)""#).unwrap());
static OG_IMAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<meta\s+property="og:image"\s+content="([^"]+)""#).unwrap());

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub url: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct PreviewData {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub images: Vec<String>,
}

fn scrape(url: &str, html: &str) -> PreviewData {
    let capture = |re: &Regex| {
        re.captures(html)
            .map(|caps| caps[1].trim().to_string())
            .filter(|text| !text.is_empty())
    };
    PreviewData {
        url: url.to_string(),
        title: capture(&TITLE_RE),
        description: capture(&DESC_RE),
        images: capture(&OG_IMAGE_RE).into_iter().collect(),
    }
}

pub async fn link_preview(
    state: web::Data<AppState>,
    body: web::Json<PreviewRequest>,
) -> Result<HttpResponse, ApiError> {
    let url = body.into_inner().url;
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(AppError::Validation("preview URL must be http(s)".into()).into());
    }

    let resp = state.http.get(&url).send().await.map_err(AppError::internal)?;
    if !resp.status().is_success() {
        return Err(AppError::Internal(format!("preview target answered {}", resp.status())).into());
    }
    let html = resp.text().await.map_err(AppError::internal)?;

    Ok(HttpResponse::Ok().json(scrape(&url, &html)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<html><head>
        <title> Course catalog </title>
        <meta name="description" content="Every course, every term">
        <meta property="og:image" content="https://example.edu/card.png">
        </head><body></body></html>"#;

    #[test]
    fn scrapes_title_description_and_image() {
        let data = scrape("https://example.edu", SAMPLE);
        assert_eq!(data.title.as_deref(), Some("Course catalog"));
        assert_eq!(data.description.as_deref(), Some("Every course, every term"));
        assert_eq!(data.images, vec!["https://example.edu/card.png".to_string()]);
    }

    #[test]
    fn missing_tags_scrape_to_nothing() {
        let data = scrape("https://example.edu", "<html><body>bare</body></html>");
        assert_eq!(data.title, None);
        assert_eq!(data.description, None);
        assert!(data.images.is_empty());
    }

    #[test]
    fn title_match_is_case_insensitive() {
        let data = scrape("https://example.edu", "<TITLE>LOUD</TITLE>");
        assert_eq!(data.title.as_deref(), Some("LOUD"));
    }
}
