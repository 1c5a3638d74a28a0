//! Text presentation: relative timestamps and safe user-content markup.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://[^\s<]+").unwrap());

/// "just now" / "5 min ago" / "3 hours ago" / "2 days ago", falling back to
/// a plain date for anything older than a week.
pub fn relative_date(ts: &DateTime<Utc>) -> String {
    relative_to(ts, Utc::now())
}

fn relative_to(ts: &DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(*ts);
    let minutes = delta.num_minutes();
    if minutes < 1 {
        return "just now".to_string();
    }
    if minutes < 60 {
        return format!("{minutes} min ago");
    }
    let hours = delta.num_hours();
    if hours < 24 {
        return if hours == 1 { "1 hour ago".to_string() } else { format!("{hours} hours ago") };
    }
    let days = delta.num_days();
    if days < 7 {
        return if days == 1 { "1 day ago".to_string() } else { format!("{days} days ago") };
    }
    ts.format("%b %d, %Y").to_string()
}

/// Escapes user text for HTML, wraps bare http(s) URLs in anchors, and
/// joins lines with `<br />`. The output is markup and must be rendered
/// with the `safe` filter.
pub fn markup(raw: &str) -> String {
    let escaped = html_escape::encode_safe(raw);
    escaped
        .lines()
        .map(|line| {
            URL_RE
                .replace_all(line, |caps: &regex::Captures<'_>| {
                    let url = &caps[0];
                    format!(r#"<a href="{url}" target="_blank" rel="noopener noreferrer">{url}</a>"#)
                })
                .into_owned()
        })
        .collect::<Vec<_>>()
        .join("<br />")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs_ago: i64) -> (DateTime<Utc>, DateTime<Utc>) {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap();
        (now - chrono::Duration::seconds(secs_ago), now)
    }

    #[test]
    fn relative_buckets() {
        let (ts, now) = at(30);
        assert_eq!(relative_to(&ts, now), "just now");
        let (ts, now) = at(5 * 60);
        assert_eq!(relative_to(&ts, now), "5 min ago");
        let (ts, now) = at(3 * 3600);
        assert_eq!(relative_to(&ts, now), "3 hours ago");
        let (ts, now) = at(2 * 86_400);
        assert_eq!(relative_to(&ts, now), "2 days ago");
        let (ts, now) = at(30 * 86_400);
        assert_eq!(relative_to(&ts, now), "Feb 12, 2026");
    }

    #[test]
    fn markup_escapes_html() {
        assert_eq!(markup("<script>alert(1)</script>"), "&lt;script&gt;alert(1)&lt;/script&gt;");
    }

    #[test]
    fn markup_links_urls() {
        let out = markup("see https://example.edu/syllabus for details");
        assert!(out.contains(r#"<a href="https://example.edu/syllabus""#));
        assert!(out.contains("rel=\"noopener noreferrer\""));
    }

    #[test]
    fn markup_preserves_line_breaks() {
        assert_eq!(markup("one\ntwo"), "one<br />two");
    }
}
