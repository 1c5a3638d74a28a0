//! The per-browser storage scope, backed by the request's cookie jar.
//!
//! Reads come from the request; writes are buffered and attached to the
//! response as year-long cookies, so `get` observes earlier `set`s within
//! the same request. An unparsable cookie header degrades the scope to
//! "unavailable", which the identity provider answers with an ephemeral
//! token.

use actix_web::cookie::time::Duration;
use actix_web::cookie::Cookie;
use actix_web::{HttpRequest, HttpResponseBuilder};

use cb_core::error::{AppError, Result};
use cb_core::traits::SessionScope;

/// Storage key for the visitor's light/dark preference.
pub const THEME_KEY: &str = "theme";

const COOKIE_DAYS: i64 = 365;

pub struct CookieScope {
    jar: Vec<(String, String)>,
    pending: Vec<(String, String)>,
    broken: bool,
}

impl CookieScope {
    pub fn from_request(req: &HttpRequest) -> Self {
        match req.cookies() {
            Ok(cookies) => Self {
                jar: cookies
                    .iter()
                    .map(|c| (c.name().to_string(), c.value().to_string()))
                    .collect(),
                pending: Vec::new(),
                broken: false,
            },
            Err(_) => Self { jar: Vec::new(), pending: Vec::new(), broken: true },
        }
    }

    /// Attaches buffered writes to the response.
    pub fn apply_to(&self, resp: &mut HttpResponseBuilder) {
        for (name, value) in &self.pending {
            resp.cookie(
                Cookie::build(name.clone(), value.clone())
                    .path("/")
                    .max_age(Duration::days(COOKIE_DAYS))
                    .finish(),
            );
        }
    }
}

impl SessionScope for CookieScope {
    fn get(&self, key: &str) -> Result<Option<String>> {
        if self.broken {
            return Err(AppError::Storage("cookie jar unreadable".into()));
        }
        if let Some((_, value)) = self.pending.iter().rev().find(|(name, _)| name == key) {
            return Ok(Some(value.clone()));
        }
        Ok(self.jar.iter().find(|(name, _)| name == key).map(|(_, value)| value.clone()))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if self.broken {
            return Err(AppError::Storage("cookie jar unwritable".into()));
        }
        self.pending.push((key.to_string(), value.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn reads_request_cookies() {
        let req = TestRequest::default()
            .cookie(Cookie::new("session_id", "tok-1"))
            .to_http_request();
        let scope = CookieScope::from_request(&req);
        assert_eq!(scope.get("session_id").unwrap().as_deref(), Some("tok-1"));
        assert_eq!(scope.get("theme").unwrap(), None);
    }

    #[test]
    fn pending_writes_shadow_the_jar() {
        let req = TestRequest::default()
            .cookie(Cookie::new(THEME_KEY, "light"))
            .to_http_request();
        let mut scope = CookieScope::from_request(&req);
        scope.set(THEME_KEY, "dark").unwrap();
        assert_eq!(scope.get(THEME_KEY).unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn writes_become_response_cookies() {
        let req = TestRequest::default().to_http_request();
        let mut scope = CookieScope::from_request(&req);
        scope.set("session_id", "tok-2").unwrap();

        let mut builder = actix_web::HttpResponse::Ok();
        scope.apply_to(&mut builder);
        let resp = builder.finish();
        let header = resp.headers().get(actix_web::http::header::SET_COOKIE).unwrap();
        let value = header.to_str().unwrap();
        assert!(value.contains("session_id=tok-2"));
        assert!(value.contains("Path=/"));
    }
}
