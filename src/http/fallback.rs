//! Static fallback page.
//!
//! Served for the reserved root paths and for every path no mapping claims.
//! The status is always 200.

use std::path::Path;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;

const BUILTIN_PAGE: &str = include_str!("../../static/fallback.html");

pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// The HTML document returned when a request is not forwarded.
#[derive(Debug, Clone)]
pub struct FallbackPage {
    html: Bytes,
}

impl FallbackPage {
    pub fn builtin() -> Self {
        Self {
            html: Bytes::from_static(BUILTIN_PAGE.as_bytes()),
        }
    }

    /// Load a page from disk.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let html = std::fs::read(path)?;
        Ok(Self { html: Bytes::from(html) })
    }

    /// Load the configured page, or the built-in one when none is configured.
    pub fn load(page_path: Option<&str>) -> std::io::Result<Self> {
        match page_path {
            Some(path) => Self::from_file(Path::new(path)),
            None => Ok(Self::builtin()),
        }
    }

    pub fn html(&self) -> &Bytes {
        &self.html
    }

    pub fn response(&self) -> Response<Body> {
        let mut response = Response::new(Body::from(self.html.clone()));
        *response.status_mut() = StatusCode::OK;
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE));
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn serves_html_with_ok_status() {
        let page = FallbackPage::builtin();
        let response = page.response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], HTML_CONTENT_TYPE);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body, page.html());
        assert!(body.starts_with(b"<!DOCTYPE html>"));
    }

    #[test]
    fn loads_custom_page() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<p>custom</p>").unwrap();

        let page = FallbackPage::load(file.path().to_str()).unwrap();
        assert_eq!(page.html().as_ref(), b"<p>custom</p>");

        assert!(FallbackPage::load(Some("/no/such/page.html")).is_err());
        assert_eq!(FallbackPage::load(None).unwrap().html(), FallbackPage::builtin().html());
    }
}
