//! Request identification.
//!
//! # Responsibilities
//! - Assign a request ID (client-supplied `x-request-id` or a fresh UUID v4)
//! - Make it available to handlers and trace spans
//! - Echo it on the response
//!
//! # Design Decisions
//! - The ID lives in request extensions, not headers, so forwarded headers stay
//!   exactly as the client sent them
//! - Request ID added as early as possible for tracing

use std::fmt;

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

pub const X_REQUEST_ID: &str = "x-request-id";

const MAX_CLIENT_ID_LEN: usize = 128;

/// Identifier attached to every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accept a client-supplied ID if it is short, non-empty and printable.
    pub fn from_client(value: &HeaderValue) -> Option<Self> {
        let value = value.to_str().ok()?;
        let acceptable = !value.is_empty()
            && value.len() <= MAX_CLIENT_ID_LEN
            && value.chars().all(|c| c.is_ascii_graphic());
        acceptable.then(|| Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Access the request ID assigned by [`assign_request_id`].
pub trait RequestIdExt {
    fn request_id(&self) -> Option<&RequestId>;
}

impl<B> RequestIdExt for axum::http::Request<B> {
    fn request_id(&self) -> Option<&RequestId> {
        self.extensions().get::<RequestId>()
    }
}

/// Middleware assigning a [`RequestId`] and setting it on the response.
///
/// A response that already carries `x-request-id` (set upstream) keeps it.
pub async fn assign_request_id(mut request: Request, next: Next) -> Response {
    let id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(RequestId::from_client)
        .unwrap_or_else(RequestId::generate);
    request.extensions_mut().insert(id.clone());

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(id.as_str()) {
        response.headers_mut().entry(X_REQUEST_ID).or_insert(value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, middleware, routing::get, Router};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route(
                "/",
                get(|request: Request| async move {
                    let forwarded = request.headers().contains_key(X_REQUEST_ID);
                    format!(
                        "{}|{}",
                        request.request_id().map(RequestId::as_str).unwrap_or("none"),
                        forwarded
                    )
                }),
            )
            .layer(middleware::from_fn(assign_request_id))
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn generates_id_without_touching_headers() {
        let response = app()
            .oneshot(axum::http::Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let header = response.headers()[X_REQUEST_ID].to_str().unwrap().to_string();
        assert!(Uuid::parse_str(&header).is_ok());
        assert_eq!(body_string(response).await, format!("{}|false", header));
    }

    #[tokio::test]
    async fn reuses_client_id() {
        let response = app()
            .oneshot(
                axum::http::Request::get("/")
                    .header(X_REQUEST_ID, "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()[X_REQUEST_ID], "abc-123");
        assert_eq!(body_string(response).await, "abc-123|true");
    }

    #[tokio::test]
    async fn keeps_id_set_by_upstream() {
        let app = Router::new()
            .route("/", get(|| async { ([(X_REQUEST_ID, "from-upstream")], "ok") }))
            .layer(middleware::from_fn(assign_request_id));

        let response = app
            .oneshot(
                axum::http::Request::get("/")
                    .header(X_REQUEST_ID, "from-client")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let values: Vec<_> = response.headers().get_all(X_REQUEST_ID).iter().collect();
        assert_eq!(values, vec!["from-upstream"]);
    }

    #[test]
    fn rejects_unprintable_client_ids() {
        assert!(RequestId::from_client(&HeaderValue::from_static("")).is_none());
        assert!(RequestId::from_client(&HeaderValue::from_static("has space")).is_none());
        let long = "x".repeat(MAX_CLIENT_ID_LEN + 1);
        assert!(RequestId::from_client(&HeaderValue::from_str(&long).unwrap()).is_none());
    }
}
