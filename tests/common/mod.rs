//! Shared utilities for integration tests.

use std::collections::BTreeMap;
use std::net::SocketAddr;

use axum::{
    body::Bytes,
    extract::{Path, Request},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{any, get},
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;

/// Start a mock upstream on an ephemeral port.
///
/// - `/echo/...` returns the received method, URI, headers and body as JSON
/// - `/redirect` answers 302 to `/echo/redirected`
/// - `/status/{code}` answers with that status
pub async fn start_mock_upstream() -> SocketAddr {
    let app = Router::new()
        .route("/echo/{*rest}", any(echo))
        .route(
            "/redirect",
            get(|| async { (StatusCode::FOUND, [(header::LOCATION, "/echo/redirected")]) }),
        )
        .route("/status/{code}", any(status));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn echo(request: Request) -> impl IntoResponse {
    let (parts, body) = request.into_parts();
    let body: Bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();

    let headers: BTreeMap<String, String> = parts
        .headers
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
        .collect();

    Json(json!({
        "method": parts.method.as_str(),
        "uri": parts.uri.to_string(),
        "headers": headers,
        "body": String::from_utf8_lossy(&body),
    }))
}

async fn status(Path(code): Path<u16>) -> impl IntoResponse {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [("x-upstream", "mock")], format!("status {}", code))
}
