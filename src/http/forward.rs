//! Upstream forwarding.
//!
//! # Responsibilities
//! - Send the rewritten request upstream with the inbound method, headers and body
//! - Follow redirects
//! - Hand the upstream response back unchanged (status, headers, streamed body)
//!
//! # Design Decisions
//! - One shared reqwest client (connection pooling, TLS)
//! - Bodies are streamed in both directions, never buffered
//! - Upstream error statuses are responses, not errors

use std::time::Duration;

use axum::body::{Body, HttpBody};
use axum::response::Response;
use reqwest::redirect::Policy;
use thiserror::Error;

use crate::config::{TimeoutConfig, UpstreamConfig};
use crate::routing::OutboundRequest;

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("failed to build upstream client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("upstream request failed: {0}")]
    Upstream(#[source] reqwest::Error),
}

/// Sends outbound requests to their upstream.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
}

impl Forwarder {
    pub fn new(upstream: &UpstreamConfig, timeouts: &TimeoutConfig) -> Result<Self, ForwardError> {
        // Zero disables following: the 3xx response is handed back as-is.
        let redirect = match upstream.max_redirects {
            0 => Policy::none(),
            max => Policy::limited(max),
        };
        let client = reqwest::Client::builder()
            .redirect(redirect)
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(ForwardError::ClientBuild)?;
        Ok(Self { client })
    }

    /// Forward a request and return the upstream response as-is.
    pub async fn forward(&self, outbound: OutboundRequest) -> Result<Response<Body>, ForwardError> {
        let OutboundRequest {
            url,
            method,
            headers,
            body,
        } = outbound;

        let mut builder = self.client.request(method, url).headers(headers);
        if body.size_hint().exact() != Some(0) {
            builder = builder.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }

        let upstream = builder.send().await.map_err(ForwardError::Upstream)?;

        let status = upstream.status();
        let headers = upstream.headers().clone();
        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}
