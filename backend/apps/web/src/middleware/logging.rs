//! Request Logger
//!
//! `RequestSpan` gives every request an `info` span carrying the client ip,
//! protocol, method and URI; the trace layer logs completion and latency
//! inside it. `log_cancellation` reports requests whose future was dropped
//! before a response existed (client went away, server shutting down).

use std::net::SocketAddr;
use std::time::Instant;

use axum::extract::{ConnectInfo, Request};
use axum::http;
use axum::middleware::Next;
use axum::response::Response;
use tower_http::trace::MakeSpan;
use tracing::Span;

use platform::client::{extract_client_ip, protocol_label};

#[derive(Debug, Clone, Copy, Default)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &http::Request<B>) -> Span {
        let direct_ip = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip());
        let ip = extract_client_ip(request.headers(), direct_ip)
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "-".to_string());

        tracing::info_span!(
            "request",
            ip = %ip,
            proto = protocol_label(request.version()),
            method = %request.method(),
            uri = %request.uri(),
        )
    }
}

/// Logs at debug level when dropped while still armed
struct CancelGuard {
    method: http::Method,
    uri: http::Uri,
    started: Instant,
    armed: bool,
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        if self.armed {
            tracing::debug!(
                method = %self.method,
                uri = %self.uri,
                elapsed_ms = self.started.elapsed().as_millis() as u64,
                "Request cancelled before completion"
            );
        }
    }
}

pub async fn log_cancellation(req: Request, next: Next) -> Response {
    let mut guard = CancelGuard {
        method: req.method().clone(),
        uri: req.uri().clone(),
        started: Instant::now(),
        armed: true,
    };

    let response = next.run(req).await;
    guard.armed = false;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_span_is_built_without_connect_info() {
        let request = http::Request::builder()
            .uri("/snippet/view/1")
            .body(Body::empty())
            .unwrap();
        // No subscriber installed: the span is disabled but must not panic
        let _span = RequestSpan.make_span(&request);
    }
}
