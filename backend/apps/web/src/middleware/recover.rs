//! Panic Recovery
//!
//! Turns a handler panic into a generic 500 and closes the connection. The
//! panic payload is logged, never sent to the client.

use std::any::Any;

use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use kernel::error::app_error::AppError;

use crate::middleware::headers::apply_common_headers;

fn panic_detail(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else {
        "non-string panic payload"
    }
}

/// Response for `CatchPanicLayer::custom`
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!(panic = %panic_detail(payload.as_ref()), "Request handler panicked");

    let mut response = AppError::internal().into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONNECTION, HeaderValue::from_static("close"));
    apply_common_headers(headers);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_panic_detail() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("index out of bounds"));
        assert_eq!(panic_detail(owned.as_ref()), "index out of bounds");

        let borrowed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_detail(borrowed.as_ref()), "boom");

        let other: Box<dyn Any + Send> = Box::new(42u32);
        assert_eq!(panic_detail(other.as_ref()), "non-string panic payload");
    }

    #[tokio::test]
    async fn test_panic_response_is_generic() {
        let response = handle_panic(Box::new("secret: db password is hunter2"));

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[header::CONNECTION], "close");
        assert_eq!(response.headers()[header::SERVER], "snippetbox");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("Internal Server Error"));
        assert!(!body.contains("hunter2"));
    }
}
