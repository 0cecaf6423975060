//! Common Response Headers

use axum::extract::Request;
use axum::http::{HeaderMap, HeaderName, HeaderValue, header};
use axum::middleware::Next;
use axum::response::Response;

const CONTENT_SECURITY_POLICY: &str =
    "default-src 'self'; style-src 'self' fonts.googleapis.com; font-src fonts.gstatic.com";

/// Headers attached to every response, panic responses included
pub const COMMON_HEADERS: [(HeaderName, &str); 6] = [
    (header::CONTENT_SECURITY_POLICY, CONTENT_SECURITY_POLICY),
    (header::REFERRER_POLICY, "origin-when-cross-origin"),
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_FRAME_OPTIONS, "deny"),
    (header::X_XSS_PROTECTION, "0"),
    (header::SERVER, "snippetbox"),
];

/// Add the common headers a handler has not already set
pub fn apply_common_headers(headers: &mut HeaderMap) {
    for (name, value) in COMMON_HEADERS {
        headers
            .entry(name)
            .or_insert(HeaderValue::from_static(value));
    }
}

pub async fn common_headers(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    apply_common_headers(response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_keeps_handler_values() {
        let mut headers = HeaderMap::new();
        headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("sameorigin"));

        apply_common_headers(&mut headers);

        assert_eq!(headers[header::X_FRAME_OPTIONS], "sameorigin");
        assert_eq!(headers[header::SERVER], "snippetbox");
        assert_eq!(headers[header::X_XSS_PROTECTION], "0");
        assert_eq!(headers[header::CONTENT_SECURITY_POLICY], CONTENT_SECURITY_POLICY);
    }
}
