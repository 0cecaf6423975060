//! Auth Middleware
//!
//! The session, CSRF and authentication layers of the request pipeline.
//! Install them outermost first: `load_session`, `verify_csrf`,
//! `publish_auth_state`; put `require_authentication` on protected routes.

use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, Method, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use kernel::error::app_error::AppError;
use platform::cookie::{extract_cookie, to_header_value};

use crate::application::session::{REDIRECT_AFTER_LOGIN_KEY, SessionHandle};
use crate::application::session_manager::CookieAction;
use crate::domain::repository::{SessionStore, UserRepository};
use crate::error::AuthError;
use crate::presentation::context::AuthStatus;
use crate::presentation::handlers::AuthAppState;

/// Form field carrying the CSRF token
pub const CSRF_FORM_FIELD: &str = "csrf_token";
/// Header carrying the CSRF token for non-form clients
pub const CSRF_HEADER: &str = "x-csrf-token";

// ============================================================================
// Session
// ============================================================================

/// Resolve the request's session, run the rest of the chain, then commit
/// the session and set or clear the cookie
pub async fn load_session<U, S>(
    State(state): State<AuthAppState<U, S>>,
    mut req: Request,
    next: Next,
) -> Response
where
    U: UserRepository + Clone + Send + Sync + 'static,
    S: SessionStore + Clone + Send + Sync + 'static,
{
    let cookie = extract_cookie(req.headers(), &state.config.session_cookie_name);

    let session = match state.sessions.resolve(cookie.as_deref()).await {
        Ok(session) => session,
        Err(e) => return e.into_response(),
    };
    req.extensions_mut().insert(session.clone());

    let mut response = next.run(req).await;

    let action = match state.sessions.commit(&session).await {
        Ok(action) => action,
        Err(e) => return e.into_response(),
    };

    let cookie_config = state.config.cookie_config();
    let set_cookie = match action {
        CookieAction::Keep => None,
        CookieAction::Set(id) => Some(
            cookie_config.build_set_cookie(&id.to_cookie_value(&state.config.session_secret)),
        ),
        CookieAction::Clear if cookie.is_some() => Some(cookie_config.build_delete_cookie()),
        CookieAction::Clear => None,
    };

    let headers = response.headers_mut();
    headers.append(header::VARY, HeaderValue::from_static("Cookie"));
    if let Some(value) = set_cookie.as_deref().and_then(to_header_value) {
        headers.append(header::SET_COOKIE, value);
        if !headers.contains_key(header::CACHE_CONTROL) {
            headers.insert(
                header::CACHE_CONTROL,
                HeaderValue::from_static(r#"no-cache="Set-Cookie""#),
            );
        }
    }

    response
}

// ============================================================================
// CSRF
// ============================================================================

fn is_state_changing(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}

/// Token submitted with the request, from the header or the form body
///
/// A form body is buffered and put back so the handler can still read it.
async fn submitted_token(req: Request, limit: usize) -> Result<(Request, Option<String>), Response> {
    if let Some(token) = req
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
    {
        return Ok((req, Some(token)));
    }

    if !is_form(req.headers()) {
        return Ok((req, None));
    }

    let (parts, body) = req.into_parts();
    let bytes = match to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(error = %e, "Unreadable form body");
            return Err(AppError::bad_request("Request body too large or unreadable").into_response());
        }
    };

    let token = url::form_urlencoded::parse(&bytes)
        .find(|(key, _)| key == CSRF_FORM_FIELD)
        .map(|(_, value)| value.into_owned());

    Ok((Request::from_parts(parts, Body::from(bytes)), token))
}

/// Reject state-changing requests whose token does not match the session's
pub async fn verify_csrf<U, S>(
    State(state): State<AuthAppState<U, S>>,
    req: Request,
    next: Next,
) -> Response
where
    U: UserRepository + Clone + Send + Sync + 'static,
    S: SessionStore + Clone + Send + Sync + 'static,
{
    if !is_state_changing(req.method()) {
        return next.run(req).await;
    }

    let Some(session) = req.extensions().get::<SessionHandle>().cloned() else {
        return AuthError::Internal("CSRF check ran without a session".to_string()).into_response();
    };

    let (req, submitted) = match submitted_token(req, state.config.max_form_bytes).await {
        Ok(found) => found,
        Err(response) => return response,
    };

    if !submitted.is_some_and(|token| session.csrf_matches(&token)) {
        return AuthError::CsrfMismatch.into_response();
    }

    next.run(req).await
}

// ============================================================================
// Authentication
// ============================================================================

/// Publish whether the session belongs to an existing user
pub async fn publish_auth_state<U, S>(
    State(state): State<AuthAppState<U, S>>,
    mut req: Request,
    next: Next,
) -> Response
where
    U: UserRepository + Clone + Send + Sync + 'static,
    S: SessionStore + Clone + Send + Sync + 'static,
{
    let Some(session) = req.extensions().get::<SessionHandle>().cloned() else {
        return AuthError::Internal("auth state ran without a session".to_string()).into_response();
    };

    let user_id = match session.user_id() {
        None => None,
        Some(id) => match state.users.exists(&id).await {
            Ok(true) => Some(id),
            Ok(false) => {
                tracing::info!(user_id = %id, "Session refers to a missing account");
                None
            }
            Err(e) => return e.into_response(),
        },
    };

    req.extensions_mut().insert(AuthStatus { user_id });
    next.run(req).await
}

/// Redirect anonymous requests to the login page, remembering where they
/// were going
pub async fn require_authentication<U, S>(
    State(state): State<AuthAppState<U, S>>,
    req: Request,
    next: Next,
) -> Response
where
    U: UserRepository + Clone + Send + Sync + 'static,
    S: SessionStore + Clone + Send + Sync + 'static,
{
    let auth = req.extensions().get::<AuthStatus>().copied().unwrap_or_default();

    if !auth.is_authenticated() {
        if let Some(session) = req.extensions().get::<SessionHandle>() {
            let target = req
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or("/");
            session.put(REDIRECT_AFTER_LOGIN_KEY, target);
        }
        tracing::debug!(path = %req.uri().path(), "Unauthenticated request to protected route");
        return Redirect::to(&state.config.login_path).into_response();
    }

    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
