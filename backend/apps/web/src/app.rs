//! Application Router
//!
//! Assembles the routes and wraps them in the request pipeline. Layers run
//! outermost first:
//!
//! 1. panic recovery
//! 2. request logger (span, completion, cancellation) and common headers
//! 3. session load / commit
//! 4. CSRF guard
//! 5. authentication state
//!
//! Protected routes add the authentication gate as a route layer.

use auth::AuthAppState;
use auth::domain::repository::{SessionStore, UserRepository};
use auth::middleware::{load_session, publish_auth_state, verify_csrf};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::{Router, routing::get};
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::middleware::{headers, logging, recover};
use crate::snippets::{SnippetRepository, snippet_router};

/// GET /ping
pub async fn ping() -> &'static str {
    "OK"
}

/// All application routes, without the pipeline
pub fn routes<R, U, S>(snippets: R, auth_state: AuthAppState<U, S>) -> Router
where
    R: SnippetRepository + Clone + Send + Sync + 'static,
    U: UserRepository + Clone + Send + Sync + 'static,
    S: SessionStore + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/ping", get(ping))
        .merge(snippet_router(snippets, auth_state.clone()))
        .merge(auth::auth_router(auth_state))
}

/// Wrap `routes` in the request pipeline
pub fn with_pipeline<U, S>(routes: Router, auth_state: AuthAppState<U, S>) -> Router
where
    U: UserRepository + Clone + Send + Sync + 'static,
    S: SessionStore + Clone + Send + Sync + 'static,
{
    let trace = TraceLayer::new_for_http()
        .make_span_with(logging::RequestSpan)
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        );

    routes.layer(
        ServiceBuilder::new()
            .layer(CatchPanicLayer::custom(recover::handle_panic))
            .layer(trace)
            .layer(from_fn(logging::log_cancellation))
            .layer(from_fn(headers::common_headers))
            .layer(from_fn_with_state(auth_state.clone(), load_session::<U, S>))
            .layer(from_fn_with_state(auth_state.clone(), verify_csrf::<U, S>))
            .layer(from_fn_with_state(auth_state, publish_auth_state::<U, S>)),
    )
}

/// The complete application
pub fn build_app<R, U, S>(snippets: R, auth_state: AuthAppState<U, S>) -> Router
where
    R: SnippetRepository + Clone + Send + Sync + 'static,
    U: UserRepository + Clone + Send + Sync + 'static,
    S: SessionStore + Clone + Send + Sync + 'static,
{
    with_pipeline(routes(snippets, auth_state.clone()), auth_state)
}
