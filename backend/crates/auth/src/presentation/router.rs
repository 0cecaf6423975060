//! Auth Router

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use crate::domain::repository::{SessionStore, UserRepository};
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::require_authentication;

/// User and account routes
///
/// Expects the session, CSRF and auth-state layers to be installed around
/// the final router.
pub fn auth_router<U, S>(state: AuthAppState<U, S>) -> Router
where
    U: UserRepository + Clone + Send + Sync + 'static,
    S: SessionStore + Clone + Send + Sync + 'static,
{
    let public = Router::new()
        .route(
            "/user/signup",
            get(handlers::sign_up_form).post(handlers::sign_up::<U, S>),
        )
        .route(
            "/user/login",
            get(handlers::login_form).post(handlers::login::<U, S>),
        );

    let protected = Router::new()
        .route("/user/logout", post(handlers::logout::<U, S>))
        .route("/account/view", get(handlers::account_view::<U, S>))
        .route(
            "/account/password/update",
            get(handlers::password_update_form).post(handlers::password_update::<U, S>),
        )
        .route_layer(from_fn_with_state(
            state.clone(),
            require_authentication::<U, S>,
        ));

    public.merge(protected).with_state(state)
}
