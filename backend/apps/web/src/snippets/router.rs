use axum::{Router, middleware::from_fn_with_state, routing::get};
use auth::AuthAppState;
use auth::domain::repository::{SessionStore, UserRepository};
use auth::middleware::require_authentication;
use std::sync::Arc;

use crate::snippets::handlers::{self, SnippetState};
use crate::snippets::repository::SnippetRepository;

/// Home page and snippet routes; creation requires a signed-in user
pub fn snippet_router<R, U, S>(snippets: R, auth_state: AuthAppState<U, S>) -> Router
where
    R: SnippetRepository + Clone + Send + Sync + 'static,
    U: UserRepository + Clone + Send + Sync + 'static,
    S: SessionStore + Clone + Send + Sync + 'static,
{
    let state = SnippetState {
        snippets: Arc::new(snippets),
    };

    let public = Router::new()
        .route("/", get(handlers::home::<R>))
        .route("/snippet/view/{id}", get(handlers::snippet_view::<R>));

    let protected = Router::new()
        .route(
            "/snippet/create",
            get(handlers::snippet_create_form).post(handlers::snippet_create::<R>),
        )
        .route_layer(from_fn_with_state(
            auth_state,
            require_authentication::<U, S>,
        ));

    public.merge(protected).with_state(state)
}
