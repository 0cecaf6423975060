//! HTTP Handlers

use axum::Form;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use kernel::error::domain::DomainError;
use serde::Serialize;
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::session::REDIRECT_AFTER_LOGIN_KEY;
use crate::application::{
    ChangePasswordInput, ChangePasswordUseCase, CredentialVerifier, SessionManager, SignInInput,
    SignInUseCase, SignUpInput, SignUpUseCase,
};
use crate::domain::repository::{SessionStore, UserRepository};
use crate::error::{AuthError, AuthResult};
use crate::presentation::context::RequestContext;
use crate::presentation::dto::{LoginForm, PasswordUpdateForm, SignUpForm};

/// Shared state for auth handlers and middleware
#[derive(Clone)]
pub struct AuthAppState<U, S>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    S: SessionStore + Clone + Send + Sync + 'static,
{
    pub users: Arc<U>,
    pub sessions: Arc<SessionManager<S>>,
    pub verifier: Arc<CredentialVerifier>,
    pub config: Arc<AuthConfig>,
}

impl<U, S> AuthAppState<U, S>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    S: SessionStore + Clone + Send + Sync + 'static,
{
    pub fn new(users: U, store: S, config: AuthConfig) -> AuthResult<Self> {
        let config = Arc::new(config);
        Ok(Self {
            users: Arc::new(users),
            sessions: Arc::new(SessionManager::new(Arc::new(store), config.clone())),
            verifier: Arc::new(CredentialVerifier::new(&config)?),
            config,
        })
    }
}

// ============================================================================
// Sign Up
// ============================================================================

/// GET /user/signup
pub async fn sign_up_form(ctx: RequestContext) -> Response {
    ctx.form_data()
        .with_form(&SignUpForm::default(), Default::default())
        .render(StatusCode::OK)
}

/// POST /user/signup
pub async fn sign_up<U, S>(
    State(state): State<AuthAppState<U, S>>,
    ctx: RequestContext,
    Form(form): Form<SignUpForm>,
) -> AuthResult<Response>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    S: SessionStore + Clone + Send + Sync + 'static,
{
    let valid = match form.validate() {
        Ok(valid) => valid,
        Err(errors) => {
            return Ok(ctx
                .form_data()
                .with_form(&form, errors)
                .render(StatusCode::UNPROCESSABLE_ENTITY));
        }
    };

    let use_case = SignUpUseCase::new(state.users.clone(), state.verifier.clone());

    let input = SignUpInput {
        name: valid.name,
        email: valid.email,
        password: valid.password,
    };

    match use_case.execute(input).await {
        Ok(_) => {
            ctx.session
                .put_flash("Your signup was successful. Please log in.");
            Ok(Redirect::to(&state.config.login_path).into_response())
        }
        Err(AuthError::Domain(DomainError::DuplicateEmail)) => {
            let mut errors = kernel::validation::Validator::new();
            errors.add_field_error("email", "Email address is already in use");
            Ok(ctx
                .form_data()
                .with_form(&form, errors)
                .render(StatusCode::UNPROCESSABLE_ENTITY))
        }
        Err(e) => Err(e),
    }
}

// ============================================================================
// Login
// ============================================================================

/// GET /user/login
pub async fn login_form(ctx: RequestContext) -> Response {
    ctx.form_data()
        .with_form(&LoginForm::default(), Default::default())
        .render(StatusCode::OK)
}

/// POST /user/login
pub async fn login<U, S>(
    State(state): State<AuthAppState<U, S>>,
    ctx: RequestContext,
    Form(form): Form<LoginForm>,
) -> AuthResult<Response>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    S: SessionStore + Clone + Send + Sync + 'static,
{
    if let Err(errors) = form.validate() {
        return Ok(ctx
            .form_data()
            .with_form(&form, errors)
            .render(StatusCode::UNPROCESSABLE_ENTITY));
    }

    let use_case = SignInUseCase::new(state.users.clone(), state.verifier.clone());

    let input = SignInInput {
        email: form.email,
        password: form.password,
    };

    match use_case.execute(input).await {
        Ok(user_id) => {
            ctx.session.login(user_id);

            let target = ctx
                .session
                .pop_string(REDIRECT_AFTER_LOGIN_KEY)
                .filter(|path| is_local_path(path))
                .unwrap_or_else(|| state.config.home_path.clone());

            Ok(Redirect::to(&target).into_response())
        }
        Err(AuthError::Domain(DomainError::InvalidCredentials)) => {
            // Same body for every cause; the submitted email is not echoed
            let mut errors = kernel::validation::Validator::new();
            errors.add_non_field_error("Email or password is incorrect");
            Ok(ctx
                .form_data()
                .with_form(&LoginForm::default(), errors)
                .render(StatusCode::UNPROCESSABLE_ENTITY))
        }
        Err(e) => Err(e),
    }
}

/// Same-origin absolute path (no scheme, no `//host`)
fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\")
}

// ============================================================================
// Logout
// ============================================================================

/// POST /user/logout
pub async fn logout<U, S>(
    State(state): State<AuthAppState<U, S>>,
    ctx: RequestContext,
) -> Response
where
    U: UserRepository + Clone + Send + Sync + 'static,
    S: SessionStore + Clone + Send + Sync + 'static,
{
    if let Some(user_id) = ctx.auth.user_id {
        tracing::info!(user_id = %user_id, "User logged out");
    }
    ctx.session.destroy();
    ctx.session.put_flash("You've been logged out successfully!");
    Redirect::to(&state.config.home_path).into_response()
}

// ============================================================================
// Account
// ============================================================================

#[derive(Serialize)]
struct AccountPage<'a> {
    user: &'a crate::domain::entity::user::User,
}

/// GET /account/view
pub async fn account_view<U, S>(
    State(state): State<AuthAppState<U, S>>,
    ctx: RequestContext,
) -> AuthResult<Response>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    S: SessionStore + Clone + Send + Sync + 'static,
{
    let user_id = ctx.require_user()?;
    let user = state.users.find_by_id(&user_id).await?;

    Ok(ctx
        .template_data()
        .with_page(AccountPage { user: &user })
        .render(StatusCode::OK))
}

/// GET /account/password/update
pub async fn password_update_form(ctx: RequestContext) -> Response {
    ctx.form_data().render(StatusCode::OK)
}

/// POST /account/password/update
pub async fn password_update<U, S>(
    State(state): State<AuthAppState<U, S>>,
    ctx: RequestContext,
    Form(form): Form<PasswordUpdateForm>,
) -> AuthResult<Response>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    S: SessionStore + Clone + Send + Sync + 'static,
{
    let user_id = ctx.require_user()?;

    let valid = match form.validate() {
        Ok(valid) => valid,
        Err(errors) => {
            return Ok(ctx
                .form_data()
                .with_errors(errors)
                .render(StatusCode::UNPROCESSABLE_ENTITY));
        }
    };

    let use_case = ChangePasswordUseCase::new(state.users.clone(), state.verifier.clone());

    let input = ChangePasswordInput {
        current_password: valid.current_password,
        new_password: valid.new_password,
    };

    match use_case.execute(&user_id, input).await {
        Ok(()) => {
            ctx.session.renew_token();
            ctx.session.put_flash("Your password has been updated!");
            Ok(Redirect::to("/account/view").into_response())
        }
        Err(AuthError::Domain(DomainError::InvalidCredentials)) => {
            let mut errors = kernel::validation::Validator::new();
            errors.add_field_error("current_password", "Current password is incorrect");
            Ok(ctx
                .form_data()
                .with_errors(errors)
                .render(StatusCode::UNPROCESSABLE_ENTITY))
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_local_path() {
        assert!(is_local_path("/snippet/create"));
        assert!(is_local_path("/snippet/view/1?x=y"));
        assert!(!is_local_path("//evil.example"));
        assert!(!is_local_path("/\\evil.example"));
        assert!(!is_local_path("https://evil.example"));
        assert!(!is_local_path(""));
    }
}
