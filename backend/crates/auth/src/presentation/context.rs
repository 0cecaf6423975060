//! Request Context
//!
//! Extractors for the values the session and authentication layers leave in
//! request extensions.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use kernel::id::UserId;

use crate::application::session::SessionHandle;
use crate::error::AuthError;
use crate::presentation::dto::TemplateData;

/// Authentication status stored in request extensions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthStatus {
    /// Signed-in user; `None` for anonymous requests
    pub user_id: Option<UserId>,
}

impl AuthStatus {
    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }
}

impl<S> FromRequestParts<S> for SessionHandle
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionHandle>()
            .cloned()
            .ok_or_else(|| AuthError::Internal("session layer not installed".to_string()))
    }
}

impl<S> FromRequestParts<S> for AuthStatus
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthStatus>()
            .copied()
            .ok_or_else(|| AuthError::Internal("auth state layer not installed".to_string()))
    }
}

/// Session plus authentication status, the pair every page handler needs
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub session: SessionHandle,
    pub auth: AuthStatus,
}

impl RequestContext {
    /// Common view data; consumes any pending flash message
    ///
    /// Carries the CSRF token only when the session is kept anyway.
    pub fn template_data(&self) -> TemplateData {
        let flash = self.session.pop_flash();
        TemplateData::new(
            flash,
            self.auth.is_authenticated(),
            self.session.stored_csrf_token(),
        )
    }

    /// View data for a page that renders a form
    pub fn form_data(&self) -> TemplateData {
        let flash = self.session.pop_flash();
        TemplateData::new(
            flash,
            self.auth.is_authenticated(),
            Some(self.session.csrf_token()),
        )
    }

    /// Signed-in user, or `Unauthenticated` when the route is reached
    /// without the authentication gate in front of it
    pub fn require_user(&self) -> Result<UserId, AuthError> {
        self.auth.user_id.ok_or(AuthError::Unauthenticated)
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            session: SessionHandle::from_request_parts(parts, state).await?,
            auth: AuthStatus::from_request_parts(parts, state).await?,
        })
    }
}
