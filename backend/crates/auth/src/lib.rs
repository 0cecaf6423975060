//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository traits
//! - `application/` - Use cases, session handling, credential verification
//! - `infra/` - PostgreSQL and in-memory stores
//! - `presentation/` - Middleware, handlers, DTOs, router
//!
//! ## Features
//! - Server-side sessions behind a signed cookie, with flash messages
//! - Per-session CSRF token checked on every state-changing request
//! - Authentication gate with redirect-after-login
//! - Signup, login, logout and password change
//!
//! ## Security Model
//! - Passwords hashed with Argon2id; unknown emails cost the same as wrong
//!   passwords
//! - Session id and CSRF token are renewed on every privilege change
//! - Concurrent writes to one session are merged, never lost or revived

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use application::session::SessionHandle;
pub use error::{AuthError, AuthResult};
pub use infra::{MemorySessionStore, MemoryUserRepository, PgSessionStore, PgUserRepository};
pub use presentation::router::auth_router;
pub use presentation::{AuthAppState, AuthStatus, RequestContext, TemplateData};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    domain::DomainError,
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod handlers {
    pub use crate::presentation::handlers::*;
}

pub mod store {
    pub use crate::infra::memory::{MemorySessionStore, MemoryUserRepository};
    pub use crate::infra::postgres::{PgSessionStore, PgUserRepository};
}

pub mod router {
    pub use crate::presentation::router::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
