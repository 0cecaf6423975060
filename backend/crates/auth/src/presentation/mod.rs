//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, and middleware.

pub mod context;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use context::{AuthStatus, RequestContext};
pub use dto::TemplateData;
pub use handlers::AuthAppState;
pub use middleware::{load_session, publish_auth_state, require_authentication, verify_csrf};
pub use router::auth_router;
