//! Application Layer
//!
//! Use cases and application services.

pub mod change_password;
pub mod config;
pub mod credentials;
pub mod session;
pub mod session_manager;
pub mod sign_in;
pub mod sign_up;

// Re-exports
pub use change_password::{ChangePasswordInput, ChangePasswordUseCase};
pub use config::AuthConfig;
pub use credentials::CredentialVerifier;
pub use session::{FLASH_KEY, REDIRECT_AFTER_LOGIN_KEY, SessionHandle};
pub use session_manager::{CookieAction, SessionManager};
pub use sign_in::{SignInInput, SignInUseCase};
pub use sign_up::{SignUpInput, SignUpUseCase};
