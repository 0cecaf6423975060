//! CSRF Token
//!
//! Per-session anti-forgery token, rendered into forms and compared against
//! the submitted value on state-changing requests.

use platform::crypto::{constant_time_eq, random_token};
use serde::{Deserialize, Serialize};

const CSRF_TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CsrfToken(String);

impl CsrfToken {
    pub fn generate() -> Self {
        Self(random_token(CSRF_TOKEN_BYTES))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constant-time comparison with a submitted value
    pub fn matches(&self, submitted: &str) -> bool {
        !submitted.is_empty() && constant_time_eq(self.0.as_bytes(), submitted.as_bytes())
    }
}
