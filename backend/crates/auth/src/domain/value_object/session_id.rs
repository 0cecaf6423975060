//! Session Identifier
//!
//! 256-bit random value, URL-safe base64 without padding. The value sent to
//! the browser is `<id>.<hmac>` so forged or truncated cookies are rejected
//! before the store is consulted.

use platform::crypto::{random_token, sign, verify_signature};
use std::fmt;

const SESSION_ID_BYTES: usize = 32;
/// Encoded length of a 32 byte id
const SESSION_ID_LEN: usize = 43;

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self(random_token(SESSION_ID_BYTES))
    }

    /// Accept a stored id (database round trip)
    pub fn from_db(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Encode for the session cookie
    pub fn to_cookie_value(&self, secret: &[u8]) -> String {
        format!("{}.{}", self.0, sign(secret, self.0.as_bytes()))
    }

    /// Decode a session cookie, `None` when malformed or the signature fails
    pub fn from_cookie_value(value: &str, secret: &[u8]) -> Option<Self> {
        let (id, signature) = value.split_once('.')?;

        if id.len() != SESSION_ID_LEN
            || !id
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return None;
        }

        verify_signature(secret, id.as_bytes(), signature).then(|| Self(id.to_string()))
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Bearer credential: only a prefix is ever printed
        let prefix: String = self.0.chars().take(6).collect();
        write!(f, "SessionId({}…)", prefix)
    }
}
