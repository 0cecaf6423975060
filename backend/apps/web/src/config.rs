//! Server Configuration
//!
//! Read from the environment (after `.env` is loaded):
//!
//! - `ADDR` listen address, default `0.0.0.0:4000`
//! - `DATABASE_URL` PostgreSQL URL; unset runs on in-memory stores
//! - `SESSION_SECRET` base64, 32 bytes; random in debug builds when unset
//! - `COOKIE_SECURE` `true`/`false`; defaults to `true` in release builds
//! - `PASSWORD_PEPPER` optional application-wide pepper

use std::net::SocketAddr;

use auth::AuthConfig;
use base64::Engine;
use base64::engine::general_purpose;
use thiserror::Error;

const DEFAULT_ADDR: &str = "0.0.0.0:4000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ADDR is not a socket address: {0}")]
    InvalidAddr(String),

    #[error("SESSION_SECRET must be set in production")]
    MissingSessionSecret,

    #[error("SESSION_SECRET must be base64 encoding of 32 bytes")]
    InvalidSessionSecret,

    #[error("COOKIE_SECURE must be true or false, got {0}")]
    InvalidCookieSecure(String),
}

#[derive(Debug, Clone)]
pub struct WebConfig {
    pub addr: SocketAddr,
    pub database_url: Option<String>,
    pub auth: AuthConfig,
}

impl WebConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok(), cfg!(debug_assertions))
    }

    /// Build from any key lookup; `development` relaxes the secret and
    /// cookie requirements
    pub fn from_lookup<F>(lookup: F, development: bool) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr_raw = lookup("ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr_raw
            .parse()
            .map_err(|_| ConfigError::InvalidAddr(addr_raw.clone()))?;

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let mut auth = match lookup("SESSION_SECRET") {
            Some(secret_b64) => AuthConfig {
                session_secret: decode_secret(&secret_b64)?,
                cookie_secure: !development,
                ..AuthConfig::default()
            },
            None if development => AuthConfig::development(),
            None => return Err(ConfigError::MissingSessionSecret),
        };

        if let Some(raw) = lookup("COOKIE_SECURE") {
            auth.cookie_secure = match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => return Err(ConfigError::InvalidCookieSecure(raw)),
            };
        }

        auth.password_pepper = lookup("PASSWORD_PEPPER")
            .filter(|p| !p.is_empty())
            .map(String::into_bytes);

        Ok(Self {
            addr,
            database_url,
            auth,
        })
    }
}

fn decode_secret(secret_b64: &str) -> Result<[u8; 32], ConfigError> {
    let bytes = general_purpose::STANDARD
        .decode(secret_b64.trim())
        .map_err(|_| ConfigError::InvalidSessionSecret)?;
    bytes
        .try_into()
        .map_err(|_| ConfigError::InvalidSessionSecret)
}
