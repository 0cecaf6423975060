//! Credential Verifier
//!
//! Slow salted hashing of passwords and comparison against stored digests.
//! Every failure reaches the caller as `DomainError::InvalidCredentials`;
//! the underlying cause is only logged.

use std::sync::Arc;

use kernel::error::domain::DomainError;
use platform::crypto::random_token;
use platform::password::{ClearTextPassword, HashCost, HashedPassword, PasswordHashError};

use crate::application::config::AuthConfig;
use crate::error::{AuthError, AuthResult};

/// Outcome of one digest comparison
#[derive(Debug, Clone, PartialEq, Eq)]
enum Verification {
    Matched,
    Mismatch,
    MalformedDigest,
    Unusable(String),
}

/// Hashes and verifies passwords off the async executor
pub struct CredentialVerifier {
    cost: HashCost,
    pepper: Option<Arc<[u8]>>,
    /// Digest of a random password, compared against when no account exists
    dummy: HashedPassword,
}

impl CredentialVerifier {
    pub fn new(config: &AuthConfig) -> AuthResult<Self> {
        let dummy = ClearTextPassword::for_verification(random_token(24))
            .hash(config.password_cost, config.pepper())?;

        Ok(Self {
            cost: config.password_cost,
            pepper: config.password_pepper.as_deref().map(Arc::from),
            dummy,
        })
    }

    /// Hash a password for storage
    pub async fn hash(&self, password: ClearTextPassword) -> AuthResult<HashedPassword> {
        let cost = self.cost;
        let pepper = self.pepper.clone();

        tokio::task::spawn_blocking(move || password.hash(cost, pepper.as_deref()))
            .await
            .map_err(|e| AuthError::Internal(format!("hash task failed: {e}")))?
            .map_err(AuthError::from)
    }

    /// Compare `password` with a stored digest
    pub async fn verify(&self, password: ClearTextPassword, digest: &HashedPassword) -> AuthResult<()> {
        match self.compare(password, digest.clone()).await? {
            Verification::Matched => return Ok(()),
            Verification::Mismatch => {
                tracing::debug!("Password does not match stored digest");
            }
            Verification::MalformedDigest => {
                tracing::warn!("Stored password digest is malformed");
                self.burn().await?;
            }
            Verification::Unusable(detail) => {
                tracing::error!(error = %detail, "Stored password digest could not be checked");
                self.burn().await?;
            }
        }
        Err(DomainError::InvalidCredentials.into())
    }

    /// Spend the cost of a real verification for an account that does not
    /// exist, then fail the same way a wrong password does
    pub async fn reject_unknown(&self, password: ClearTextPassword) -> AuthError {
        if let Err(e) = self.compare(password, self.dummy.clone()).await {
            return e;
        }
        tracing::debug!("No account for submitted email");
        DomainError::InvalidCredentials.into()
    }

    async fn burn(&self) -> AuthResult<()> {
        let password = ClearTextPassword::for_verification(String::new());
        self.compare(password, self.dummy.clone()).await.map(|_| ())
    }

    async fn compare(
        &self,
        password: ClearTextPassword,
        digest: HashedPassword,
    ) -> AuthResult<Verification> {
        let pepper = self.pepper.clone();

        tokio::task::spawn_blocking(move || match digest.verify(&password, pepper.as_deref()) {
            Ok(true) => Verification::Matched,
            Ok(false) => Verification::Mismatch,
            Err(PasswordHashError::InvalidHashFormat) => Verification::MalformedDigest,
            Err(e) => Verification::Unusable(e.to_string()),
        })
        .await
        .map_err(|e| AuthError::Internal(format!("verify task failed: {e}")))
    }
}
