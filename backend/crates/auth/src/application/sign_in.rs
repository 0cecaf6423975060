//! Sign In Use Case
//!
//! Checks an email/password pair. Unknown email, wrong password and an
//! unusable stored digest are indistinguishable to the caller.

use std::sync::Arc;

use kernel::error::domain::DomainError;
use kernel::id::UserId;
use platform::password::ClearTextPassword;

use crate::application::credentials::CredentialVerifier;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

/// Sign in input
pub struct SignInInput {
    pub email: String,
    pub password: String,
}

/// Sign in use case
pub struct SignInUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    verifier: Arc<CredentialVerifier>,
}

impl<U> SignInUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, verifier: Arc<CredentialVerifier>) -> Self {
        Self {
            user_repo,
            verifier,
        }
    }

    pub async fn execute(&self, input: SignInInput) -> AuthResult<UserId> {
        let password = ClearTextPassword::for_verification(input.password);

        let credential = match Email::new(input.email) {
            Ok(email) => self.user_repo.lookup_credential(&email).await,
            Err(_) => Err(DomainError::NoRecord.into()),
        };

        match credential {
            Ok(credential) => {
                self.verifier
                    .verify(password, &credential.password_hash)
                    .await?;
                tracing::info!(user_id = %credential.user_id, "User signed in");
                Ok(credential.user_id)
            }
            Err(AuthError::Domain(DomainError::NoRecord)) => {
                Err(self.verifier.reject_unknown(password).await)
            }
            Err(e) => Err(e),
        }
    }
}
