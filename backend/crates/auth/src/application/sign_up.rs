//! Sign Up Use Case
//!
//! Registers a new account from already validated input.

use std::sync::Arc;

use kernel::id::UserId;
use platform::password::ClearTextPassword;

use crate::application::credentials::CredentialVerifier;
use crate::domain::entity::user::NewUser;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::email::Email;
use crate::error::AuthResult;

/// Sign up input
pub struct SignUpInput {
    pub name: String,
    pub email: Email,
    pub password: ClearTextPassword,
}

/// Sign up use case
pub struct SignUpUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    verifier: Arc<CredentialVerifier>,
}

impl<U> SignUpUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, verifier: Arc<CredentialVerifier>) -> Self {
        Self {
            user_repo,
            verifier,
        }
    }

    /// Fails with `DomainError::DuplicateEmail` when the address is taken
    pub async fn execute(&self, input: SignUpInput) -> AuthResult<UserId> {
        let password_hash = self.verifier.hash(input.password).await?;

        let user_id = self
            .user_repo
            .insert(&NewUser {
                name: input.name.trim().to_string(),
                email: input.email,
                password_hash,
            })
            .await?;

        tracing::info!(user_id = %user_id, "User signed up");
        Ok(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::config::AuthConfig;
    use crate::error::AuthError;
    use crate::infra::memory::MemoryUserRepository;
    use kernel::error::domain::DomainError;

    fn input(email: &str) -> SignUpInput {
        SignUpInput {
            name: "Bob".to_string(),
            email: Email::new(email).unwrap(),
            password: ClearTextPassword::new("correct horse".to_string()).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_sign_up_then_duplicate() {
        let verifier = Arc::new(CredentialVerifier::new(&AuthConfig::testing()).unwrap());
        let repo = Arc::new(MemoryUserRepository::new());
        let use_case = SignUpUseCase::new(repo.clone(), verifier);

        let id = use_case.execute(input("bob@example.com")).await.unwrap();
        assert!(repo.exists(&id).await.unwrap());

        let err = use_case.execute(input("BOB@example.com")).await.unwrap_err();
        assert!(matches!(err, AuthError::Domain(DomainError::DuplicateEmail)));
    }
}
