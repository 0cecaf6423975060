//! Change Password Use Case

use std::sync::Arc;

use kernel::id::UserId;
use platform::password::ClearTextPassword;

use crate::application::credentials::CredentialVerifier;
use crate::domain::repository::UserRepository;
use crate::error::AuthResult;

pub struct ChangePasswordInput {
    pub current_password: ClearTextPassword,
    pub new_password: ClearTextPassword,
}

pub struct ChangePasswordUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    verifier: Arc<CredentialVerifier>,
}

impl<U> ChangePasswordUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, verifier: Arc<CredentialVerifier>) -> Self {
        Self {
            user_repo,
            verifier,
        }
    }

    /// Fails with `DomainError::InvalidCredentials` when the current
    /// password is wrong
    pub async fn execute(&self, user_id: &UserId, input: ChangePasswordInput) -> AuthResult<()> {
        let credential = self.user_repo.credential_by_id(user_id).await?;

        self.verifier
            .verify(input.current_password, &credential.password_hash)
            .await?;

        let hash = self.verifier.hash(input.new_password).await?;
        self.user_repo.update_password(user_id, &hash).await?;

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::config::AuthConfig;
    use crate::application::sign_in::{SignInInput, SignInUseCase};
    use crate::error::AuthError;
    use crate::infra::memory::MemoryUserRepository;
    use kernel::error::domain::DomainError;

    fn pw(s: &str) -> ClearTextPassword {
        ClearTextPassword::for_verification(s.to_string())
    }

    #[tokio::test]
    async fn test_change_password() {
        let verifier = Arc::new(CredentialVerifier::new(&AuthConfig::testing()).unwrap());
        let repo = Arc::new(MemoryUserRepository::new());
        let user_id = repo
            .seed(&verifier, "Alice", "alice@example.com", "pa$$word")
            .await
            .unwrap();
        let use_case = ChangePasswordUseCase::new(repo.clone(), verifier.clone());

        let wrong = use_case
            .execute(
                &user_id,
                ChangePasswordInput {
                    current_password: pw("not-it"),
                    new_password: pw("n3w-passphrase"),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(wrong, AuthError::Domain(DomainError::InvalidCredentials)));

        use_case
            .execute(
                &user_id,
                ChangePasswordInput {
                    current_password: pw("pa$$word"),
                    new_password: pw("n3w-passphrase"),
                },
            )
            .await
            .unwrap();

        let sign_in = SignInUseCase::new(repo, verifier);
        let login = |password: &str| SignInInput {
            email: "alice@example.com".to_string(),
            password: password.to_string(),
        };
        assert!(sign_in.execute(login("pa$$word")).await.is_err());
        assert_eq!(sign_in.execute(login("n3w-passphrase")).await.unwrap(), user_id);
    }
}
