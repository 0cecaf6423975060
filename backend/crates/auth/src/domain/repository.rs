//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use kernel::id::UserId;
use platform::password::HashedPassword;

use crate::domain::entity::{
    session::SessionRecord,
    user::{Credential, NewUser, User},
};
use crate::domain::value_object::{email::Email, session_id::SessionId};
use crate::error::AuthResult;

/// User repository trait
///
/// Missing rows surface as `DomainError::NoRecord`, a taken email as
/// `DomainError::DuplicateEmail`.
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Insert a new account
    async fn insert(&self, user: &NewUser) -> AuthResult<UserId>;

    /// Credential for the account registered under `email`
    async fn lookup_credential(&self, email: &Email) -> AuthResult<Credential>;

    /// Credential for the account with `user_id`
    async fn credential_by_id(&self, user_id: &UserId) -> AuthResult<Credential>;

    /// Whether an account with `user_id` still exists
    async fn exists(&self, user_id: &UserId) -> AuthResult<bool>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<User>;

    /// Replace the stored password digest
    async fn update_password(&self, user_id: &UserId, hash: &HashedPassword) -> AuthResult<()>;
}

/// Session store trait
///
/// Writes are conditional on the version the caller read. A `false` return
/// means another request got there first; the caller reloads and retries.
#[trait_variant::make(SessionStore: Send)]
pub trait LocalSessionStore {
    /// Load an unexpired session
    async fn load(&self, id: &SessionId) -> AuthResult<Option<SessionRecord>>;

    /// Insert a new session
    async fn insert(&self, record: &SessionRecord) -> AuthResult<()>;

    /// Store `record` if the stored version is still `expected_version`
    async fn replace(&self, record: &SessionRecord, expected_version: i64) -> AuthResult<bool>;

    /// Delete `old_id` and insert `record` in one step, if `old_id` is still
    /// at `expected_version`
    async fn rotate(
        &self,
        old_id: &SessionId,
        expected_version: i64,
        record: &SessionRecord,
    ) -> AuthResult<bool>;

    /// Delete a session (missing ids are not an error)
    async fn delete(&self, id: &SessionId) -> AuthResult<()>;

    /// Clean up expired sessions
    async fn cleanup_expired(&self) -> AuthResult<u64>;
}
