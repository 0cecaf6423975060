//! In-Memory Repository Implementations
//!
//! Same contracts as the PostgreSQL stores, held in process memory.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::error::domain::DomainError;
use kernel::id::UserId;
use platform::password::{ClearTextPassword, HashedPassword};
use tokio::sync::RwLock;

use crate::application::credentials::CredentialVerifier;
use crate::domain::entity::{
    session::SessionRecord,
    user::{Credential, NewUser, User},
};
use crate::domain::repository::{SessionStore, UserRepository};
use crate::domain::value_object::{email::Email, session_id::SessionId};
use crate::error::{AuthError, AuthResult};

#[derive(Debug, Clone)]
struct StoredUser {
    name: String,
    email: Email,
    password_hash: HashedPassword,
    created: DateTime<Utc>,
}

/// In-memory user repository
#[derive(Clone, Default)]
pub struct MemoryUserRepository {
    users: Arc<RwLock<HashMap<UserId, StoredUser>>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account directly, bypassing the password policy
    pub async fn seed(
        &self,
        verifier: &CredentialVerifier,
        name: &str,
        email: &str,
        password: &str,
    ) -> AuthResult<UserId> {
        let email = Email::new(email).map_err(|e| AuthError::Internal(e.to_string()))?;
        let password_hash = verifier
            .hash(ClearTextPassword::for_verification(password.to_string()))
            .await?;

        self.insert(&NewUser {
            name: name.to_string(),
            email,
            password_hash,
        })
        .await
    }

    /// Delete an account (sessions pointing at it become anonymous)
    pub async fn remove(&self, user_id: &UserId) -> bool {
        self.users.write().await.remove(user_id).is_some()
    }
}

impl UserRepository for MemoryUserRepository {
    async fn insert(&self, user: &NewUser) -> AuthResult<UserId> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.email == user.email) {
            return Err(DomainError::DuplicateEmail.into());
        }

        let user_id = UserId::new();
        users.insert(
            user_id,
            StoredUser {
                name: user.name.clone(),
                email: user.email.clone(),
                password_hash: user.password_hash.clone(),
                created: Utc::now(),
            },
        );
        Ok(user_id)
    }

    async fn lookup_credential(&self, email: &Email) -> AuthResult<Credential> {
        self.users
            .read()
            .await
            .iter()
            .find(|(_, u)| &u.email == email)
            .map(|(id, u)| Credential {
                user_id: *id,
                password_hash: u.password_hash.clone(),
            })
            .ok_or_else(|| DomainError::NoRecord.into())
    }

    async fn credential_by_id(&self, user_id: &UserId) -> AuthResult<Credential> {
        self.users
            .read()
            .await
            .get(user_id)
            .map(|u| Credential {
                user_id: *user_id,
                password_hash: u.password_hash.clone(),
            })
            .ok_or_else(|| DomainError::NoRecord.into())
    }

    async fn exists(&self, user_id: &UserId) -> AuthResult<bool> {
        Ok(self.users.read().await.contains_key(user_id))
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<User> {
        self.users
            .read()
            .await
            .get(user_id)
            .map(|u| User {
                id: *user_id,
                name: u.name.clone(),
                email: u.email.clone(),
                created: u.created,
            })
            .ok_or_else(|| DomainError::NoRecord.into())
    }

    async fn update_password(&self, user_id: &UserId, hash: &HashedPassword) -> AuthResult<()> {
        let mut users = self.users.write().await;
        let user = users.get_mut(user_id).ok_or(DomainError::NoRecord)?;
        user.password_hash = hash.clone();
        Ok(())
    }
}

/// In-memory session store
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, SessionRecord>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions, expired ones included
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &SessionId) -> AuthResult<Option<SessionRecord>> {
        Ok(self
            .sessions
            .read()
            .await
            .get(id)
            .filter(|r| !r.is_expired())
            .cloned())
    }

    async fn insert(&self, record: &SessionRecord) -> AuthResult<()> {
        self.sessions
            .write()
            .await
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn replace(&self, record: &SessionRecord, expected_version: i64) -> AuthResult<bool> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&record.id) {
            Some(current) if current.version == expected_version => {
                *current = record.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn rotate(
        &self,
        old_id: &SessionId,
        expected_version: i64,
        record: &SessionRecord,
    ) -> AuthResult<bool> {
        let mut sessions = self.sessions.write().await;
        match sessions.get(old_id) {
            Some(current) if current.version == expected_version => {
                sessions.remove(old_id);
                sessions.insert(record.id.clone(), record.clone());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, id: &SessionId) -> AuthResult<()> {
        self.sessions.write().await.remove(id);
        Ok(())
    }

    async fn cleanup_expired(&self) -> AuthResult<u64> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, r| !r.is_expired());
        Ok((before - sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::session::SessionData;

    #[tokio::test]
    async fn test_replace_requires_current_version() {
        let store = MemorySessionStore::new();
        let record = SessionRecord::new(SessionData::anonymous(), chrono::Duration::hours(1));
        store.insert(&record).await.unwrap();

        let next = record.next_version(record.data.clone());
        assert!(store.replace(&next, 0).await.unwrap());
        // Second writer still holding version 0 loses
        assert!(!store.replace(&next, 0).await.unwrap());
    }

    #[tokio::test]
    async fn test_rotate_requires_current_version() {
        let store = MemorySessionStore::new();
        let record = SessionRecord::new(SessionData::anonymous(), chrono::Duration::hours(1));
        store.insert(&record).await.unwrap();

        let rotated = SessionRecord::new(record.data.clone(), chrono::Duration::hours(1));
        assert!(!store.rotate(&record.id, 7, &rotated).await.unwrap());
        assert!(store.rotate(&record.id, 0, &rotated).await.unwrap());
        assert!(store.load(&record.id).await.unwrap().is_none());
        assert!(store.load(&rotated.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let store = MemorySessionStore::new();
        let live = SessionRecord::new(SessionData::anonymous(), chrono::Duration::hours(1));
        let dead = SessionRecord::new(SessionData::anonymous(), chrono::Duration::seconds(-5));
        store.insert(&live).await.unwrap();
        store.insert(&dead).await.unwrap();

        assert!(store.load(&dead.id).await.unwrap().is_none());
        assert_eq!(store.cleanup_expired().await.unwrap(), 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_user_lookup_and_duplicate() {
        let verifier = CredentialVerifier::new(&crate::AuthConfig::testing()).unwrap();
        let repo = MemoryUserRepository::new();
        let id = repo
            .seed(&verifier, "Alice", "alice@example.com", "pa$$word")
            .await
            .unwrap();

        let email = Email::new("alice@example.com").unwrap();
        assert_eq!(repo.lookup_credential(&email).await.unwrap().user_id, id);
        assert_eq!(repo.find_by_id(&id).await.unwrap().name, "Alice");

        let dup = repo
            .seed(&verifier, "Other", "ALICE@example.com", "whatever1")
            .await
            .unwrap_err();
        assert!(matches!(dup, AuthError::Domain(DomainError::DuplicateEmail)));

        let missing = repo.find_by_id(&UserId::new()).await.unwrap_err();
        assert!(matches!(missing, AuthError::Domain(DomainError::NoRecord)));
    }
}
