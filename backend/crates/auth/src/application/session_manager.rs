//! Session Manager
//!
//! Resolves the session for an incoming request and writes the request's
//! changes back when it completes.
//!
//! Concurrent requests on one session are serialized by the store's version
//! check: a commit reloads the stored record, replays this request's
//! mutation log onto it and writes it only if nobody else wrote in between.
//! A session destroyed or rotated by another request is never revived.

use std::sync::Arc;

use chrono::Utc;

use crate::application::config::AuthConfig;
use crate::application::session::{SessionHandle, Snapshot, Transition};
use crate::domain::entity::session::{Mutation, SessionRecord};
use crate::domain::repository::SessionStore;
use crate::domain::value_object::session_id::SessionId;
use crate::error::{AuthError, AuthResult};

/// Attempts before a contended commit gives up
const MAX_COMMIT_ATTEMPTS: usize = 5;

/// What the response must do with the session cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieAction {
    /// Cookie already points at the right session
    Keep,
    /// Send a cookie for this session
    Set(SessionId),
    /// Remove the cookie
    Clear,
}

pub struct SessionManager<S>
where
    S: SessionStore,
{
    store: Arc<S>,
    config: Arc<AuthConfig>,
}

impl<S> SessionManager<S>
where
    S: SessionStore + Send + Sync + 'static,
{
    pub fn new(store: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Session for a request carrying `cookie` (the raw cookie value)
    ///
    /// Missing, forged, unknown and expired cookies all yield a new
    /// anonymous session.
    pub async fn resolve(&self, cookie: Option<&str>) -> AuthResult<SessionHandle> {
        let Some(cookie) = cookie else {
            return Ok(self.fresh());
        };

        let Some(id) = SessionId::from_cookie_value(cookie, &self.config.session_secret) else {
            tracing::debug!("Rejected malformed session cookie");
            return Ok(self.fresh());
        };

        match self.store.load(&id).await? {
            Some(record) if !record.is_expired() => Ok(SessionHandle::loaded(record)),
            _ => {
                tracing::debug!(session = ?id, "Session not found or expired");
                Ok(self.fresh())
            }
        }
    }

    fn fresh(&self) -> SessionHandle {
        SessionHandle::fresh(self.config.session_ttl_chrono())
    }

    /// Persist the request's changes
    pub async fn commit(&self, handle: &SessionHandle) -> AuthResult<CookieAction> {
        let snap = handle.snapshot();

        match (&snap.original, snap.transition) {
            (original, Transition::Destroy) => {
                if let Some((old_id, _)) = original {
                    self.store.delete(old_id).await?;
                    tracing::debug!(session = ?old_id, "Session destroyed");
                }
                if snap.needs_insert() {
                    self.insert_new(&snap).await
                } else {
                    Ok(CookieAction::Clear)
                }
            }
            (None, _) => {
                if snap.needs_insert() {
                    self.insert_new(&snap).await
                } else {
                    Ok(CookieAction::Keep)
                }
            }
            (Some((id, _)), Transition::None) => {
                if snap.log.is_empty() {
                    Ok(CookieAction::Keep)
                } else {
                    self.replay(id, &snap).await
                }
            }
            (Some((old_id, _)), Transition::Rotate) => self.rotate(old_id, &snap).await,
        }
    }

    async fn insert_new(&self, snap: &Snapshot) -> AuthResult<CookieAction> {
        let record = SessionRecord {
            id: snap.id.clone(),
            data: snap.data.clone(),
            expires_at: snap.expires_at,
            version: 0,
        };
        self.store.insert(&record).await?;
        Ok(CookieAction::Set(record.id))
    }

    async fn replay(&self, id: &SessionId, snap: &Snapshot) -> AuthResult<CookieAction> {
        for _ in 0..MAX_COMMIT_ATTEMPTS {
            let Some(current) = self.store.load(id).await? else {
                tracing::info!(session = ?id, "Session ended during request, discarding changes");
                return Ok(CookieAction::Clear);
            };

            let mut data = current.data.clone();
            for mutation in &snap.log {
                data.apply(mutation);
            }

            if self
                .store
                .replace(&current.next_version(data), current.version)
                .await?
            {
                return Ok(CookieAction::Keep);
            }
            tracing::debug!(session = ?id, "Session write conflict, retrying");
        }

        Err(AuthError::Internal("session write contention".to_string()))
    }

    async fn rotate(&self, old_id: &SessionId, snap: &Snapshot) -> AuthResult<CookieAction> {
        let expires_at = Utc::now() + self.config.session_ttl_chrono();

        for _ in 0..MAX_COMMIT_ATTEMPTS {
            let Some(current) = self.store.load(old_id).await? else {
                // Old session is gone. Only a login may start over from this
                // request's view; anything else would revive an ended session.
                if !snap.log.iter().any(|m| matches!(m, Mutation::BindUser(_))) {
                    tracing::info!(session = ?old_id, "Session ended during request, discarding renewal");
                    return Ok(CookieAction::Clear);
                }
                let record = SessionRecord {
                    id: snap.id.clone(),
                    data: snap.data.clone(),
                    expires_at,
                    version: 0,
                };
                self.store.insert(&record).await?;
                return Ok(CookieAction::Set(record.id));
            };

            let mut data = current.data.clone();
            for mutation in &snap.log {
                data.apply(mutation);
            }
            data.csrf_token = snap.data.csrf_token.clone();

            let record = SessionRecord {
                id: snap.id.clone(),
                data,
                expires_at,
                version: 0,
            };

            if self.store.rotate(old_id, current.version, &record).await? {
                tracing::debug!(session = ?record.id, "Session token renewed");
                return Ok(CookieAction::Set(record.id));
            }
            tracing::debug!(session = ?old_id, "Session rotation conflict, retrying");
        }

        Err(AuthError::Internal("session write contention".to_string()))
    }

    /// Remove expired sessions from the store
    pub async fn sweep(&self) -> AuthResult<u64> {
        let removed = self.store.cleanup_expired().await?;
        if removed > 0 {
            tracing::info!(removed, "Expired sessions removed");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory::MemorySessionStore;
    use kernel::id::UserId;

    fn manager() -> SessionManager<MemorySessionStore> {
        SessionManager::new(
            Arc::new(MemorySessionStore::new()),
            Arc::new(AuthConfig::testing()),
        )
    }

    fn cookie_for(m: &SessionManager<MemorySessionStore>, id: &SessionId) -> String {
        id.to_cookie_value(&m.config.session_secret)
    }

    /// Store a session and return its cookie value
    async fn established(m: &SessionManager<MemorySessionStore>) -> String {
        let handle = m.resolve(None).await.unwrap();
        handle.csrf_token();
        match m.commit(&handle).await.unwrap() {
            CookieAction::Set(id) => cookie_for(m, &id),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_untouched_fresh_session_is_not_stored() {
        let m = manager();
        let handle = m.resolve(None).await.unwrap();
        assert_eq!(m.commit(&handle).await.unwrap(), CookieAction::Keep);
        assert_eq!(m.store().len().await, 0);
    }

    #[tokio::test]
    async fn test_fresh_session_with_rendered_token_is_stored() {
        let m = manager();
        let cookie = established(&m).await;
        let handle = m.resolve(Some(&cookie)).await.unwrap();
        assert!(handle.snapshot().original.is_some());
    }

    #[tokio::test]
    async fn test_forged_cookie_yields_fresh_session() {
        let m = manager();
        let handle = m.resolve(Some("abc.def")).await.unwrap();
        assert!(handle.snapshot().original.is_none());
    }

    #[tokio::test]
    async fn test_expired_session_resolves_as_fresh() {
        let m = manager();
        let mut data = crate::domain::entity::session::SessionData::anonymous();
        data.apply(&Mutation::BindUser(UserId::new()));
        let mut record = SessionRecord::new(data, chrono::Duration::hours(1));
        record.expires_at = Utc::now() - chrono::Duration::seconds(1);
        m.store().insert(&record).await.unwrap();

        let handle = m.resolve(Some(&cookie_for(&m, &record.id))).await.unwrap();
        let snap = handle.snapshot();
        assert!(snap.original.is_none());
        assert_ne!(snap.id, record.id);
        assert_eq!(handle.user_id(), None);
        assert!(!handle.csrf_matches(record.data.csrf_token.as_str()));
    }

    #[tokio::test]
    async fn test_concurrent_writes_are_merged() {
        let m = manager();
        let cookie = established(&m).await;

        let a = m.resolve(Some(&cookie)).await.unwrap();
        let b = m.resolve(Some(&cookie)).await.unwrap();
        a.put("a", 1);
        b.put("b", 2);

        assert_eq!(m.commit(&a).await.unwrap(), CookieAction::Keep);
        assert_eq!(m.commit(&b).await.unwrap(), CookieAction::Keep);

        let merged = m.resolve(Some(&cookie)).await.unwrap();
        assert_eq!(merged.get::<i64>("a"), Some(1));
        assert_eq!(merged.get::<i64>("b"), Some(2));
    }

    #[tokio::test]
    async fn test_destroyed_session_is_not_revived() {
        let m = manager();
        let cookie = established(&m).await;

        let logout = m.resolve(Some(&cookie)).await.unwrap();
        let stale = m.resolve(Some(&cookie)).await.unwrap();

        logout.destroy();
        assert_eq!(m.commit(&logout).await.unwrap(), CookieAction::Clear);

        stale.put("late", true);
        assert_eq!(m.commit(&stale).await.unwrap(), CookieAction::Clear);
        assert_eq!(m.store().len().await, 0);
    }

    #[tokio::test]
    async fn test_destroy_is_idempotent() {
        let m = manager();
        let cookie = established(&m).await;

        for _ in 0..2 {
            let handle = m.resolve(Some(&cookie)).await.unwrap();
            handle.destroy();
            assert!(m.commit(&handle).await.is_ok());
        }
    }

    #[tokio::test]
    async fn test_login_rotation_invalidates_old_id() {
        let m = manager();
        let cookie = established(&m).await;

        let handle = m.resolve(Some(&cookie)).await.unwrap();
        let old_token = handle.csrf_token();
        let user = UserId::new();
        handle.login(user);

        let CookieAction::Set(new_id) = m.commit(&handle).await.unwrap() else {
            panic!("rotation must set a new cookie");
        };

        let old = m.resolve(Some(&cookie)).await.unwrap();
        assert!(old.snapshot().original.is_none());
        assert_eq!(old.user_id(), None);

        let new = m.resolve(Some(&cookie_for(&m, &new_id))).await.unwrap();
        assert_eq!(new.user_id(), Some(user));
        assert!(!new.csrf_matches(&old_token));
    }

    #[tokio::test]
    async fn test_rotation_keeps_concurrent_writes() {
        let m = manager();
        let cookie = established(&m).await;

        let login = m.resolve(Some(&cookie)).await.unwrap();
        let other = m.resolve(Some(&cookie)).await.unwrap();

        other.put(crate::application::session::REDIRECT_AFTER_LOGIN_KEY, "/snippet/create");
        m.commit(&other).await.unwrap();

        login.login(UserId::new());
        let CookieAction::Set(new_id) = m.commit(&login).await.unwrap() else {
            panic!("rotation must set a new cookie");
        };

        let new = m.resolve(Some(&cookie_for(&m, &new_id))).await.unwrap();
        assert_eq!(
            new.get::<String>(crate::application::session::REDIRECT_AFTER_LOGIN_KEY).as_deref(),
            Some("/snippet/create")
        );
    }

    #[tokio::test]
    async fn test_renewal_does_not_revive_logged_out_session() {
        let m = manager();
        let cookie = established(&m).await;

        let setup = m.resolve(Some(&cookie)).await.unwrap();
        setup.login(UserId::new());
        let CookieAction::Set(id) = m.commit(&setup).await.unwrap() else {
            panic!("login must set a new cookie");
        };
        let cookie = cookie_for(&m, &id);

        let renew = m.resolve(Some(&cookie)).await.unwrap();
        let logout = m.resolve(Some(&cookie)).await.unwrap();

        logout.destroy();
        m.commit(&logout).await.unwrap();

        renew.renew_token();
        assert_eq!(m.commit(&renew).await.unwrap(), CookieAction::Clear);
        assert_eq!(m.store().len().await, 0);
    }

    #[tokio::test]
    async fn test_flash_survives_destroy() {
        let m = manager();
        let cookie = established(&m).await;

        let handle = m.resolve(Some(&cookie)).await.unwrap();
        handle.destroy();
        handle.put_flash("You've been logged out successfully!");

        let CookieAction::Set(new_id) = m.commit(&handle).await.unwrap() else {
            panic!("flash must be stored in a new session");
        };
        let next = m.resolve(Some(&cookie_for(&m, &new_id))).await.unwrap();
        assert_eq!(
            next.pop_flash().as_deref(),
            Some("You've been logged out successfully!")
        );
    }
}
