//! Session Handle
//!
//! Request-scoped view of one session. Reads see the request's own writes;
//! every write is also recorded so it can be replayed onto the freshest
//! stored copy when the request commits.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::entity::session::{Mutation, SessionData, SessionRecord};
use crate::domain::value_object::{csrf_token::CsrfToken, session_id::SessionId};

/// One-shot message shown on the next rendered page
pub const FLASH_KEY: &str = "flash";
/// Path a visitor was bounced from by the authentication gate
pub const REDIRECT_AFTER_LOGIN_KEY: &str = "redirect_after_login";

/// Lifecycle change requested during the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transition {
    None,
    Rotate,
    Destroy,
}

#[derive(Debug)]
struct HandleState {
    /// Id and version as loaded; `None` for a session created this request
    original: Option<(SessionId, i64)>,
    id: SessionId,
    data: SessionData,
    expires_at: DateTime<Utc>,
    log: Vec<Mutation>,
    transition: Transition,
    token_exposed: bool,
}

/// Everything the commit step needs, copied out of the handle
#[derive(Debug, Clone)]
pub(crate) struct Snapshot {
    pub original: Option<(SessionId, i64)>,
    pub id: SessionId,
    pub data: SessionData,
    pub expires_at: DateTime<Utc>,
    pub log: Vec<Mutation>,
    pub transition: Transition,
    pub token_exposed: bool,
}

impl Snapshot {
    /// Whether a session created during this request must be stored
    pub fn needs_insert(&self) -> bool {
        !self.log.is_empty() || self.token_exposed
    }
}

/// Shared handle placed in request extensions by the session layer
#[derive(Debug, Clone)]
pub struct SessionHandle {
    state: Arc<Mutex<HandleState>>,
}

impl SessionHandle {
    pub(crate) fn loaded(record: SessionRecord) -> Self {
        Self::from_state(HandleState {
            original: Some((record.id.clone(), record.version)),
            id: record.id,
            data: record.data,
            expires_at: record.expires_at,
            log: Vec::new(),
            transition: Transition::None,
            token_exposed: false,
        })
    }

    pub(crate) fn fresh(ttl: chrono::Duration) -> Self {
        Self::from_state(HandleState {
            original: None,
            id: SessionId::generate(),
            data: SessionData::anonymous(),
            expires_at: Utc::now() + ttl,
            log: Vec::new(),
            transition: Transition::None,
            token_exposed: false,
        })
    }

    fn from_state(state: HandleState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HandleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, mutation: Mutation) {
        let mut state = self.lock();
        state.data.apply(&mutation);
        state.log.push(mutation);
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        let state = self.lock();
        Snapshot {
            original: state.original.clone(),
            id: state.id.clone(),
            data: state.data.clone(),
            expires_at: state.expires_at,
            log: state.log.clone(),
            transition: state.transition,
            token_exposed: state.token_exposed,
        }
    }

    /// Token to embed in rendered forms
    pub fn csrf_token(&self) -> String {
        let mut state = self.lock();
        state.token_exposed = true;
        state.data.csrf_token.as_str().to_string()
    }

    /// Token, but only when the session is stored regardless of this read
    ///
    /// Pages without a form use this so an anonymous visit that changes
    /// nothing leaves no session behind.
    pub fn stored_csrf_token(&self) -> Option<String> {
        let mut state = self.lock();
        let persisted = state.original.is_some() && state.transition != Transition::Destroy;
        if !(persisted || state.token_exposed || !state.log.is_empty()) {
            return None;
        }
        state.token_exposed = true;
        Some(state.data.csrf_token.as_str().to_string())
    }

    /// Compare a submitted token without exposing the stored one
    pub fn csrf_matches(&self, submitted: &str) -> bool {
        self.lock().data.csrf_token.matches(submitted)
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.lock().data.user_id
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.lock().data.values.get(key).cloned()?;
        serde_json::from_value(value).ok()
    }

    pub fn put(&self, key: &str, value: impl Into<Value>) {
        self.record(Mutation::Put(key.to_string(), value.into()));
    }

    pub fn remove(&self, key: &str) {
        if self.lock().data.values.contains_key(key) {
            self.record(Mutation::Remove(key.to_string()));
        }
    }

    /// Read a string value and remove it
    pub fn pop_string(&self, key: &str) -> Option<String> {
        let value = self.get::<String>(key)?;
        self.remove(key);
        Some(value)
    }

    pub fn put_flash(&self, message: impl Into<String>) {
        self.put(FLASH_KEY, message.into());
    }

    pub fn pop_flash(&self) -> Option<String> {
        self.pop_string(FLASH_KEY)
    }

    /// Issue a new session id and CSRF token, keeping the data
    ///
    /// The previous id stops working once the request commits.
    pub fn renew_token(&self) {
        let mut state = self.lock();
        state.id = SessionId::generate();
        state.data.csrf_token = CsrfToken::generate();
        if state.original.is_some() && state.transition == Transition::None {
            state.transition = Transition::Rotate;
        }
    }

    /// Rotate and bind the session to `user_id`
    pub fn login(&self, user_id: UserId) {
        self.renew_token();
        self.record(Mutation::BindUser(user_id));
    }

    /// Drop the stored session and continue with an empty anonymous one
    ///
    /// Calling it again is harmless.
    pub fn destroy(&self) {
        let mut state = self.lock();
        state.id = SessionId::generate();
        state.data = SessionData::anonymous();
        state.log.clear();
        state.token_exposed = false;
        state.transition = Transition::Destroy;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded() -> SessionHandle {
        SessionHandle::loaded(SessionRecord::new(
            SessionData::anonymous(),
            chrono::Duration::hours(1),
        ))
    }

    #[test]
    fn test_reads_see_own_writes() {
        let handle = loaded();
        handle.put("count", 3);
        assert_eq!(handle.get::<i64>("count"), Some(3));
        assert_eq!(handle.snapshot().log.len(), 1);
    }

    #[test]
    fn test_flash_is_one_shot() {
        let handle = loaded();
        handle.put_flash("Saved");
        assert_eq!(handle.pop_flash().as_deref(), Some("Saved"));
        assert_eq!(handle.pop_flash(), None);
    }

    #[test]
    fn test_remove_missing_key_is_not_logged() {
        let handle = loaded();
        handle.remove("nothing");
        assert!(handle.snapshot().log.is_empty());
    }

    #[test]
    fn test_login_rotates_id_and_token() {
        let handle = loaded();
        let before = handle.snapshot();
        let token_before = handle.csrf_token();
        let user = UserId::new();

        handle.login(user);

        let after = handle.snapshot();
        assert_ne!(after.id, before.id);
        assert_ne!(handle.csrf_token(), token_before);
        assert_eq!(after.transition, Transition::Rotate);
        assert_eq!(handle.user_id(), Some(user));
        assert!(after.log.contains(&Mutation::BindUser(user)));
    }

    #[test]
    fn test_renew_on_fresh_session_needs_no_rotation() {
        let handle = SessionHandle::fresh(chrono::Duration::hours(1));
        handle.renew_token();
        assert_eq!(handle.snapshot().transition, Transition::None);
    }

    #[test]
    fn test_destroy_twice() {
        let handle = loaded();
        handle.login(UserId::new());
        handle.destroy();
        handle.destroy();

        let snap = handle.snapshot();
        assert_eq!(snap.transition, Transition::Destroy);
        assert!(snap.log.is_empty());
        assert_eq!(handle.user_id(), None);
        assert!(snap.original.is_some());
    }

    #[test]
    fn test_writes_after_destroy_target_new_session() {
        let handle = loaded();
        handle.destroy();
        handle.put_flash("bye");

        let snap = handle.snapshot();
        assert!(snap.needs_insert());
        assert_eq!(snap.data.values.get(FLASH_KEY), Some(&Value::from("bye")));
    }

    #[test]
    fn test_stored_token_only_for_kept_sessions() {
        let fresh = SessionHandle::fresh(chrono::Duration::hours(1));
        assert_eq!(fresh.stored_csrf_token(), None);
        assert!(!fresh.snapshot().needs_insert());

        fresh.put_flash("hello");
        assert_eq!(fresh.stored_csrf_token(), Some(fresh.csrf_token()));

        let existing = loaded();
        assert!(existing.stored_csrf_token().is_some());

        existing.destroy();
        assert_eq!(existing.stored_csrf_token(), None);
    }

    #[test]
    fn test_csrf_exposure_is_tracked() {
        let handle = SessionHandle::fresh(chrono::Duration::hours(1));
        assert!(!handle.snapshot().needs_insert());
        let token = handle.csrf_token();
        assert!(handle.snapshot().needs_insert());
        assert!(handle.csrf_matches(&token));
        assert!(!handle.csrf_matches("forged"));
    }
}
