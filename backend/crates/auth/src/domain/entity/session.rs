//! Session Entity
//!
//! Server-side session state keyed by an opaque identifier. Each stored
//! record carries a version; writers replace a record only when the version
//! they read is still current.

use chrono::{DateTime, Duration, Utc};
use kernel::id::UserId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::domain::value_object::{csrf_token::CsrfToken, session_id::SessionId};

/// Session payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    /// Present when the session belongs to a signed-in user
    pub user_id: Option<UserId>,
    pub csrf_token: CsrfToken,
    #[serde(default)]
    pub values: BTreeMap<String, Value>,
}

impl SessionData {
    pub fn anonymous() -> Self {
        Self {
            user_id: None,
            csrf_token: CsrfToken::generate(),
            values: BTreeMap::new(),
        }
    }

    pub fn apply(&mut self, mutation: &Mutation) {
        match mutation {
            Mutation::Put(key, value) => {
                self.values.insert(key.clone(), value.clone());
            }
            Mutation::Remove(key) => {
                self.values.remove(key);
            }
            Mutation::BindUser(user_id) => self.user_id = Some(*user_id),
        }
    }
}

/// One change made to a session during a request
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Put(String, Value),
    Remove(String),
    BindUser(UserId),
}

/// Stored session
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub id: SessionId,
    pub data: SessionData,
    pub expires_at: DateTime<Utc>,
    pub version: i64,
}

impl SessionRecord {
    /// Fresh record with a new id, version 0
    pub fn new(data: SessionData, ttl: Duration) -> Self {
        Self {
            id: SessionId::generate(),
            data,
            expires_at: Utc::now() + ttl,
            version: 0,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Copy of this record at the next version
    pub fn next_version(&self, data: SessionData) -> Self {
        Self {
            id: self.id.clone(),
            data,
            expires_at: self.expires_at,
            version: self.version + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_mutations_in_order() {
        let mut data = SessionData::anonymous();
        let user = UserId::new();

        for m in [
            Mutation::Put("flash".to_string(), Value::from("saved")),
            Mutation::Put("flash".to_string(), Value::from("replaced")),
            Mutation::BindUser(user),
            Mutation::Put("other".to_string(), Value::from(1)),
            Mutation::Remove("other".to_string()),
        ] {
            data.apply(&m);
        }

        assert_eq!(data.values.get("flash"), Some(&Value::from("replaced")));
        assert!(!data.values.contains_key("other"));
        assert_eq!(data.user_id, Some(user));
    }

    #[test]
    fn test_expiry_and_version() {
        let record = SessionRecord::new(SessionData::anonymous(), Duration::hours(12));
        assert!(!record.is_expired());
        assert_eq!(record.version, 0);

        let next = record.next_version(record.data.clone());
        assert_eq!(next.version, 1);
        assert_eq!(next.id, record.id);

        let stale = SessionRecord::new(SessionData::anonymous(), Duration::seconds(-1));
        assert!(stale.is_expired());
    }

    #[test]
    fn test_data_serde_roundtrip_keeps_user() {
        let mut data = SessionData::anonymous();
        data.apply(&Mutation::BindUser(UserId::new()));
        let json = serde_json::to_value(&data).unwrap();
        let back: SessionData = serde_json::from_value(json).unwrap();
        assert_eq!(back, data);
    }
}
