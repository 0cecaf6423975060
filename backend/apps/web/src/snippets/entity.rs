use chrono::{DateTime, Duration, Utc};
use kernel::id::SnippetId;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Snippet {
    pub id: SnippetId,
    pub title: String,
    pub content: String,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

impl Snippet {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires
    }
}

/// Snippet about to be stored
#[derive(Debug, Clone)]
pub struct NewSnippet {
    pub title: String,
    pub content: String,
    /// Lifetime in days
    pub expires_days: i64,
}

impl NewSnippet {
    /// Materialize with a fresh id and timestamps
    pub fn into_snippet(self) -> Snippet {
        let created = Utc::now();
        Snippet {
            id: SnippetId::new(),
            title: self.title,
            content: self.content,
            created,
            expires: created + Duration::days(self.expires_days),
        }
    }
}
