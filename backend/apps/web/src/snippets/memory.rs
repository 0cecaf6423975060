//! In-Memory Snippet Repository

use std::collections::HashMap;
use std::sync::Arc;

use kernel::error::domain::DomainError;
use kernel::id::SnippetId;
use tokio::sync::RwLock;

use crate::error::SnippetResult;
use crate::snippets::entity::{NewSnippet, Snippet};
use crate::snippets::repository::SnippetRepository;

#[derive(Clone, Default)]
pub struct MemorySnippetRepository {
    snippets: Arc<RwLock<HashMap<SnippetId, Snippet>>>,
}

impl MemorySnippetRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnippetRepository for MemorySnippetRepository {
    async fn insert(&self, snippet: &NewSnippet) -> SnippetResult<SnippetId> {
        let snippet = snippet.clone().into_snippet();
        let id = snippet.id;
        self.snippets.write().await.insert(id, snippet);
        Ok(id)
    }

    async fn get(&self, id: &SnippetId) -> SnippetResult<Snippet> {
        self.snippets
            .read()
            .await
            .get(id)
            .filter(|s| !s.is_expired())
            .cloned()
            .ok_or_else(|| DomainError::NoRecord.into())
    }

    async fn latest(&self, limit: usize) -> SnippetResult<Vec<Snippet>> {
        let mut live: Vec<Snippet> = self
            .snippets
            .read()
            .await
            .values()
            .filter(|s| !s.is_expired())
            .cloned()
            .collect();
        live.sort_by(|a, b| b.created.cmp(&a.created));
        live.truncate(limit);
        Ok(live)
    }
}
