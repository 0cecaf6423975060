//! Snippet Repository Trait

use kernel::id::SnippetId;

use crate::error::SnippetResult;
use crate::snippets::entity::{NewSnippet, Snippet};

/// Snippets on the home page
pub const LATEST_LIMIT: usize = 10;

/// Missing and expired snippets both surface as `DomainError::NoRecord`.
#[trait_variant::make(SnippetRepository: Send)]
pub trait LocalSnippetRepository {
    async fn insert(&self, snippet: &NewSnippet) -> SnippetResult<SnippetId>;

    async fn get(&self, id: &SnippetId) -> SnippetResult<Snippet>;

    /// Most recent unexpired snippets, newest first
    async fn latest(&self, limit: usize) -> SnippetResult<Vec<Snippet>>;
}
