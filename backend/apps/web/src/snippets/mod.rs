//! Snippets
//!
//! Text snippets with a fixed lifetime: entity, storage and handlers.

pub mod dto;
pub mod entity;
pub mod handlers;
pub mod memory;
pub mod postgres;
pub mod repository;
pub mod router;

pub use entity::{NewSnippet, Snippet};
pub use memory::MemorySnippetRepository;
pub use postgres::PgSnippetRepository;
pub use repository::SnippetRepository;
pub use router::snippet_router;
