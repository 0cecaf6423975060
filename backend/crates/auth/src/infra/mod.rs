//! Infrastructure Layer
//!
//! Store implementations: PostgreSQL for deployments, in-memory for tests
//! and database-less development runs.

pub mod memory;
pub mod postgres;

pub use memory::{MemorySessionStore, MemoryUserRepository};
pub use postgres::{PgSessionStore, PgUserRepository};
