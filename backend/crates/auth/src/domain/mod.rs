//! Domain Layer
//!
//! Contains entities, value objects, and repository traits.

pub mod entity;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{
    session::{Mutation, SessionData, SessionRecord},
    user::{Credential, NewUser, User},
};
pub use repository::{SessionStore, UserRepository};
