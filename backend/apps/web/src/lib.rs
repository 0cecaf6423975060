//! Snippetbox Web Application
//!
//! Snippet pages plus the outer layers of the request pipeline. Sessions,
//! CSRF and authentication come from the `auth` crate.

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod snippets;


pub use app::build_app;
pub use config::WebConfig;
pub use error::{SnippetError, SnippetResult};
