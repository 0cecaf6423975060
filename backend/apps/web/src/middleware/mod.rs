//! Outer Pipeline Middleware
//!
//! Panic recovery, request logging and the common response headers. The
//! session, CSRF and authentication layers live in the `auth` crate.

pub mod headers;
pub mod logging;
pub mod recover;
