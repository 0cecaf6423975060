//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the "smallest core" of domain vocabulary:
//! - The closed set of domain failures storage may surface ([`error::domain::DomainError`])
//! - The unified outward error type ([`error::app_error::AppError`])
//! - Typed ID wrappers
//! - Form field validation ([`validation::Validator`])
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across all domains.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod domain;
    pub mod kind;
}
pub mod id;
pub mod validation;
