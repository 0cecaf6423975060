//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (random tokens, HMAC signing, constant-time comparison)
//! - Password hashing (Argon2id with a tunable work factor)
//! - Cookie management
//! - Client identification for request logging

pub mod client;
pub mod cookie;
pub mod crypto;
pub mod password;
