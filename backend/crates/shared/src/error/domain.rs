//! Domain Error - the closed set of expected storage outcomes
//!
//! Storage-facing components translate backend failures into exactly one of
//! these kinds, or propagate an opaque fault when none applies.

use thiserror::Error;

use super::kind::ErrorKind;

/// Expected, recoverable failure kinds surfaced by storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Lookup found nothing
    #[error("no matching record found")]
    NoRecord,

    /// Authentication failed (unknown email, wrong password, or unusable stored hash)
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Uniqueness violation on the email column
    #[error("duplicate email")]
    DuplicateEmail,
}

impl DomainError {
    /// Outward classification used when the immediate caller does not handle it
    pub const fn kind(&self) -> ErrorKind {
        match self {
            DomainError::NoRecord => ErrorKind::NotFound,
            DomainError::InvalidCredentials => ErrorKind::Unauthorized,
            DomainError::DuplicateEmail => ErrorKind::Conflict,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_error_kinds() {
        assert_eq!(DomainError::NoRecord.kind(), ErrorKind::NotFound);
        assert_eq!(DomainError::InvalidCredentials.kind(), ErrorKind::Unauthorized);
        assert_eq!(DomainError::DuplicateEmail.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_invalid_credentials_message_is_cause_free() {
        // The same text is rendered for unknown email and wrong password
        assert_eq!(DomainError::InvalidCredentials.to_string(), "invalid credentials");
    }
}
