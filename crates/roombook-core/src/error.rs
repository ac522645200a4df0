// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for the account collaborators.
//!
//! Each collaborator reports its own failure type:
//!
//! ```text
//! StoreError     - user/role storage
//! CacheError     - short-lived code cache
//! MailError      - outbound mail
//! PasswordError  - hashing and hash parsing
//! CodeError      - verification-code exchange
//! SeedError      - demo data seeding
//! ```

use thiserror::Error;

/// Result type alias for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

// =============================================================================
// StoreError
// =============================================================================

/// Errors raised by a [`UserStore`](crate::UserStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record with the same unique key already exists.
    #[error("Conflict: {message}")]
    Conflict {
        /// Description of the conflicting record.
        message: String,
    },

    /// The referenced record does not exist.
    #[error("Not found: {resource}")]
    NotFound {
        /// The resource that was not found.
        resource: String,
    },

    /// The backing store failed.
    #[error("Storage backend error: {message}")]
    Backend {
        /// Error message.
        message: String,
    },
}

impl StoreError {
    /// Creates a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Creates a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

// =============================================================================
// CacheError
// =============================================================================

/// Errors raised by a [`CodeCache`](crate::CodeCache).
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache backend failed.
    #[error("Cache backend error: {0}")]
    Backend(String),
}

// =============================================================================
// MailError
// =============================================================================

/// Errors raised by a [`MailSender`](crate::MailSender).
#[derive(Debug, Error)]
pub enum MailError {
    /// The message could not be handed to the transport.
    #[error("Mail transport error: {0}")]
    Transport(String),
}

// =============================================================================
// PasswordError
// =============================================================================

/// Errors raised while hashing or verifying passwords.
#[derive(Debug, Error)]
pub enum PasswordError {
    /// Hashing failed.
    #[error("Password hashing failed: {0}")]
    Hash(String),

    /// The stored hash is not a valid PHC string.
    #[error("Invalid password hash: {0}")]
    InvalidHash(String),
}

// =============================================================================
// CodeError
// =============================================================================

/// Errors raised by the verification-code exchange.
#[derive(Debug, Error)]
pub enum CodeError {
    /// No code is stored for the address, or it has expired.
    #[error("Verification code has expired")]
    Expired,

    /// A code is stored but does not match.
    #[error("Verification code is incorrect")]
    Mismatch,

    /// The cache failed.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

// =============================================================================
// SeedError
// =============================================================================

/// Errors raised while seeding demo data.
#[derive(Debug, Error)]
pub enum SeedError {
    /// The store rejected a write.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A demo password could not be hashed.
    #[error(transparent)]
    Password(#[from] PasswordError),
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_messages() {
        assert_eq!(
            StoreError::conflict("username alice").to_string(),
            "Conflict: username alice"
        );
        assert_eq!(
            StoreError::not_found("user 7").to_string(),
            "Not found: user 7"
        );
    }

    #[test]
    fn test_code_error_from_cache() {
        let err: CodeError = CacheError::Backend("down".to_string()).into();
        assert!(matches!(err, CodeError::Cache(_)));
        assert_eq!(err.to_string(), "Cache backend error: down");
    }
}
