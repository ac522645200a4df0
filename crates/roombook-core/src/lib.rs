// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # roombook-core
//!
//! Domain types and collaborator contracts for the roombook account service.
//!
//! This crate holds everything the HTTP layer depends on but does not own:
//!
//! - **Types**: `User`, `Role`, `Permission`, listing filters and pages
//! - **Store**: the `UserStore` contract and an in-memory implementation
//! - **Cache**: the `CodeCache` contract (key/value with TTL)
//! - **Mail**: the `MailSender` contract
//! - **Password**: Argon2id hashing
//! - **Captcha**: the verification-code exchange used by registration and
//!   account updates
//! - **Seed**: demo roles, permissions and users
//!
//! ## Example
//!
//! ```rust,ignore
//! use roombook_core::{MemoryUserStore, NewUser, UserStore};
//!
//! let store = MemoryUserStore::new();
//! let user = store.create_user(NewUser::new("alice", hash, "Alice", "alice@example.com")).await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod cache;
pub mod captcha;
pub mod error;
pub mod mail;
pub mod password;
pub mod seed;
pub mod store;
pub mod types;

// =============================================================================
// Re-exports
// =============================================================================

pub use cache::{CodeCache, MemoryCodeCache};
pub use captcha::{CaptchaConfig, CodePurpose, VerificationCodes};
pub use error::{
    CacheError, CacheResult, CodeError, MailError, PasswordError, SeedError, StoreError,
    StoreResult,
};
pub use mail::{LogMailSender, MailMessage, MailSender, MemoryMailSender};
pub use password::{hash_password, verify_password, verify_unknown_account};
pub use seed::{seed_demo_data, SeedReport};
pub use store::{MemoryUserStore, UserStore};
pub use types::{
    NewUser, Page, Permission, ProfileUpdate, Role, User, UserFilter, UserId,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
