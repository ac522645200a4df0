// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication and authorization module.
//!
//! This module provides:
//! - Session token signing and verification
//! - Token claims and caller identity
//! - Permission sets
//! - The route access registry
//! - Session issuing (login and refresh)

mod claims;
mod context;
mod jwt;
pub mod permission;
mod registry;
mod session;

pub use claims::{Claims, Identity, TokenKind};
pub use context::AuthContext;
pub use jwt::{JwtConfig, TokenCodec, TokenError, TokenPair};
pub use permission::PermissionSet;
pub use registry::{
    AccessRegistry, AccessRegistryBuilder, AccessRequirement, AccessRule, RegistryError,
    RouteAccess,
};
pub use session::{Session, SessionError, SessionIssuer};
