// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # roombook-api
//!
//! HTTP API for the roombook account service.
//!
//! This crate provides the axum server with signed session tokens, a
//! declarative route access registry, and the two gates every routed request
//! passes through:
//!
//! - **Authentication**: public routes pass; everything else needs a valid
//!   access token, which becomes an [`auth::AuthContext`]
//! - **Authorization**: routes that name permissions admit only callers
//!   holding all of them
//!
//! Login and refresh live in [`auth::SessionIssuer`]. Failures reach clients
//! as the envelope described in [`error`].

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod auth;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod server;
pub mod state;

// =============================================================================
// Re-exports
// =============================================================================

pub use auth::{
    AccessRegistry, AccessRule, AuthContext, Claims, Identity, JwtConfig, PermissionSet,
    SessionIssuer, TokenCodec, TokenKind, TokenPair,
};
pub use config::{ApiConfig, CorsConfig, RecordConfig};
pub use error::{ApiError, ApiResult};
pub use server::{access_registry, ApiServer};
pub use state::{AppState, AppStateBuilder};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
