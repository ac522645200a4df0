// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Middleware implementations for the API server.
//!
//! Routed requests pass through three stages in order:
//!
//! - [`AuthLayer`]: resolves the route's access requirement and verifies the
//!   bearer token
//! - [`RbacLayer`]: checks required permissions
//! - [`RecordLayer`]: logs admitted requests
//!
//! The first two stages are also available as plain functions
//! ([`authenticate`], [`authorize`]) so they can be tested without a router.

mod auth;
mod rbac;
mod record;

pub use auth::{authenticate, AuthLayer, AuthMiddleware};
pub use rbac::{authorize, RbacLayer, RbacMiddleware};
pub use record::{RecordLayer, RecordMiddleware};
