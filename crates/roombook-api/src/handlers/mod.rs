// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API handlers for all endpoints.
//!
//! - [`app`]: root demo endpoints
//! - [`user`]: account endpoints under `/user`
//!
//! Handlers never check access themselves; the gates in
//! [`crate::middleware`] have already run when a handler is called.

pub mod app;
pub mod user;

use crate::error::ApiError;

/// Fallback for unknown routes.
pub async fn not_found() -> ApiError {
    ApiError::not_found("route")
}
