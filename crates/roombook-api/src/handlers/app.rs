// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Root controller handlers.

use axum::{response::IntoResponse, Json};

/// GET /
pub async fn hello() -> impl IntoResponse {
    Json("Hello World!")
}

/// GET /aaa
///
/// Requires login and the `ddd` permission.
pub async fn aaa() -> impl IntoResponse {
    Json("aaa")
}

/// GET /bbb
pub async fn bbb() -> impl IntoResponse {
    Json("bbb")
}
