// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Client-facing errors.
//!
//! [`ApiError`] is the only error that reaches clients. Every failure is
//! rendered as the same envelope:
//!
//! ```json
//! { "code": 401, "message": "fail", "data": "not logged in" }
//! ```
//!
//! `code` repeats the HTTP status. `data` is the human-readable detail;
//! internal errors never expose theirs.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use roombook_core::{CacheError, CodeError, PasswordError, SeedError, StoreError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::{RegistryError, SessionError, TokenError};

pub type ApiResult<T> = Result<T, ApiError>;

/// No session on a route that needs one.
pub const NOT_LOGGED_IN: &str = "not logged in";

/// Session token failed verification.
pub const SESSION_INVALID: &str = "session invalid, please log in again";

/// Refresh token rejected.
pub const REFRESH_EXPIRED: &str = "token expired, please log in again";

/// Session lacks a permission the route requires.
pub const INSUFFICIENT_PERMISSIONS: &str = "insufficient permissions";

const INTERNAL_DETAIL: &str = "internal server error";

// =============================================================================
// ApiError
// =============================================================================

/// A request failure and the status it answers with.
///
/// The `Display` form is for logs. Clients see [`detail`](Self::detail).
#[derive(Debug, Error)]
pub enum ApiError {
    /// 404. Holds what was missing, e.g. `"user"`.
    #[error("{0} not found")]
    NotFound(String),

    /// 400.
    #[error("rejected: {0}")]
    BadRequest(String),

    /// 400, one message per failed field.
    #[error("invalid request body: {0}")]
    Validation(ValidationErrors),

    /// 401.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// 403.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// 409.
    #[error("conflict: {0}")]
    Conflict(String),

    /// 500. The message is logged, never sent.
    #[error("internal: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::BadRequest(detail.into())
    }

    pub fn validation(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }

    pub fn unauthenticated(detail: impl Into<String>) -> Self {
        Self::Unauthenticated(detail.into())
    }

    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::Forbidden(detail.into())
    }

    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::Conflict(detail.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The `data` field of the envelope.
    pub fn detail(&self) -> String {
        match self {
            Self::NotFound(what) => format!("{} not found", what),
            Self::Validation(errors) => errors.joined(),
            Self::Internal(_) => INTERNAL_DETAIL.to_string(),
            Self::BadRequest(detail)
            | Self::Unauthenticated(detail)
            | Self::Forbidden(detail)
            | Self::Conflict(detail) => detail.clone(),
        }
    }

    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    pub fn body(&self) -> ErrorEnvelope {
        ErrorEnvelope::new(self.status_code(), self.detail())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if self.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), detail = %self.detail(), "Request rejected");
        }

        (status, Json(self.body())).into_response()
    }
}

// =============================================================================
// ErrorEnvelope
// =============================================================================

/// `{ code, message: "fail", data }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub code: u16,
    pub message: String,
    pub data: String,
}

impl ErrorEnvelope {
    pub fn new(status: StatusCode, data: impl Into<String>) -> Self {
        Self {
            code: status.as_u16(),
            message: "fail".to_string(),
            data: data.into(),
        }
    }
}

// =============================================================================
// ValidationErrors
// =============================================================================

/// Messages collected while checking a request body, in field order.
///
/// Clients get the messages comma-joined, without field names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub fields: Vec<FieldError>,
}

/// One failed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        let field = field.into();
        let message = message.into();
        self.fields.push(FieldError { field, message });
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn joined(&self) -> String {
        let messages: Vec<&str> = self.fields.iter().map(|f| f.message.as_str()).collect();
        messages.join(",")
    }

    /// `Ok(value)` when nothing failed.
    pub fn into_result<T>(self, value: T) -> ApiResult<T> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(ApiError::Validation(self))
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.fields.iter().map(|e| e.field.as_str()).collect();
        write!(f, "{}", names.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

// =============================================================================
// Conversions
// =============================================================================

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Encoding(message) => Self::Internal(message),
            _ => Self::unauthenticated(SESSION_INVALID),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::InvalidCredentials => Self::bad_request("invalid username or password"),
            SessionError::Frozen => Self::forbidden("account is frozen"),
            SessionError::AdminRequired => Self::forbidden("administrator account required"),
            SessionError::Unauthenticated(_) => Self::unauthenticated(REFRESH_EXPIRED),
            SessionError::Store(e) => e.into(),
            SessionError::Signing(e) => Self::internal(e.to_string()),
            SessionError::Password(e) => e.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { message } => Self::Conflict(message),
            StoreError::NotFound { resource } => Self::NotFound(resource),
            StoreError::Backend { message } => Self::Internal(message),
        }
    }
}

impl From<CodeError> for ApiError {
    fn from(err: CodeError) -> Self {
        match err {
            CodeError::Expired => Self::bad_request("verification code has expired"),
            CodeError::Mismatch => Self::bad_request("verification code is incorrect"),
            CodeError::Cache(e) => e.into(),
        }
    }
}

/// Failures with nothing useful to tell the client.
macro_rules! internal_from {
    ($($source:ty),+ $(,)?) => {$(
        impl From<$source> for ApiError {
            fn from(err: $source) -> Self {
                Self::Internal(err.to_string())
            }
        }
    )+};
}

internal_from!(CacheError, PasswordError, SeedError, RegistryError);
