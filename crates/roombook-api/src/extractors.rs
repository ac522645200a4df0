// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Handler extractors: the session attached by the gate, checked JSON
//! bodies and the paging query of `/user/list`.

use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
    Json,
};
use roombook_core::UserFilter;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::auth::AuthContext;
use crate::error::{ApiError, ValidationErrors, NOT_LOGGED_IN};

// =============================================================================
// Auth Extractor
// =============================================================================

/// Extractor for authenticated requests.
///
/// Extracts the `AuthContext` attached by the authentication gate. Returns
/// 401 if there is none, which only happens on a route that was declared
/// public.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(Auth(ctx): Auth) -> impl IntoResponse {
///     format!("Hello, {}", ctx.username())
/// }
/// ```
pub struct Auth(pub AuthContext);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(Auth)
            .ok_or_else(|| ApiError::unauthenticated(NOT_LOGGED_IN))
    }
}

// =============================================================================
// Validated JSON Extractor
// =============================================================================

/// Request bodies that check their own fields.
pub trait Validate {
    /// Records every problem with the value into `errors`.
    fn validate(&self, errors: &mut ValidationErrors);
}

/// Extractor for validated JSON payloads.
///
/// Malformed JSON is a 400; a well-formed body that fails [`Validate`] is a
/// 400 listing every failed field.
pub struct ValidatedJson<T>(pub T);

impl<S, T> axum::extract::FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(
        req: axum::http::Request<axum::body::Body>,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON: {}", e.body_text())))?;

        let mut errors = ValidationErrors::new();
        value.validate(&mut errors);
        errors.into_result(ValidatedJson(value))
    }
}

/// Returns `true` if `value` looks like an email address.
pub fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

// =============================================================================
// List Query Extractor
// =============================================================================

/// Default page index for listings.
pub const DEFAULT_PAGE_INDEX: u32 = 1;

/// Default page size for listings.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Raw listing query as sent by clients.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQueryParams {
    /// 1-based page index.
    pub index: Option<String>,
    /// Page size.
    pub size: Option<String>,
    /// Username fragment.
    pub username: Option<String>,
    /// Nickname fragment.
    pub nick_name: Option<String>,
    /// Email fragment.
    pub email: Option<String>,
}

impl ListQueryParams {
    /// Parses paging numbers and builds the filter.
    pub fn parse(self) -> Result<ListQuery, ApiError> {
        Ok(ListQuery {
            index: parse_page_number("index", self.index.as_deref(), DEFAULT_PAGE_INDEX)?,
            size: parse_page_number("size", self.size.as_deref(), DEFAULT_PAGE_SIZE)?,
            filter: UserFilter {
                username: self.username,
                nick_name: self.nick_name,
                email: self.email,
            },
        })
    }
}

fn parse_page_number(name: &str, raw: Option<&str>, default: u32) -> Result<u32, ApiError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(default),
        Some(raw) => raw,
    };

    let value: u32 = raw
        .parse()
        .map_err(|_| ApiError::bad_request(format!("{} must be a number", name)))?;

    if value == 0 {
        return Err(ApiError::bad_request(format!("{} must be greater than 0", name)));
    }
    Ok(value)
}

/// A parsed listing query.
#[derive(Debug, Clone)]
pub struct ListQuery {
    /// 1-based page index.
    pub index: u32,
    /// Page size.
    pub size: u32,
    /// Substring filters.
    pub filter: UserFilter,
}

impl<S> FromRequestParts<S> for ListQuery
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<ListQueryParams>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid query: {}", e.body_text())))?;

        params.parse()
    }
}

// =============================================================================
// Tests
// =============================================================================
