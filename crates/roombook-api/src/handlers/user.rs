// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Account handlers: login, refresh, registration, profile and listing.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use roombook_core::{hash_password, seed_demo_data, CodePurpose, NewUser, ProfileUpdate, StoreError};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult, ValidationErrors};
use crate::extractors::{is_email, Auth, ListQuery, Validate, ValidatedJson};
use crate::response::{LoginResponse, UserDetail, UserListResponse};
use crate::state::AppState;

/// Minimum password length for registration and password changes.
pub const MIN_PASSWORD_LEN: usize = 6;

// =============================================================================
// Request bodies
// =============================================================================

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login name.
    #[serde(default)]
    pub username: String,
    /// Password.
    #[serde(default)]
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self, errors: &mut ValidationErrors) {
        if self.username.is_empty() {
            errors.add("username", "username must not be empty");
        }
        if self.password.is_empty() {
            errors.add("password", "password must not be empty");
        }
    }
}

/// Registration request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Login name.
    #[serde(default)]
    pub username: String,
    /// Display name.
    #[serde(default)]
    pub nick_name: String,
    /// Password.
    #[serde(default)]
    pub password: String,
    /// Email address the code was sent to.
    #[serde(default)]
    pub email: String,
    /// Verification code.
    #[serde(default)]
    pub captcha: String,
}

impl Validate for RegisterRequest {
    fn validate(&self, errors: &mut ValidationErrors) {
        if self.username.is_empty() {
            errors.add("username", "username must not be empty");
        }
        if self.nick_name.is_empty() {
            errors.add("nickName", "nickName must not be empty");
        }
        check_password(&self.password, errors);
        check_email(&self.email, errors);
        check_captcha(&self.captcha, errors);
    }
}

/// Password change request body.
#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    /// New password.
    #[serde(default)]
    pub password: String,
    /// Account email address.
    #[serde(default)]
    pub email: String,
    /// Verification code.
    #[serde(default)]
    pub captcha: String,
}

impl Validate for UpdatePasswordRequest {
    fn validate(&self, errors: &mut ValidationErrors) {
        check_password(&self.password, errors);
        check_email(&self.email, errors);
        check_captcha(&self.captcha, errors);
    }
}

/// Profile update request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    /// New avatar URL.
    pub head_pic: Option<String>,
    /// New display name.
    pub nick_name: Option<String>,
    /// Account email address.
    #[serde(default)]
    pub email: String,
    /// Verification code.
    #[serde(default)]
    pub captcha: String,
}

impl Validate for UpdateUserRequest {
    fn validate(&self, errors: &mut ValidationErrors) {
        check_email(&self.email, errors);
        check_captcha(&self.captcha, errors);
    }
}

fn check_password(password: &str, errors: &mut ValidationErrors) {
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            "password",
            format!("password must be at least {} characters", MIN_PASSWORD_LEN),
        );
    }
}

fn check_email(email: &str, errors: &mut ValidationErrors) {
    if email.is_empty() {
        errors.add("email", "email must not be empty");
    } else if !is_email(email) {
        errors.add("email", "email is not a valid address");
    }
}

fn check_captcha(captcha: &str, errors: &mut ValidationErrors) {
    if captcha.is_empty() {
        errors.add("captcha", "captcha must not be empty");
    }
}

// =============================================================================
// Query parameters
// =============================================================================

/// Query for the refresh endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshQuery {
    /// Refresh token. A missing token fails verification like a bad one.
    #[serde(default)]
    pub refresh_token: String,
}

/// Query for the captcha endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct AddressQuery {
    /// Email address to send the code to.
    #[serde(default)]
    pub address: String,
}

/// Query for the freeze endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct FreezeQuery {
    /// Target user ID.
    #[serde(default)]
    pub id: String,
}

// =============================================================================
// Sessions
// =============================================================================

/// POST /user/login
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let session = state
        .sessions()
        .login(&request.username, &request.password, false)
        .await?;
    Ok(Json(session.into()))
}

/// POST /user/admin/login
pub async fn admin_login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let session = state
        .sessions()
        .login(&request.username, &request.password, true)
        .await?;
    Ok(Json(session.into()))
}

/// GET /user/refresh?refreshToken=
pub async fn refresh(
    State(state): State<AppState>,
    Query(query): Query<RefreshQuery>,
) -> ApiResult<impl IntoResponse> {
    let session = state.sessions().refresh(&query.refresh_token, false).await?;
    Ok(Json(session.tokens))
}

/// GET /user/admin/refresh?refreshToken=
pub async fn admin_refresh(
    State(state): State<AppState>,
    Query(query): Query<RefreshQuery>,
) -> ApiResult<impl IntoResponse> {
    let session = state.sessions().refresh(&query.refresh_token, true).await?;
    Ok(Json(session.tokens))
}

// =============================================================================
// Registration
// =============================================================================

/// POST /user/register
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    state
        .codes()
        .redeem(CodePurpose::Register, &request.email, &request.captcha)
        .await?;

    if state
        .store()
        .find_user_by_username(&request.username)
        .await?
        .is_some()
    {
        return Err(ApiError::bad_request("user already exists"));
    }

    let password_hash = hash_password(&request.password)?;
    let new_user = NewUser::new(
        request.username,
        password_hash,
        request.nick_name,
        request.email,
    );

    let user = match state.store().create_user(new_user).await {
        Ok(user) => user,
        // Lost a race with a concurrent registration.
        Err(StoreError::Conflict { .. }) => return Err(ApiError::bad_request("user already exists")),
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = user.id, username = %user.username, "User registered");
    Ok(Json("registered"))
}

/// GET /user/register-captcha?address=
pub async fn register_captcha(
    State(state): State<AppState>,
    Query(query): Query<AddressQuery>,
) -> ApiResult<impl IntoResponse> {
    send_code(&state, CodePurpose::Register, &query.address).await
}

/// GET /user/update_password/captcha?address=
pub async fn update_password_captcha(
    State(state): State<AppState>,
    Query(query): Query<AddressQuery>,
) -> ApiResult<impl IntoResponse> {
    send_code(&state, CodePurpose::UpdatePassword, &query.address).await
}

/// GET /user/update/captcha?address=
pub async fn update_captcha(
    State(state): State<AppState>,
    Query(query): Query<AddressQuery>,
) -> ApiResult<impl IntoResponse> {
    send_code(&state, CodePurpose::UpdateUser, &query.address).await
}

async fn send_code(state: &AppState, purpose: CodePurpose, address: &str) -> ApiResult<Json<&'static str>> {
    if !is_email(address) {
        return Err(ApiError::bad_request("address is not a valid email"));
    }

    state.codes().issue(purpose, address).await?;
    Ok(Json("sent"))
}

// =============================================================================
// Account updates
// =============================================================================

/// POST /user/update_password and /user/admin/update_password
///
/// Changes the caller's password. The code must have been sent to the
/// account's own email address.
pub async fn update_password(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    ValidatedJson(request): ValidatedJson<UpdatePasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .store()
        .find_user_by_id(ctx.user_id(), false)
        .await?
        .ok_or_else(|| ApiError::not_found("user"))?;

    if user.email != request.email {
        return Err(ApiError::bad_request("email does not match account"));
    }

    state
        .codes()
        .redeem(CodePurpose::UpdatePassword, &request.email, &request.captcha)
        .await?;

    let password_hash = hash_password(&request.password)?;
    state.store().update_password(user.id, &password_hash).await?;

    tracing::info!(user_id = user.id, "Password updated");
    Ok(Json("password updated"))
}

/// POST /user/update and /user/admin/update
pub async fn update(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .store()
        .find_user_by_id(ctx.user_id(), false)
        .await?
        .ok_or_else(|| ApiError::not_found("user"))?;

    if user.email != request.email {
        return Err(ApiError::bad_request("email does not match account"));
    }

    state
        .codes()
        .redeem(CodePurpose::UpdateUser, &request.email, &request.captcha)
        .await?;

    let update = ProfileUpdate {
        nick_name: request.nick_name.filter(|s| !s.is_empty()),
        head_pic: request.head_pic.filter(|s| !s.is_empty()),
    };
    if !update.is_empty() {
        state.store().update_profile(user.id, update).await?;
    }

    Ok(Json("profile updated"))
}

// =============================================================================
// Queries and administration
// =============================================================================

/// GET /user/info
pub async fn info(State(state): State<AppState>, Auth(ctx): Auth) -> ApiResult<Json<UserDetail>> {
    let user = state
        .store()
        .find_user_by_id(ctx.user_id(), false)
        .await?
        .ok_or_else(|| ApiError::not_found("user"))?;

    Ok(Json(UserDetail::from(&user)))
}

/// GET /user/freeze?id=
pub async fn freeze(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    Query(query): Query<FreezeQuery>,
) -> ApiResult<impl IntoResponse> {
    let id = query
        .id
        .trim()
        .parse()
        .map_err(|_| ApiError::bad_request("id must be a number"))?;

    state.store().freeze_user(id).await?;

    tracing::info!(user_id = id, by = ctx.user_id(), "User frozen");
    Ok(Json(true))
}

/// GET /user/list
pub async fn list(
    State(state): State<AppState>,
    query: ListQuery,
) -> ApiResult<Json<UserListResponse>> {
    let page = state
        .store()
        .list_users(&query.filter, query.index, query.size)
        .await?;

    Ok(Json(page.into()))
}

/// GET /user/init-data
pub async fn init_data(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let report = seed_demo_data(state.store()).await?;

    tracing::info!(
        roles = report.roles,
        created = report.users_created,
        skipped = report.users_skipped,
        "Demo data seeded"
    );
    Ok(Json("done"))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn register_request() -> RegisterRequest {
        RegisterRequest {
            username: "wangwu".to_string(),
            nick_name: "Wang".to_string(),
            password: "123456".to_string(),
            email: "wangwu@example.com".to_string(),
            captcha: "123456".to_string(),
        }
    }

    fn errors_of(value: &impl Validate) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        value.validate(&mut errors);
        errors
    }

    #[test]
    fn test_register_valid() {
        assert!(errors_of(&register_request()).is_empty());
    }

    #[test]
    fn test_register_collects_all_errors() {
        let request = RegisterRequest {
            username: String::new(),
            nick_name: String::new(),
            password: "123".to_string(),
            email: "not-an-email".to_string(),
            captcha: String::new(),
        };

        let errors = errors_of(&request);
        assert_eq!(errors.fields.len(), 5);
        assert_eq!(
            errors.joined(),
            "username must not be empty,nickName must not be empty,\
             password must be at least 6 characters,email is not a valid address,\
             captcha must not be empty"
        );
    }

    #[test]
    fn test_update_user_needs_email_and_captcha() {
        let request = UpdateUserRequest {
            head_pic: None,
            nick_name: Some("New".to_string()),
            email: String::new(),
            captcha: String::new(),
        };

        let errors = errors_of(&request);
        let fields: Vec<_> = errors.fields.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, vec!["email", "captcha"]);
    }

    #[test]
    fn test_update_password_length() {
        let request = UpdatePasswordRequest {
            password: "12345".to_string(),
            email: "a@example.com".to_string(),
            captcha: "000000".to_string(),
        };
        assert_eq!(errors_of(&request).fields.len(), 1);
    }

    #[test]
    fn test_login_body_defaults() {
        let request: LoginRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(errors_of(&request).fields.len(), 2);
    }
}
