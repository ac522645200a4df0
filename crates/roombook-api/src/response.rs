// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API response types.
//!
//! Successful responses are plain JSON bodies; only failures use the
//! envelope from [`crate::error`].

use chrono::{DateTime, Utc};
use roombook_core::{Page, User, UserId};
use serde::{Deserialize, Serialize};

use crate::auth::{Session, TokenPair};

// =============================================================================
// Login
// =============================================================================

/// The user part of a login response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    /// User ID.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Display name.
    pub nick_name: String,
    /// Email address.
    pub email: String,
    /// Avatar URL.
    pub head_pic: Option<String>,
    /// Phone number.
    pub phone_number: Option<String>,
    /// Whether the account is frozen.
    pub is_frozen: bool,
    /// Whether the account is an administrator.
    pub is_admin: bool,
    /// Creation time.
    pub create_time: DateTime<Utc>,
    /// Role names.
    pub roles: Vec<String>,
    /// Permission codes across all roles.
    pub permissions: Vec<String>,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            nick_name: user.nick_name.clone(),
            email: user.email.clone(),
            head_pic: user.head_pic.clone(),
            phone_number: user.phone_number.clone(),
            is_frozen: user.is_frozen,
            is_admin: user.is_admin,
            create_time: user.create_time,
            roles: user.role_names(),
            permissions: user.permission_codes().into_iter().collect(),
        }
    }
}

/// Response body for a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// The logged-in user.
    pub user_info: UserInfo,
    /// Access token.
    pub access_token: String,
    /// Refresh token.
    pub refresh_token: String,
}

impl From<Session> for LoginResponse {
    fn from(session: Session) -> Self {
        let TokenPair {
            access_token,
            refresh_token,
        } = session.tokens;

        Self {
            user_info: UserInfo::from(&session.user),
            access_token,
            refresh_token,
        }
    }
}

// =============================================================================
// User detail
// =============================================================================

/// Profile of the calling user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetail {
    /// User ID.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Display name.
    pub nick_name: String,
    /// Email address.
    pub email: String,
    /// Avatar URL.
    pub head_pic: Option<String>,
    /// Phone number.
    pub phone_number: Option<String>,
    /// Whether the account is frozen.
    pub is_frozen: bool,
    /// Creation time.
    pub create_time: DateTime<Utc>,
}

impl From<&User> for UserDetail {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            nick_name: user.nick_name.clone(),
            email: user.email.clone(),
            head_pic: user.head_pic.clone(),
            phone_number: user.phone_number.clone(),
            is_frozen: user.is_frozen,
            create_time: user.create_time,
        }
    }
}

// =============================================================================
// User list
// =============================================================================

/// One page of the user listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListResponse {
    /// Users on this page.
    pub users: Vec<UserDetail>,
    /// Total number of matching users.
    pub total_count: u64,
}

impl From<Page<User>> for UserListResponse {
    fn from(page: Page<User>) -> Self {
        Self {
            users: page.items.iter().map(UserDetail::from).collect(),
            total_count: page.total,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
