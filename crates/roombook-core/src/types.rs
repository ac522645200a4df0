// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Core account types.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Numeric user identifier.
pub type UserId = i64;

// =============================================================================
// Permission
// =============================================================================

/// A named capability.
///
/// Permission codes are the atoms compared during authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    /// Storage identifier.
    pub id: i64,
    /// Capability code, e.g. `"ddd"`.
    pub code: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
}

// =============================================================================
// Role
// =============================================================================

/// A named bundle of permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    /// Storage identifier.
    pub id: i64,
    /// Role name.
    pub name: String,
    /// Permissions granted by this role.
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl Role {
    /// Returns the permission codes of this role.
    pub fn permission_codes(&self) -> impl Iterator<Item = &str> {
        self.permissions.iter().map(|p| p.code.as_str())
    }
}

// =============================================================================
// User
// =============================================================================

/// A stored user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User ID.
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    /// Argon2 PHC hash of the password.
    #[serde(default, skip_serializing)]
    pub password_hash: String,
    /// Display name.
    pub nick_name: String,
    /// Email address.
    pub email: String,
    /// Avatar URL.
    pub head_pic: Option<String>,
    /// Phone number.
    pub phone_number: Option<String>,
    /// Frozen accounts cannot log in.
    pub is_frozen: bool,
    /// Administrator flag.
    pub is_admin: bool,
    /// Creation time.
    pub create_time: DateTime<Utc>,
    /// Last update time.
    pub update_time: DateTime<Utc>,
    /// Assigned roles.
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl User {
    /// Returns the names of the assigned roles.
    pub fn role_names(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.name.clone()).collect()
    }

    /// Returns the union of permission codes across all assigned roles.
    pub fn permission_codes(&self) -> BTreeSet<String> {
        self.roles
            .iter()
            .flat_map(|r| r.permission_codes())
            .map(str::to_string)
            .collect()
    }
}

// =============================================================================
// NewUser
// =============================================================================

/// Data required to create a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Unique login name.
    pub username: String,
    /// Argon2 PHC hash of the password.
    pub password_hash: String,
    /// Display name.
    pub nick_name: String,
    /// Email address.
    pub email: String,
    /// Phone number.
    pub phone_number: Option<String>,
    /// Administrator flag.
    pub is_admin: bool,
}

impl NewUser {
    /// Creates a regular (non-admin) user.
    pub fn new(
        username: impl Into<String>,
        password_hash: impl Into<String>,
        nick_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
            nick_name: nick_name.into(),
            email: email.into(),
            phone_number: None,
            is_admin: false,
        }
    }

    /// Marks the user as an administrator.
    pub fn admin(mut self) -> Self {
        self.is_admin = true;
        self
    }

    /// Sets the phone number.
    pub fn with_phone_number(mut self, phone_number: impl Into<String>) -> Self {
        self.phone_number = Some(phone_number.into());
        self
    }
}

// =============================================================================
// ProfileUpdate
// =============================================================================

/// Partial profile update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    /// New display name.
    pub nick_name: Option<String>,
    /// New avatar URL.
    pub head_pic: Option<String>,
}

impl ProfileUpdate {
    /// Returns `true` if nothing would change.
    pub fn is_empty(&self) -> bool {
        self.nick_name.is_none() && self.head_pic.is_none()
    }
}

// =============================================================================
// Listing
// =============================================================================

/// Substring filters for user listing. Empty filters match everything.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Username fragment.
    pub username: Option<String>,
    /// Nickname fragment.
    pub nick_name: Option<String>,
    /// Email fragment.
    pub email: Option<String>,
}

impl UserFilter {
    /// Returns `true` if the user matches every non-empty filter.
    pub fn matches(&self, user: &User) -> bool {
        fn hit(filter: &Option<String>, value: &str) -> bool {
            match filter.as_deref() {
                None | Some("") => true,
                Some(fragment) => value.contains(fragment),
            }
        }

        hit(&self.username, &user.username)
            && hit(&self.nick_name, &user.nick_name)
            && hit(&self.email, &user.email)
    }
}

/// One page of results plus the total number of matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Total number of matching items.
    pub total: u64,
}

impl<T> Page<T> {
    /// Maps the items of the page.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn permission(id: i64, code: &str) -> Permission {
        Permission {
            id,
            code: code.to_string(),
            description: String::new(),
        }
    }

    fn user_with_roles(roles: Vec<Role>) -> User {
        let now = Utc::now();
        User {
            id: 1,
            username: "alice".to_string(),
            password_hash: String::new(),
            nick_name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            head_pic: None,
            phone_number: None,
            is_frozen: false,
            is_admin: false,
            create_time: now,
            update_time: now,
            roles,
        }
    }

    #[test]
    fn test_permission_union_across_roles() {
        let editor = Role {
            id: 1,
            name: "editor".to_string(),
            permissions: vec![permission(1, "ccc"), permission(2, "ddd")],
        };
        let viewer = Role {
            id: 2,
            name: "viewer".to_string(),
            permissions: vec![permission(1, "ccc")],
        };

        let user = user_with_roles(vec![editor, viewer]);

        assert_eq!(user.role_names(), vec!["editor", "viewer"]);
        let codes: Vec<_> = user.permission_codes().into_iter().collect();
        assert_eq!(codes, vec!["ccc", "ddd"]);
    }

    #[test]
    fn test_user_without_roles_has_no_permissions() {
        let user = user_with_roles(vec![]);
        assert!(user.permission_codes().is_empty());
    }

    #[test]
    fn test_filter_matching() {
        let user = user_with_roles(vec![]);

        assert!(UserFilter::default().matches(&user));
        assert!(UserFilter {
            username: Some("lic".to_string()),
            ..Default::default()
        }
        .matches(&user));
        assert!(UserFilter {
            email: Some(String::new()),
            ..Default::default()
        }
        .matches(&user));
        assert!(!UserFilter {
            nick_name: Some("Bob".to_string()),
            ..Default::default()
        }
        .matches(&user));
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let mut user = user_with_roles(vec![]);
        user.password_hash = "$argon2id$secret".to_string();

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["nickName"], "Alice");
    }
}
