// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session token claims.

use std::fmt;

use chrono::{DateTime, Utc};
use roombook_core::{User, UserId};
use serde::{Deserialize, Serialize};

use super::permission::PermissionSet;

// =============================================================================
// TokenKind
// =============================================================================

/// Distinguishes access tokens from refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived bearer credential carrying the full identity.
    Access,
    /// Long-lived credential carrying only the user ID.
    Refresh,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Access => f.write_str("access"),
            TokenKind::Refresh => f.write_str("refresh"),
        }
    }
}

// =============================================================================
// Identity
// =============================================================================

/// Who is calling: the identity embedded in an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// User ID.
    pub user_id: UserId,
    /// Login name.
    pub username: String,
    /// Role names.
    pub roles: Vec<String>,
    /// Union of the permissions granted by `roles`.
    pub permissions: PermissionSet,
}

impl Identity {
    /// Creates an identity.
    pub fn new(
        user_id: UserId,
        username: impl Into<String>,
        roles: Vec<String>,
        permissions: PermissionSet,
    ) -> Self {
        Self {
            user_id,
            username: username.into(),
            roles,
            permissions,
        }
    }

    /// Builds the identity of a stored user, resolving roles to permissions.
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            roles: user.role_names(),
            permissions: user.permission_codes().into_iter().collect(),
        }
    }

    /// Returns `true` if the identity has the given role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

// =============================================================================
// Claims
// =============================================================================

/// Decoded payload of a session token.
///
/// Access tokens carry the whole [`Identity`]; refresh tokens carry the user
/// ID only, so `username`, `roles` and `permissions` are empty for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// User ID.
    pub user_id: UserId,

    /// Login name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,

    /// Role names at issuance.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,

    /// Permissions at issuance.
    #[serde(default, skip_serializing_if = "PermissionSet::is_empty")]
    pub permissions: PermissionSet,

    /// Token kind.
    #[serde(rename = "typ")]
    pub kind: TokenKind,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// Expiration (Unix timestamp).
    pub exp: i64,

    /// Issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

impl Claims {
    /// Creates access-token claims for `identity`.
    pub fn access(identity: &Identity, issued_at: i64, lifetime_secs: i64) -> Self {
        Self {
            user_id: identity.user_id,
            username: identity.username.clone(),
            roles: identity.roles.clone(),
            permissions: identity.permissions.clone(),
            kind: TokenKind::Access,
            iat: issued_at,
            exp: issued_at.saturating_add(lifetime_secs),
            iss: None,
        }
    }

    /// Creates refresh-token claims for `user_id`.
    pub fn refresh(user_id: UserId, issued_at: i64, lifetime_secs: i64) -> Self {
        Self {
            user_id,
            username: String::new(),
            roles: Vec::new(),
            permissions: PermissionSet::new(),
            kind: TokenKind::Refresh,
            iat: issued_at,
            exp: issued_at.saturating_add(lifetime_secs),
            iss: None,
        }
    }

    /// Sets the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.iss = Some(issuer.into());
        self
    }

    /// Returns the identity carried by these claims.
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.user_id,
            username: self.username.clone(),
            roles: self.roles.clone(),
            permissions: self.permissions.clone(),
        }
    }

    /// Returns `true` if the claims are past their expiration at `now`.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now > self.exp
    }

    /// Returns the expiration time as a DateTime.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Returns the issued at time as a DateTime.
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use roombook_core::{Permission, Role};

    fn alice() -> Identity {
        Identity::new(
            7,
            "alice",
            vec!["editor".to_string()],
            PermissionSet::from_names(["ddd"]),
        )
    }

    #[test]
    fn test_access_claims() {
        let claims = Claims::access(&alice(), 1_000, 1_800);

        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.exp, 2_800);
        assert_eq!(claims.identity(), alice());
        assert!(!claims.is_expired_at(2_800));
        assert!(claims.is_expired_at(2_801));
    }

    #[test]
    fn test_refresh_claims_are_minimal() {
        let claims = Claims::refresh(7, 1_000, 60).with_issuer("roombook");
        let json = serde_json::to_value(&claims).unwrap();

        assert_eq!(json["userId"], 7);
        assert_eq!(json["typ"], "refresh");
        assert_eq!(json["iss"], "roombook");
        assert!(json.get("username").is_none());
        assert!(json.get("permissions").is_none());
    }

    #[test]
    fn test_identity_from_user() {
        let now = Utc::now();
        let user = User {
            id: 3,
            username: "bob".to_string(),
            password_hash: String::new(),
            nick_name: "Bob".to_string(),
            email: "bob@example.com".to_string(),
            head_pic: None,
            phone_number: None,
            is_frozen: false,
            is_admin: false,
            create_time: now,
            update_time: now,
            roles: vec![
                Role {
                    id: 1,
                    name: "a".to_string(),
                    permissions: vec![Permission {
                        id: 1,
                        code: "ccc".to_string(),
                        description: String::new(),
                    }],
                },
                Role {
                    id: 2,
                    name: "b".to_string(),
                    permissions: vec![
                        Permission {
                            id: 1,
                            code: "ccc".to_string(),
                            description: String::new(),
                        },
                        Permission {
                            id: 2,
                            code: "ddd".to_string(),
                            description: String::new(),
                        },
                    ],
                },
            ],
        };

        let identity = Identity::from_user(&user);
        assert_eq!(identity.user_id, 3);
        assert_eq!(identity.roles, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(identity.permissions, PermissionSet::from_names(["ccc", "ddd"]));
        assert!(identity.has_role("b"));
    }
}
