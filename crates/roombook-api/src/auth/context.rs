// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication context.

use std::net::IpAddr;
use std::sync::Arc;

use roombook_core::UserId;
use uuid::Uuid;

use super::claims::{Claims, Identity};
use super::permission::PermissionSet;

/// Identity of the caller of one request.
///
/// Created by the authentication gate from verified claims and attached to
/// the request extensions exactly once. It has no setters; handlers only read
/// it. Public routes carry no context at all.
#[derive(Debug, Clone)]
pub struct AuthContext {
    identity: Arc<Identity>,
    expires_at: i64,
    request_id: Uuid,
    client_ip: Option<IpAddr>,
}

impl AuthContext {
    /// Creates a context from verified access-token claims.
    pub fn from_claims(claims: &Claims, client_ip: Option<IpAddr>) -> Self {
        Self {
            identity: Arc::new(claims.identity()),
            expires_at: claims.exp,
            request_id: Uuid::now_v7(),
            client_ip,
        }
    }

    /// Returns the caller's identity.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Returns the caller's user ID.
    pub fn user_id(&self) -> UserId {
        self.identity.user_id
    }

    /// Returns the caller's login name.
    pub fn username(&self) -> &str {
        &self.identity.username
    }

    /// Returns the caller's roles.
    pub fn roles(&self) -> &[String] {
        &self.identity.roles
    }

    /// Returns the caller's permissions.
    pub fn permissions(&self) -> &PermissionSet {
        &self.identity.permissions
    }

    /// Returns `true` if the caller has the given permission.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.identity.permissions.contains(permission)
    }

    /// Returns `true` if the caller has every permission in `required`.
    pub fn has_all_permissions(&self, required: &PermissionSet) -> bool {
        self.identity.permissions.contains_all(required)
    }

    /// Returns the expiration of the token that authenticated the request.
    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }

    /// Returns the request ID.
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Returns the client IP address, if known.
    pub fn client_ip(&self) -> Option<IpAddr> {
        self.client_ip
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_from_claims() {
        let identity = Identity::new(
            5,
            "alice",
            vec!["editor".to_string()],
            PermissionSet::from_names(["ddd"]),
        );
        let claims = Claims::access(&identity, 100, 60);
        let ip: IpAddr = "10.0.0.1".parse().unwrap();

        let ctx = AuthContext::from_claims(&claims, Some(ip));

        assert_eq!(ctx.user_id(), 5);
        assert_eq!(ctx.username(), "alice");
        assert_eq!(ctx.roles(), ["editor".to_string()]);
        assert!(ctx.has_permission("ddd"));
        assert!(!ctx.has_permission("ccc"));
        assert!(ctx.has_all_permissions(&PermissionSet::from_names(["ddd"])));
        assert_eq!(ctx.expires_at(), 160);
        assert_eq!(ctx.client_ip(), Some(ip));
    }

    #[test]
    fn test_request_ids_are_unique() {
        let claims = Claims::refresh(1, 0, 60);
        let a = AuthContext::from_claims(&claims, None);
        let b = AuthContext::from_claims(&claims, None);
        assert_ne!(a.request_id(), b.request_id());
    }
}
