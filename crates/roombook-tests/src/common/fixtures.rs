// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Fixtures
//!
//! Accounts and roles shared by the integration suites.
//!
//! | Account | Password       | Roles    | Permissions |
//! |---------|----------------|----------|-------------|
//! | alice   | `alice-secret` | editor   | ddd         |
//! | bob     | `bob-secret`   | viewer   | ccc         |
//! | carl    | `carl-secret`  | (none)   | (none)      |

use roombook_api::{ApiConfig, JwtConfig};
use roombook_core::{hash_password, NewUser, User, UserStore};

/// Secret used to sign tokens in tests.
pub const TEST_JWT_SECRET: &str = "integration-test-secret-key-at-least-32-bytes";

/// Account holding the `ddd` permission through the `editor` role.
pub const ALICE: Account = Account {
    username: "alice",
    password: "alice-secret",
    email: "alice@example.com",
    role: Some(("editor", &["ddd"])),
    is_admin: false,
};

/// Account holding only `ccc` through the `viewer` role.
pub const BOB: Account = Account {
    username: "bob",
    password: "bob-secret",
    email: "bob@example.com",
    role: Some(("viewer", &["ccc"])),
    is_admin: false,
};

/// Account without roles.
pub const CARL: Account = Account {
    username: "carl",
    password: "carl-secret",
    email: "carl@example.com",
    role: None,
    is_admin: false,
};

/// Administrator account.
pub const ROOT: Account = Account {
    username: "root",
    password: "root-secret",
    email: "root@example.com",
    role: Some(("admin", &["ccc", "ddd"])),
    is_admin: true,
};

/// A fixture account.
#[derive(Debug, Clone, Copy)]
pub struct Account {
    /// Login name.
    pub username: &'static str,
    /// Plain-text password.
    pub password: &'static str,
    /// Email address.
    pub email: &'static str,
    /// Role name and the permission codes it grants.
    pub role: Option<(&'static str, &'static [&'static str])>,
    /// Administrator flag.
    pub is_admin: bool,
}

impl Account {
    /// Creates the account (and its role) in `store`.
    pub async fn create(&self, store: &dyn UserStore) -> User {
        let hash = hash_password(self.password).expect("hash password");
        let mut new_user = NewUser::new(self.username, hash, self.username, self.email);
        if self.is_admin {
            new_user = new_user.admin();
        }

        let user = store.create_user(new_user).await.expect("create user");

        if let Some((role, permissions)) = self.role {
            store.define_role(role, permissions).await.expect("define role");
            store
                .set_user_roles(user.id, &[role])
                .await
                .expect("assign role");
        }

        store
            .find_user_by_id(user.id, false)
            .await
            .expect("reload user")
            .expect("user exists")
    }
}

/// API configuration used by the harness.
pub fn test_api_config() -> ApiConfig {
    ApiConfig::default().with_jwt(JwtConfig::new(TEST_JWT_SECRET))
}
