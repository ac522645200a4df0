// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Demo data.
//!
//! Seeds two permissions, two roles and two accounts:
//!
//! ```text
//! permission ccc   access ccc
//! permission ddd   access ddd
//! role admin       [ccc, ddd]
//! role user        [ccc]
//! zhangsan/111111  administrator, role admin
//! lisi/222222      role user
//! ```
//!
//! Seeding is idempotent: roles are redefined and existing accounts are left
//! untouched.

use crate::error::SeedError;
use crate::password::hash_password;
use crate::store::UserStore;
use crate::types::NewUser;

struct DemoAccount {
    username: &'static str,
    password: &'static str,
    nick_name: &'static str,
    email: &'static str,
    phone_number: &'static str,
    is_admin: bool,
    role: &'static str,
}

const DEMO_ROLES: &[(&str, &[&str])] = &[("admin", &["ccc", "ddd"]), ("user", &["ccc"])];

const DEMO_ACCOUNTS: &[DemoAccount] = &[
    DemoAccount {
        username: "zhangsan",
        password: "111111",
        nick_name: "Zhang San",
        email: "zhangsan@example.com",
        phone_number: "13233323333",
        is_admin: true,
        role: "admin",
    },
    DemoAccount {
        username: "lisi",
        password: "222222",
        nick_name: "Li Si",
        email: "lisi@example.com",
        phone_number: "13233323334",
        is_admin: false,
        role: "user",
    },
];

/// Outcome of [`seed_demo_data`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Roles defined or redefined.
    pub roles: usize,
    /// Accounts created by this call.
    pub users_created: usize,
    /// Accounts that already existed.
    pub users_skipped: usize,
}

/// Seeds the demo roles and accounts into `store`.
pub async fn seed_demo_data(store: &dyn UserStore) -> Result<SeedReport, SeedError> {
    let mut report = SeedReport::default();

    for (name, permissions) in DEMO_ROLES {
        store.define_role(name, permissions).await?;
        report.roles += 1;
    }

    for account in DEMO_ACCOUNTS {
        if store.find_user_by_username(account.username).await?.is_some() {
            report.users_skipped += 1;
            continue;
        }

        let mut new_user = NewUser::new(
            account.username,
            hash_password(account.password)?,
            account.nick_name,
            account.email,
        )
        .with_phone_number(account.phone_number);
        if account.is_admin {
            new_user = new_user.admin();
        }

        let user = store.create_user(new_user).await?;
        store.set_user_roles(user.id, &[account.role]).await?;
        report.users_created += 1;
    }

    tracing::info!(
        roles = report.roles,
        created = report.users_created,
        skipped = report.users_skipped,
        "Demo data seeded"
    );

    Ok(report)
}
