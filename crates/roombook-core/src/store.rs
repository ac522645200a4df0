// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! User storage.
//!
//! [`UserStore`] is the storage contract the session issuer and the account
//! handlers depend on. [`MemoryUserStore`] is a complete in-process
//! implementation used by the binary and by tests.
//!
//! Roles are resolved when a user is read, so a role change is visible to the
//! next read of every user holding that role.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::types::{NewUser, Page, Permission, ProfileUpdate, Role, User, UserFilter, UserId};

// =============================================================================
// UserStore
// =============================================================================

/// Storage operations for users, roles and permissions.
#[async_trait]
pub trait UserStore: Send + Sync {
    // =========================================================================
    // Lookups
    // =========================================================================

    /// Finds a user by login name.
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// Finds a user by ID.
    ///
    /// With `admin_scope` set only administrator accounts match.
    async fn find_user_by_id(&self, id: UserId, admin_scope: bool) -> StoreResult<Option<User>>;

    /// Finds a user by email address.
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Lists users matching `filter`, one page at a time.
    ///
    /// `page_index` is 1-based. Results are ordered by ID.
    async fn list_users(
        &self,
        filter: &UserFilter,
        page_index: u32,
        page_size: u32,
    ) -> StoreResult<Page<User>>;

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Creates a user. Fails with [`StoreError::Conflict`] if the username is taken.
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    /// Replaces the stored password hash.
    async fn update_password(&self, id: UserId, password_hash: &str) -> StoreResult<()>;

    /// Applies a partial profile update.
    async fn update_profile(&self, id: UserId, update: ProfileUpdate) -> StoreResult<()>;

    /// Freezes an account.
    async fn freeze_user(&self, id: UserId) -> StoreResult<()>;

    // =========================================================================
    // Role administration
    // =========================================================================

    /// Creates or replaces a role with the given permission codes.
    ///
    /// Unknown permission codes are registered on the fly.
    async fn define_role(&self, name: &str, permission_codes: &[&str]) -> StoreResult<Role>;

    /// Replaces the roles assigned to a user.
    async fn set_user_roles(&self, id: UserId, role_names: &[&str]) -> StoreResult<()>;
}

// =============================================================================
// MemoryUserStore
// =============================================================================

#[derive(Debug, Clone)]
struct UserRecord {
    user: User,
    role_names: Vec<String>,
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, UserRecord>,
    roles: BTreeMap<String, Role>,
    permissions: BTreeMap<String, Permission>,
    next_user_id: UserId,
    next_role_id: i64,
    next_permission_id: i64,
}

impl Tables {
    fn materialize(&self, record: &UserRecord) -> User {
        let mut user = record.user.clone();
        user.roles = record
            .role_names
            .iter()
            .filter_map(|name| self.roles.get(name).cloned())
            .collect();
        user
    }

    fn record_mut(&mut self, id: UserId) -> StoreResult<&mut UserRecord> {
        self.users
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(format!("user {}", id)))
    }

    fn permission(&mut self, code: &str) -> Permission {
        if let Some(existing) = self.permissions.get(code) {
            return existing.clone();
        }

        self.next_permission_id += 1;
        let permission = Permission {
            id: self.next_permission_id,
            code: code.to_string(),
            description: String::new(),
        };
        self.permissions.insert(code.to_string(), permission.clone());
        permission
    }
}

/// In-memory [`UserStore`].
///
/// Uses `parking_lot::RwLock`; no lock is held across an await point.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    tables: RwLock<Tables>,
}

impl MemoryUserStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored users.
    pub fn user_count(&self) -> usize {
        self.tables.read().users.len()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read();
        Ok(tables
            .users
            .values()
            .find(|r| r.user.username == username)
            .map(|r| tables.materialize(r)))
    }

    async fn find_user_by_id(&self, id: UserId, admin_scope: bool) -> StoreResult<Option<User>> {
        let tables = self.tables.read();
        Ok(tables
            .users
            .get(&id)
            .filter(|r| !admin_scope || r.user.is_admin)
            .map(|r| tables.materialize(r)))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read();
        Ok(tables
            .users
            .values()
            .find(|r| r.user.email == email)
            .map(|r| tables.materialize(r)))
    }

    async fn list_users(
        &self,
        filter: &UserFilter,
        page_index: u32,
        page_size: u32,
    ) -> StoreResult<Page<User>> {
        let tables = self.tables.read();
        let matching: Vec<&UserRecord> = tables
            .users
            .values()
            .filter(|r| filter.matches(&r.user))
            .collect();

        let skip = (page_index.saturating_sub(1) as usize).saturating_mul(page_size as usize);
        let items = matching
            .iter()
            .skip(skip)
            .take(page_size as usize)
            .map(|r| tables.materialize(r))
            .collect();

        Ok(Page {
            items,
            total: matching.len() as u64,
        })
    }

    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write();

        if tables
            .users
            .values()
            .any(|r| r.user.username == new_user.username)
        {
            return Err(StoreError::conflict(format!(
                "username '{}' is already taken",
                new_user.username
            )));
        }

        tables.next_user_id += 1;
        let now = Utc::now();
        let user = User {
            id: tables.next_user_id,
            username: new_user.username,
            password_hash: new_user.password_hash,
            nick_name: new_user.nick_name,
            email: new_user.email,
            head_pic: None,
            phone_number: new_user.phone_number,
            is_frozen: false,
            is_admin: new_user.is_admin,
            create_time: now,
            update_time: now,
            roles: Vec::new(),
        };

        tables.users.insert(
            user.id,
            UserRecord {
                user: user.clone(),
                role_names: Vec::new(),
            },
        );

        tracing::debug!(user_id = user.id, username = %user.username, "User created");
        Ok(user)
    }

    async fn update_password(&self, id: UserId, password_hash: &str) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let record = tables.record_mut(id)?;
        record.user.password_hash = password_hash.to_string();
        record.user.update_time = Utc::now();
        Ok(())
    }

    async fn update_profile(&self, id: UserId, update: ProfileUpdate) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let record = tables.record_mut(id)?;
        if let Some(nick_name) = update.nick_name {
            record.user.nick_name = nick_name;
        }
        if let Some(head_pic) = update.head_pic {
            record.user.head_pic = Some(head_pic);
        }
        record.user.update_time = Utc::now();
        Ok(())
    }

    async fn freeze_user(&self, id: UserId) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let record = tables.record_mut(id)?;
        record.user.is_frozen = true;
        record.user.update_time = Utc::now();
        Ok(())
    }

    async fn define_role(&self, name: &str, permission_codes: &[&str]) -> StoreResult<Role> {
        let mut tables = self.tables.write();

        let permissions = permission_codes
            .iter()
            .map(|code| tables.permission(code))
            .collect();

        let id = match tables.roles.get(name) {
            Some(existing) => existing.id,
            None => {
                tables.next_role_id += 1;
                tables.next_role_id
            }
        };

        let role = Role {
            id,
            name: name.to_string(),
            permissions,
        };
        tables.roles.insert(name.to_string(), role.clone());
        Ok(role)
    }

    async fn set_user_roles(&self, id: UserId, role_names: &[&str]) -> StoreResult<()> {
        let mut tables = self.tables.write();

        if let Some(unknown) = role_names.iter().find(|n| !tables.roles.contains_key(**n)) {
            return Err(StoreError::not_found(format!("role '{}'", unknown)));
        }

        let record = tables.record_mut(id)?;
        record.role_names = role_names.iter().map(|n| n.to_string()).collect();
        record.user.update_time = Utc::now();
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with(names: &[&str]) -> MemoryUserStore {
        let store = MemoryUserStore::new();
        for name in names {
            store
                .create_user(NewUser::new(
                    *name,
                    "hash",
                    name.to_uppercase(),
                    format!("{}@example.com", name),
                ))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let store = store_with(&["alice"]).await;

        let by_name = store.find_user_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, 1);
        assert!(!by_name.is_frozen);

        let by_id = store.find_user_by_id(1, false).await.unwrap().unwrap();
        assert_eq!(by_id.username, "alice");

        let by_email = store
            .find_user_by_email("alice@example.com")
            .await
            .unwrap();
        assert!(by_email.is_some());

        assert!(store.find_user_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let store = store_with(&["alice"]).await;

        let result = store
            .create_user(NewUser::new("alice", "h", "A", "other@example.com"))
            .await;

        assert!(matches!(result, Err(StoreError::Conflict { .. })));
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn test_admin_scope_lookup() {
        let store = MemoryUserStore::new();
        store
            .create_user(NewUser::new("root", "h", "Root", "root@example.com").admin())
            .await
            .unwrap();
        store
            .create_user(NewUser::new("bob", "h", "Bob", "bob@example.com"))
            .await
            .unwrap();

        assert!(store.find_user_by_id(1, true).await.unwrap().is_some());
        assert!(store.find_user_by_id(2, true).await.unwrap().is_none());
        assert!(store.find_user_by_id(2, false).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_role_changes_visible_on_next_read() {
        let store = store_with(&["alice"]).await;
        store.define_role("editor", &["ddd"]).await.unwrap();
        store.set_user_roles(1, &["editor"]).await.unwrap();

        let user = store.find_user_by_id(1, false).await.unwrap().unwrap();
        assert!(user.permission_codes().contains("ddd"));

        store.define_role("editor", &["ccc"]).await.unwrap();
        let user = store.find_user_by_id(1, false).await.unwrap().unwrap();
        assert!(!user.permission_codes().contains("ddd"));
        assert!(user.permission_codes().contains("ccc"));

        store.set_user_roles(1, &[]).await.unwrap();
        let user = store.find_user_by_id(1, false).await.unwrap().unwrap();
        assert!(user.roles.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_role_rejected() {
        let store = store_with(&["alice"]).await;
        let result = store.set_user_roles(1, &["ghost"]).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_profile_password_and_freeze() {
        let store = store_with(&["alice"]).await;

        store
            .update_profile(
                1,
                ProfileUpdate {
                    nick_name: Some("Ally".to_string()),
                    head_pic: None,
                },
            )
            .await
            .unwrap();
        store.update_password(1, "new-hash").await.unwrap();
        store.freeze_user(1).await.unwrap();

        let user = store.find_user_by_id(1, false).await.unwrap().unwrap();
        assert_eq!(user.nick_name, "Ally");
        assert_eq!(user.password_hash, "new-hash");
        assert!(user.is_frozen);

        assert!(matches!(
            store.freeze_user(99).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_users_paging_and_filter() {
        let store = store_with(&["alice", "bob", "carol", "dave", "alina"]).await;

        let page = store
            .list_users(&UserFilter::default(), 2, 2)
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        let names: Vec<_> = page.items.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["carol", "dave"]);

        let filter = UserFilter {
            username: Some("ali".to_string()),
            ..Default::default()
        };
        let page = store.list_users(&filter, 1, 10).await.unwrap();
        assert_eq!(page.total, 2);

        let beyond = store
            .list_users(&UserFilter::default(), 9, 10)
            .await
            .unwrap();
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total, 5);
    }
}
