// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Permission sets.
//!
//! Permissions are opaque capability names (e.g. `"ddd"`) granted through
//! roles. Authorization compares them by exact string equality.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// An ordered set of permission names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet {
    permissions: BTreeSet<String>,
}

impl PermissionSet {
    /// Creates an empty permission set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a permission set from names.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            permissions: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Adds a permission to the set.
    pub fn insert(&mut self, permission: impl Into<String>) {
        self.permissions.insert(permission.into());
    }

    /// Returns `true` if the set contains the given permission.
    pub fn contains(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    /// Returns `true` if every permission of `required` is in this set.
    pub fn contains_all(&self, required: &PermissionSet) -> bool {
        required.permissions.is_subset(&self.permissions)
    }

    /// Returns the permissions of `required` that are not in this set.
    pub fn missing<'a>(&self, required: &'a PermissionSet) -> Vec<&'a str> {
        required
            .permissions
            .iter()
            .filter(|p| !self.permissions.contains(p.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Merges another permission set into this one.
    pub fn merge(&mut self, other: &PermissionSet) {
        self.permissions.extend(other.permissions.iter().cloned());
    }

    /// Returns the number of permissions in the set.
    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    /// Returns `true` if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    /// Returns an iterator over the permissions, in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.permissions.iter().map(String::as_str)
    }

    /// Returns the permissions as a vector, in order.
    pub fn to_vec(&self) -> Vec<String> {
        self.permissions.iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::from_names(iter)
    }
}

impl fmt::Display for PermissionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().collect();
        write!(f, "[{}]", names.join(", "))
    }
}

// =============================================================================
// Tests
// =============================================================================
