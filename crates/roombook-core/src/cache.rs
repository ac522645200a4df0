// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Short-lived key/value cache for verification codes.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::CacheResult;

// =============================================================================
// CodeCache
// =============================================================================

/// Key/value cache with per-entry expiry.
#[async_trait]
pub trait CodeCache: Send + Sync {
    /// Stores `value` under `key` for `ttl_secs` seconds, replacing any previous value.
    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> CacheResult<()>;

    /// Returns the live value under `key`, if any.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Removes `key`. Returns `true` if a live value was removed.
    async fn remove(&self, key: &str) -> CacheResult<bool>;
}

// =============================================================================
// MemoryCodeCache
// =============================================================================

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-memory [`CodeCache`] backed by a `DashMap`.
///
/// Expired entries are dropped lazily when they are read.
#[derive(Debug, Default)]
pub struct MemoryCodeCache {
    entries: DashMap<String, Entry>,
}

impl MemoryCodeCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes every expired entry and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        before - self.entries.len()
    }

    /// Returns the number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CodeCache for MemoryCodeCache {
    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> CacheResult<()> {
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + Duration::from_secs(ttl_secs),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let now = Instant::now();
        match self.entries.get(key) {
            Some(entry) if entry.is_live(now) => return Ok(Some(entry.value.clone())),
            Some(_) => {}
            None => return Ok(None),
        }

        // The read guard is released above; removing while holding it would deadlock.
        self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        Ok(None)
    }

    async fn remove(&self, key: &str) -> CacheResult<bool> {
        let now = Instant::now();
        Ok(self
            .entries
            .remove(key)
            .is_some_and(|(_, entry)| entry.is_live(now)))
    }
}

// =============================================================================
// Tests
// =============================================================================
