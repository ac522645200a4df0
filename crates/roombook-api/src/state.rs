// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Application state shared across handlers.

use std::sync::Arc;

use roombook_core::{
    CodeCache, LogMailSender, MailSender, MemoryCodeCache, MemoryUserStore, UserStore,
    VerificationCodes,
};

use crate::auth::{AccessRegistry, SessionIssuer, TokenCodec};
use crate::config::ApiConfig;
use crate::error::ApiResult;

// =============================================================================
// AppState
// =============================================================================

/// Application state shared across all handlers.
///
/// This is the central state container that is passed to all handlers via
/// Axum's state extraction mechanism. Everything in it is read-only or
/// internally synchronized.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: Arc<ApiConfig>,
    /// Token codec.
    pub codec: TokenCodec,
    /// Route access registry.
    pub registry: Arc<AccessRegistry>,
    /// Session issuer.
    pub sessions: SessionIssuer,
    /// User storage.
    pub store: Arc<dyn UserStore>,
    /// Verification-code exchange.
    pub codes: VerificationCodes,
}

impl AppState {
    /// Creates a new app state builder.
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::new()
    }

    /// Returns the token codec.
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Returns the session issuer.
    pub fn sessions(&self) -> &SessionIssuer {
        &self.sessions
    }

    /// Returns the user store.
    pub fn store(&self) -> &dyn UserStore {
        self.store.as_ref()
    }

    /// Returns the verification-code exchange.
    pub fn codes(&self) -> &VerificationCodes {
        &self.codes
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("codec", &self.codec)
            .field("routes", &self.registry.len())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// AppStateBuilder
// =============================================================================

/// Builder for constructing AppState.
///
/// Collaborators that are not set fall back to in-memory implementations and
/// a mail sender that only logs.
#[derive(Default)]
pub struct AppStateBuilder {
    config: Option<ApiConfig>,
    registry: Option<Arc<AccessRegistry>>,
    store: Option<Arc<dyn UserStore>>,
    cache: Option<Arc<dyn CodeCache>>,
    mail: Option<Arc<dyn MailSender>>,
}

impl AppStateBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the access registry.
    pub fn registry(mut self, registry: Arc<AccessRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sets the user store.
    pub fn store(mut self, store: Arc<dyn UserStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the code cache.
    pub fn cache(mut self, cache: Arc<dyn CodeCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Sets the mail sender.
    pub fn mail(mut self, mail: Arc<dyn MailSender>) -> Self {
        self.mail = Some(mail);
        self
    }

    /// Builds the AppState.
    ///
    /// Fails if the configuration is invalid or the route table is
    /// inconsistent.
    pub fn build(self) -> ApiResult<AppState> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let codec = TokenCodec::new(config.jwt.clone())?;

        let registry = match self.registry {
            Some(registry) => registry,
            None => Arc::new(crate::server::access_registry()?),
        };

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryUserStore::new()));
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(MemoryCodeCache::new()));
        let mail = self.mail.unwrap_or_else(|| Arc::new(LogMailSender));

        let sessions = SessionIssuer::new(codec.clone(), store.clone());
        let codes = VerificationCodes::new(cache, mail, config.captcha.clone());

        Ok(AppState {
            config: Arc::new(config),
            codec,
            registry,
            sessions,
            store,
            codes,
        })
    }
}

// =============================================================================
// FromRef implementations for extracting parts of state
// =============================================================================

impl axum::extract::FromRef<AppState> for TokenCodec {
    fn from_ref(state: &AppState) -> Self {
        state.codec.clone()
    }
}

impl axum::extract::FromRef<AppState> for Arc<ApiConfig> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

// =============================================================================
// Tests
// =============================================================================
