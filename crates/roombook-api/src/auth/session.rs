// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session issuing.
//!
//! [`SessionIssuer`] is the only place tokens are minted. It is called by the
//! login and refresh endpoints and never by the gates.
//!
//! Refreshing reloads the user from storage, so role and permission changes
//! reach a session at the next refresh. Access tokens already issued keep
//! their permissions until they expire.

use std::sync::Arc;

use roombook_core::{
    verify_password, verify_unknown_account, PasswordError, StoreError, User, UserStore,
};
use thiserror::Error;

use super::claims::{Identity, TokenKind};
use super::jwt::{TokenCodec, TokenError, TokenPair};

// =============================================================================
// SessionError
// =============================================================================

/// Session issuing failures.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Unknown username or wrong password. Deliberately indistinguishable.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// The account is frozen.
    #[error("Account is frozen")]
    Frozen,

    /// Admin login was requested for a non-admin account.
    #[error("Administrator account required")]
    AdminRequired,

    /// The refresh token was rejected, or its user is gone.
    #[error("Refresh rejected: {0}")]
    Unauthenticated(String),

    /// Storage failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Token signing failed.
    #[error("Token signing failed: {0}")]
    Signing(TokenError),

    /// The stored password hash is unusable.
    #[error(transparent)]
    Password(#[from] PasswordError),
}

// =============================================================================
// Session
// =============================================================================

/// A user and the token pair just issued for them.
#[derive(Debug, Clone)]
pub struct Session {
    /// The user as loaded at issuance.
    pub user: User,
    /// Fresh tokens.
    pub tokens: TokenPair,
}

// =============================================================================
// SessionIssuer
// =============================================================================

/// Issues and refreshes session token pairs.
#[derive(Clone)]
pub struct SessionIssuer {
    codec: TokenCodec,
    store: Arc<dyn UserStore>,
}

impl SessionIssuer {
    /// Creates an issuer over `store`.
    pub fn new(codec: TokenCodec, store: Arc<dyn UserStore>) -> Self {
        Self { codec, store }
    }

    /// Authenticates with a password and issues a session.
    ///
    /// With `as_admin` set only administrator accounts may log in.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        as_admin: bool,
    ) -> Result<Session, SessionError> {
        let Some(user) = self.store.find_user_by_username(username).await? else {
            verify_unknown_account(password);
            return Err(SessionError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash)? {
            return Err(SessionError::InvalidCredentials);
        }
        if user.is_frozen {
            return Err(SessionError::Frozen);
        }
        if as_admin && !user.is_admin {
            return Err(SessionError::AdminRequired);
        }

        let tokens = self.issue(&user)?;
        tracing::info!(user_id = user.id, username = %user.username, as_admin, "User logged in");

        Ok(Session { user, tokens })
    }

    /// Redeems a refresh token for a new session.
    ///
    /// The user is reloaded, so the new access token carries the current
    /// roles and permissions. With `admin_scope` set only administrator
    /// accounts can be refreshed.
    pub async fn refresh(
        &self,
        refresh_token: &str,
        admin_scope: bool,
    ) -> Result<Session, SessionError> {
        let claims = self
            .codec
            .verify_kind(refresh_token, TokenKind::Refresh)
            .map_err(|e| {
                tracing::debug!(error = %e, "Refresh token rejected");
                SessionError::Unauthenticated(e.to_string())
            })?;

        let user = self
            .store
            .find_user_by_id(claims.user_id, admin_scope)
            .await?
            .ok_or_else(|| {
                SessionError::Unauthenticated(format!("user {} not found", claims.user_id))
            })?;

        if user.is_frozen {
            return Err(SessionError::Frozen);
        }

        let tokens = self.issue(&user)?;
        tracing::debug!(user_id = user.id, admin_scope, "Session refreshed");

        Ok(Session { user, tokens })
    }

    /// Returns the codec used to sign tokens.
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    fn issue(&self, user: &User) -> Result<TokenPair, SessionError> {
        self.codec
            .issue_pair(&Identity::from_user(user))
            .map_err(SessionError::Signing)
    }
}

impl std::fmt::Debug for SessionIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionIssuer")
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================
