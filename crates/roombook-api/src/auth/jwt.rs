// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session token codec.
//!
//! Tokens are HMAC-signed JWTs. Verification is a pure function of the
//! token, the current time and the secret: expiry is checked here against
//! an explicit `now` instead of inside `jsonwebtoken`, with no leeway.

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use roombook_core::UserId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::claims::{Claims, Identity, TokenKind};
use crate::error::{ApiError, ApiResult};

// =============================================================================
// TokenError
// =============================================================================

/// Token codec failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// The signature does not match, or the token names another algorithm.
    #[error("Token signature is invalid")]
    InvalidSignature,

    /// The current time is past the token's expiration.
    #[error("Token has expired")]
    Expired,

    /// The token cannot be decoded into claims.
    #[error("Token is malformed: {0}")]
    Malformed(String),

    /// The token is valid but of the wrong kind.
    #[error("Expected a {expected} token, got a {actual} token")]
    WrongKind {
        /// Kind the caller asked for.
        expected: TokenKind,
        /// Kind the token carries.
        actual: TokenKind,
    },

    /// Signing failed.
    #[error("Failed to encode token: {0}")]
    Encoding(String),
}

// =============================================================================
// JwtConfig
// =============================================================================

/// JWT configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    /// Secret key for signing tokens.
    #[serde(skip_serializing)]
    pub secret: String,
    /// Token issuer.
    pub issuer: String,
    /// Signing algorithm. HMAC only.
    #[serde(with = "algorithm_serde")]
    pub algorithm: Algorithm,
    /// Access token lifetime in seconds.
    pub access_expiration_secs: i64,
    /// Refresh token lifetime in seconds.
    pub refresh_expiration_secs: i64,
    /// Whether to validate the issuer.
    pub validate_issuer: bool,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(), // Must be set by user
            issuer: "roombook".to_string(),
            algorithm: Algorithm::HS256,
            access_expiration_secs: 30 * 60,
            refresh_expiration_secs: 7 * 24 * 60 * 60,
            validate_issuer: true,
        }
    }
}

impl JwtConfig {
    /// Creates a new configuration with the given secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Sets the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Sets the access token lifetime.
    pub fn with_access_expiration(mut self, secs: i64) -> Self {
        self.access_expiration_secs = secs;
        self
    }

    /// Sets the refresh token lifetime.
    pub fn with_refresh_expiration(mut self, secs: i64) -> Self {
        self.refresh_expiration_secs = secs;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ApiResult<()> {
        if self.secret.is_empty() {
            return Err(ApiError::internal("JWT secret is not configured"));
        }
        if !matches!(
            self.algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(ApiError::internal(format!(
                "JWT algorithm {:?} is not supported; use HS256, HS384 or HS512",
                self.algorithm
            )));
        }
        if self.access_expiration_secs <= 0 || self.refresh_expiration_secs <= 0 {
            return Err(ApiError::internal("JWT token lifetimes must be positive"));
        }
        if self.secret.len() < 32 {
            tracing::warn!("JWT secret is shorter than recommended (32 bytes)");
        }
        Ok(())
    }
}

// =============================================================================
// TokenPair
// =============================================================================

/// An access token and its refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// Access token.
    pub access_token: String,
    /// Refresh token.
    pub refresh_token: String,
}

// =============================================================================
// TokenCodec
// =============================================================================

/// Signs and verifies session tokens.
///
/// Cheap to clone; keys are shared.
#[derive(Clone)]
pub struct TokenCodec {
    config: Arc<JwtConfig>,
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl TokenCodec {
    /// Creates a codec with the given configuration.
    pub fn new(config: JwtConfig) -> ApiResult<Self> {
        config.validate()?;

        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(config.algorithm);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        if config.validate_issuer {
            validation.set_issuer(&[&config.issuer]);
        }

        Ok(Self {
            config: Arc::new(config),
            encoding_key: Arc::new(encoding_key),
            decoding_key: Arc::new(decoding_key),
            validation: Arc::new(validation),
        })
    }

    // =========================================================================
    // Signing
    // =========================================================================

    /// Signs `claims`. The same claims always produce the same token.
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        let header = Header::new(self.config.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Builds access claims for `identity` issued at `now`.
    pub fn access_claims(&self, identity: &Identity, now: i64) -> Claims {
        Claims::access(identity, now, self.config.access_expiration_secs)
            .with_issuer(&self.config.issuer)
    }

    /// Builds refresh claims for `user_id` issued at `now`.
    pub fn refresh_claims(&self, user_id: UserId, now: i64) -> Claims {
        Claims::refresh(user_id, now, self.config.refresh_expiration_secs)
            .with_issuer(&self.config.issuer)
    }

    /// Signs a fresh token pair for `identity`.
    pub fn issue_pair(&self, identity: &Identity) -> Result<TokenPair, TokenError> {
        self.issue_pair_at(identity, Utc::now().timestamp())
    }

    /// Signs a token pair for `identity` issued at `now`.
    pub fn issue_pair_at(&self, identity: &Identity, now: i64) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.sign(&self.access_claims(identity, now))?,
            refresh_token: self.sign(&self.refresh_claims(identity.user_id, now))?,
        })
    }

    // =========================================================================
    // Verification
    // =========================================================================

    /// Verifies a token against the current time.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verifies a token against `now` (Unix seconds).
    ///
    /// The signature is checked before the expiration, so a forged token is
    /// always reported as [`TokenError::InvalidSignature`].
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::InvalidSignature
                }
                _ => TokenError::Malformed(e.to_string()),
            })?;

        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    /// Verifies a token and requires it to be of `kind`.
    pub fn verify_kind(&self, token: &str, kind: TokenKind) -> Result<Claims, TokenError> {
        let claims = self.verify(token)?;
        if claims.kind != kind {
            return Err(TokenError::WrongKind {
                expected: kind,
                actual: claims.kind,
            });
        }
        Ok(claims)
    }

    /// Returns the access token lifetime in seconds.
    pub fn access_expiration_secs(&self) -> i64 {
        self.config.access_expiration_secs
    }

    /// Returns the refresh token lifetime in seconds.
    pub fn refresh_expiration_secs(&self) -> i64 {
        self.config.refresh_expiration_secs
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("issuer", &self.config.issuer)
            .field("algorithm", &self.config.algorithm)
            .field("access_expiration_secs", &self.config.access_expiration_secs)
            .finish()
    }
}

// =============================================================================
// Algorithm Serialization
// =============================================================================

mod algorithm_serde {
    use jsonwebtoken::Algorithm;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(algorithm: &Algorithm, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        format!("{:?}", algorithm).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Algorithm, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "HS256" => Ok(Algorithm::HS256),
            "HS384" => Ok(Algorithm::HS384),
            "HS512" => Ok(Algorithm::HS512),
            _ => Err(serde::de::Error::custom(format!(
                "Unsupported algorithm: {} (expected HS256, HS384 or HS512)",
                s
            ))),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
