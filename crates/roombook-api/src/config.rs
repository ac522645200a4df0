// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! HTTP surface settings: listen address, browser access, token and
//! verification-code lifetimes, and timeouts.
//!
//! Every section is `#[serde(default)]`, so a config file only names what
//! it changes. Durations are whole seconds.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use axum::http::HeaderValue;
use roombook_core::CaptchaConfig;
use serde::{Deserialize, Serialize};

use crate::auth::JwtConfig;
use crate::error::{ApiError, ApiResult};

// =============================================================================
// ApiConfig
// =============================================================================

/// Settings for [`ApiServer`](crate::ApiServer).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Listen address.
    pub host: IpAddr,
    /// Listen port.
    pub port: u16,
    /// Browser cross-origin access.
    pub cors: CorsConfig,
    /// Token signing and lifetimes.
    pub jwt: JwtConfig,
    /// Verification code lifetimes.
    pub captcha: CaptchaConfig,
    /// Invoke records for admitted requests.
    pub record: RecordConfig,
    /// Requests still running after this many seconds get 408.
    pub request_timeout_secs: u64,
    /// Grace period for in-flight requests on shutdown.
    pub shutdown_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::UNSPECIFIED.into(),
            port: 3005,
            cors: CorsConfig::default(),
            jwt: JwtConfig::default(),
            captcha: CaptchaConfig::default(),
            record: RecordConfig::default(),
            request_timeout_secs: 30,
            shutdown_timeout_secs: 10,
        }
    }
}

impl ApiConfig {
    /// Same as [`Default::default`].
    pub fn new() -> Self {
        Self::default()
    }

    pub fn socket_addr(&self) -> SocketAddr {
        (self.host, self.port).into()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    pub fn with_host(mut self, host: IpAddr) -> Self {
        self.host = host;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_jwt(mut self, jwt: JwtConfig) -> Self {
        self.jwt = jwt;
        self
    }

    pub fn with_captcha(mut self, captcha: CaptchaConfig) -> Self {
        self.captcha = captcha;
        self
    }

    /// Rejects settings the server cannot run with.
    ///
    /// The error message names the offending key.
    pub fn validate(&self) -> ApiResult<()> {
        self.jwt.validate()?;
        self.cors.validate()?;

        let positive = [
            ("request_timeout_secs", self.request_timeout_secs),
            ("captcha.register_ttl_secs", self.captcha.register_ttl_secs),
            ("captcha.update_password_ttl_secs", self.captcha.update_password_ttl_secs),
            ("captcha.update_user_ttl_secs", self.captcha.update_user_ttl_secs),
        ];
        match positive.iter().find(|(_, value)| *value == 0) {
            Some((key, _)) => Err(ApiError::internal(format!("{} must be greater than 0", key))),
            None => Ok(()),
        }
    }
}

// =============================================================================
// CorsConfig
// =============================================================================

/// Which browser origins may call the API.
///
/// Methods and headers are fixed to what the routes use: `GET`, `POST` and
/// `OPTIONS` with `Authorization`, `Content-Type` and `Accept`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins, e.g. `https://rooms.example.com`. Empty or `"*"`
    /// allows any origin.
    pub origins: Vec<String>,
    /// Answer with `Access-Control-Allow-Credentials: true`. Ignored while
    /// any origin is allowed.
    pub credentials: bool,
    /// Seconds a browser may cache a preflight answer. `0` leaves the
    /// header out.
    pub max_age_secs: u64,
}

impl CorsConfig {
    /// Restricts access to the given origins.
    pub fn for_origins<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            origins: origins.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn allows_any_origin(&self) -> bool {
        self.origins.is_empty() || self.origins.iter().any(|o| o == "*")
    }

    /// Origins as header values. Call after [`validate`](Self::validate).
    pub fn origin_values(&self) -> Vec<HeaderValue> {
        self.origins
            .iter()
            .filter_map(|o| HeaderValue::from_str(o).ok())
            .collect()
    }

    fn validate(&self) -> ApiResult<()> {
        for origin in self.origins.iter().filter(|o| *o != "*") {
            if HeaderValue::from_str(origin).is_err() {
                return Err(ApiError::internal(format!(
                    "cors.origins contains an invalid origin: {:?}",
                    origin
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// RecordConfig
// =============================================================================

/// Invoke-record logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordConfig {
    /// Log one record per admitted request.
    pub enabled: bool,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}
