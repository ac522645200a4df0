// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration loading.
//!
//! # Loading Pipeline
//!
//! 1. Read the file (YAML, TOML or JSON, chosen by extension)
//! 2. Resolve `${VAR}` / `${VAR:default}` placeholders in the raw text
//! 3. Parse into [`RoombookConfig`]
//! 4. Apply `ROOMBOOK_*` environment overrides
//! 5. Validate
//!
//! # Environment Variable Override
//!
//! ```text
//! ROOMBOOK_HOST=127.0.0.1
//! ROOMBOOK_PORT=8080
//! ROOMBOOK_JWT_SECRET=...
//! ROOMBOOK_SEED_DEMO_DATA=true
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use roombook_api::{ApiConfig, ApiError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// ConfigError
// =============================================================================

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Missing path.
        path: PathBuf,
    },

    /// The configuration file could not be read.
    #[error("Failed to read {path}: {message}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        message: String,
    },

    /// The file extension is not a supported format.
    #[error("Unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    /// The content could not be parsed.
    #[error("Failed to parse {path}: {message}")]
    Parse {
        /// File path.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// The content could not be deserialized.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Parser message.
        message: String,
    },

    /// An environment override has an invalid value.
    #[error("Invalid environment variable {name}: {message}")]
    InvalidEnvVar {
        /// Variable name.
        name: String,
        /// What was expected.
        message: String,
    },

    /// The loaded configuration is invalid.
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

impl ConfigError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    fn serialization(message: impl ToString) -> Self {
        Self::Serialization {
            message: message.to_string(),
        }
    }
}

// =============================================================================
// RoombookConfig
// =============================================================================

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoombookConfig {
    /// HTTP server, token and captcha settings.
    pub api: ApiConfig,
    /// Seed demo roles and accounts on startup.
    pub seed_demo_data: bool,
}

impl RoombookConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        self.api.validate().map_err(|e| match e {
            ApiError::Internal(message) => ConfigError::Validation(message),
            other => ConfigError::Validation(other.to_string()),
        })
    }

    /// Returns non-fatal issues worth reporting.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.api.jwt.secret.len() < 32 {
            warnings.push("JWT secret is shorter than 32 bytes".to_string());
        }
        if self.api.cors.credentials && self.api.cors.allows_any_origin() {
            warnings.push("CORS credentials are ignored while any origin is allowed".to_string());
        }
        if self.seed_demo_data {
            warnings.push("Demo accounts with well-known passwords will be created".to_string());
        }

        warnings
    }
}

// =============================================================================
// ConfigFormat
// =============================================================================

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format.
    Yaml,
    /// TOML format.
    Toml,
    /// JSON format.
    Json,
}

impl ConfigFormat {
    /// Determines the format from a file path.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("json") => Ok(ConfigFormat::Json),
            Some(other) => Err(ConfigError::UnsupportedFormat(other.to_string())),
            None => Err(ConfigError::UnsupportedFormat("(no extension)".to_string())),
        }
    }
}

// =============================================================================
// ConfigLoader
// =============================================================================

/// Configuration loader.
///
/// # Examples
///
/// ```no_run
/// use roombook_bin::config::ConfigLoader;
///
/// let config = ConfigLoader::new().load("roombook.yaml").unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Environment variable prefix.
    env_prefix: String,

    /// Whether placeholders and overrides are read from the environment.
    resolve_env_vars: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a new configuration loader with default settings.
    pub fn new() -> Self {
        Self {
            env_prefix: "ROOMBOOK".to_string(),
            resolve_env_vars: true,
        }
    }

    /// Sets the environment variable prefix.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Enables or disables environment variable resolution.
    pub fn with_env_vars(mut self, enabled: bool) -> Self {
        self.resolve_env_vars = enabled;
        self
    }

    /// Loads configuration from a file that must exist.
    pub fn load(&self, path: impl AsRef<Path>) -> ConfigResult<RoombookConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let format = ConfigFormat::from_path(path)?;

        self.load_from_str(&content, format).map_err(|e| match e {
            ConfigError::Serialization { message } => ConfigError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    /// Loads configuration from a file, or from defaults and the environment
    /// when the file does not exist.
    pub fn load_or_default(&self, path: impl AsRef<Path>) -> ConfigResult<RoombookConfig> {
        let path = path.as_ref();
        if path.exists() {
            return self.load(path);
        }

        info!(
            "Configuration file {} not found, using defaults",
            path.display()
        );
        let mut config = RoombookConfig::default();
        if self.resolve_env_vars {
            self.apply_env_overrides(&mut config)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a string.
    pub fn load_from_str(&self, content: &str, format: ConfigFormat) -> ConfigResult<RoombookConfig> {
        let content = if self.resolve_env_vars {
            resolve_placeholders(content, |name| env::var(name).ok())
        } else {
            content.to_string()
        };

        let mut config: RoombookConfig = parse_str(&content, format)?;

        if self.resolve_env_vars {
            self.apply_env_overrides(&mut config)?;
        }

        config.validate()?;
        debug!(port = config.api.port, "Configuration loaded");
        Ok(config)
    }

    /// Applies `<PREFIX>_*` overrides from the process environment.
    pub fn apply_env_overrides(&self, config: &mut RoombookConfig) -> ConfigResult<()> {
        self.apply_overrides_from(config, |name| env::var(name).ok())
    }

    /// Applies `<PREFIX>_*` overrides using `lookup` to read variables.
    pub fn apply_overrides_from(
        &self,
        config: &mut RoombookConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> ConfigResult<()> {
        let name = |suffix: &str| format!("{}_{}", self.env_prefix, suffix);

        if let Some(value) = lookup(&name("HOST")) {
            config.api.host = value.parse().map_err(|_| ConfigError::InvalidEnvVar {
                name: name("HOST"),
                message: "expected an IP address".to_string(),
            })?;
        }
        if let Some(value) = lookup(&name("PORT")) {
            config.api.port = value.parse().map_err(|_| ConfigError::InvalidEnvVar {
                name: name("PORT"),
                message: "expected valid port number".to_string(),
            })?;
        }
        if let Some(value) = lookup(&name("JWT_SECRET")) {
            config.api.jwt.secret = value;
        }
        if let Some(value) = lookup(&name("SEED_DEMO_DATA")) {
            config.seed_demo_data = parse_bool(&value);
        }

        Ok(())
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Replaces `${VAR}` and `${VAR:default}` placeholders.
///
/// Unknown variables without a default are left in place.
fn resolve_placeholders(content: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' || chars.peek() != Some(&'{') {
            result.push(c);
            continue;
        }
        chars.next();

        let mut var_content = String::new();
        let mut found_close = false;
        for c in chars.by_ref() {
            if c == '}' {
                found_close = true;
                break;
            }
            var_content.push(c);
        }

        if !found_close {
            result.push_str("${");
            result.push_str(&var_content);
            continue;
        }

        let (var_name, default_value) = match var_content.split_once(':') {
            Some((name, default)) => (name, Some(default)),
            None => (var_content.as_str(), None),
        };

        match (lookup(var_name), default_value) {
            (Some(value), _) => result.push_str(&value),
            (None, Some(default)) => result.push_str(default),
            (None, None) => {
                warn!("Environment variable '{}' not found", var_name);
                result.push_str(&format!("${{{}}}", var_name));
            }
        }
    }

    result
}

fn parse_str<T: DeserializeOwned>(content: &str, format: ConfigFormat) -> ConfigResult<T> {
    match format {
        ConfigFormat::Yaml => {
            let config = config::Config::builder()
                .add_source(config::File::from_str(content, config::FileFormat::Yaml))
                .build()
                .map_err(ConfigError::serialization)?;
            config.try_deserialize().map_err(ConfigError::serialization)
        }
        ConfigFormat::Toml => toml::from_str(content).map_err(ConfigError::serialization),
        ConfigFormat::Json => serde_json::from_str(content).map_err(ConfigError::serialization),
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "true" | "1" | "yes" | "on" | "enabled"
    )
}

// =============================================================================
// Tests
// =============================================================================
