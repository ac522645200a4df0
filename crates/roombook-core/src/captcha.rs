// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Verification-code exchange.
//!
//! Registration, password changes and profile changes are confirmed with a
//! 6-digit code mailed to the account's address:
//!
//! 1. [`VerificationCodes::issue`] generates a code, caches it under a key
//!    scoped by purpose and address, and mails it.
//! 2. [`VerificationCodes::redeem`] accepts exactly one matching code before
//!    it expires, then removes it.
//!
//! A mail failure after the cache write is logged and tolerated: the cached
//! code stays usable.

use std::fmt;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::cache::CodeCache;
use crate::error::{CacheError, CodeError};
use crate::mail::MailSender;

/// Number of digits in a verification code.
pub const CODE_LENGTH: usize = 6;

// =============================================================================
// CodePurpose
// =============================================================================

/// What a verification code authorizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodePurpose {
    /// Account registration.
    Register,
    /// Password change.
    UpdatePassword,
    /// Profile change.
    UpdateUser,
}

impl CodePurpose {
    /// Returns the cache key prefix for this purpose.
    pub fn key_prefix(&self) -> &'static str {
        match self {
            CodePurpose::Register => "captcha_",
            CodePurpose::UpdatePassword => "update_password_captcha_",
            CodePurpose::UpdateUser => "update_user_captcha_",
        }
    }

    /// Returns the cache key for `address`.
    pub fn cache_key(&self, address: &str) -> String {
        format!("{}{}", self.key_prefix(), address)
    }

    fn subject(&self) -> &'static str {
        match self {
            CodePurpose::Register => "Meeting room booking - registration code",
            CodePurpose::UpdatePassword => "Password change code",
            CodePurpose::UpdateUser => "Profile change code",
        }
    }

    fn body(&self, code: &str) -> String {
        match self {
            CodePurpose::Register => {
                format!("<p>Your verification code is <b>{}</b>. Keep it safe.</p>", code)
            }
            CodePurpose::UpdatePassword => {
                format!("<p>Your password change code is {}</p>", code)
            }
            CodePurpose::UpdateUser => format!("<p>Your verification code is {}</p>", code),
        }
    }
}

impl fmt::Display for CodePurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CodePurpose::Register => "register",
            CodePurpose::UpdatePassword => "update_password",
            CodePurpose::UpdateUser => "update_user",
        };
        f.write_str(name)
    }
}

// =============================================================================
// CaptchaConfig
// =============================================================================

/// Lifetimes of verification codes, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptchaConfig {
    /// Registration code lifetime.
    pub register_ttl_secs: u64,
    /// Password change code lifetime.
    pub update_password_ttl_secs: u64,
    /// Profile change code lifetime.
    pub update_user_ttl_secs: u64,
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            register_ttl_secs: 5 * 60,
            update_password_ttl_secs: 10 * 60,
            update_user_ttl_secs: 10 * 60,
        }
    }
}

impl CaptchaConfig {
    /// Returns the lifetime for `purpose`.
    pub fn ttl_secs(&self, purpose: CodePurpose) -> u64 {
        match purpose {
            CodePurpose::Register => self.register_ttl_secs,
            CodePurpose::UpdatePassword => self.update_password_ttl_secs,
            CodePurpose::UpdateUser => self.update_user_ttl_secs,
        }
    }
}

// =============================================================================
// VerificationCodes
// =============================================================================

/// Issues and redeems verification codes.
#[derive(Clone)]
pub struct VerificationCodes {
    cache: Arc<dyn CodeCache>,
    mail: Arc<dyn MailSender>,
    config: CaptchaConfig,
}

impl VerificationCodes {
    /// Creates the exchange over the given cache and mail sender.
    pub fn new(cache: Arc<dyn CodeCache>, mail: Arc<dyn MailSender>, config: CaptchaConfig) -> Self {
        Self {
            cache,
            mail,
            config,
        }
    }

    /// Generates a random code of [`CODE_LENGTH`] digits.
    pub fn generate_code() -> String {
        let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
        format!("{:06}", n)
    }

    /// Issues a code for `address` and mails it.
    ///
    /// Returns the code. Fails only if the cache write fails.
    pub async fn issue(&self, purpose: CodePurpose, address: &str) -> Result<String, CacheError> {
        let code = Self::generate_code();
        let key = purpose.cache_key(address);

        self.cache
            .set(&key, &code, self.config.ttl_secs(purpose))
            .await?;

        if let Err(e) = self
            .mail
            .send(address, purpose.subject(), &purpose.body(&code))
            .await
        {
            tracing::warn!(
                error = %e,
                purpose = %purpose,
                address = %address,
                "Verification mail failed; the cached code remains valid"
            );
        } else {
            tracing::debug!(purpose = %purpose, address = %address, "Verification code issued");
        }

        Ok(code)
    }

    /// Redeems a code. A successful redemption consumes it.
    pub async fn redeem(&self, purpose: CodePurpose, address: &str, code: &str) -> Result<(), CodeError> {
        let key = purpose.cache_key(address);

        let stored = self.cache.get(&key).await?.ok_or(CodeError::Expired)?;
        if stored != code {
            return Err(CodeError::Mismatch);
        }

        // Two concurrent redemptions may both read the code; only the one that
        // removes it wins.
        if !self.cache.remove(&key).await? {
            return Err(CodeError::Expired);
        }

        Ok(())
    }
}

impl fmt::Debug for VerificationCodes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationCodes")
            .field("config", &self.config)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCodeCache;
    use crate::mail::MemoryMailSender;

    fn exchange() -> (VerificationCodes, Arc<MemoryCodeCache>, Arc<MemoryMailSender>) {
        let cache = Arc::new(MemoryCodeCache::new());
        let mail = Arc::new(MemoryMailSender::new());
        let codes = VerificationCodes::new(cache.clone(), mail.clone(), CaptchaConfig::default());
        (codes, cache, mail)
    }

    #[test]
    fn test_generate_code_shape() {
        for _ in 0..100 {
            let code = VerificationCodes::generate_code();
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_cache_keys() {
        assert_eq!(
            CodePurpose::Register.cache_key("a@example.com"),
            "captcha_a@example.com"
        );
        assert_eq!(
            CodePurpose::UpdatePassword.cache_key("a@example.com"),
            "update_password_captcha_a@example.com"
        );
        assert_eq!(
            CodePurpose::UpdateUser.cache_key("a@example.com"),
            "update_user_captcha_a@example.com"
        );
    }

    #[tokio::test]
    async fn test_issue_caches_and_mails() {
        let (codes, cache, mail) = exchange();

        let code = codes
            .issue(CodePurpose::Register, "a@example.com")
            .await
            .unwrap();

        assert_eq!(
            cache.get("captcha_a@example.com").await.unwrap(),
            Some(code.clone())
        );
        let message = mail.last_to("a@example.com").unwrap();
        assert!(message.html.contains(&code));
    }

    #[tokio::test]
    async fn test_redeem_is_single_use() {
        let (codes, _, _) = exchange();
        let code = codes
            .issue(CodePurpose::UpdatePassword, "a@example.com")
            .await
            .unwrap();

        codes
            .redeem(CodePurpose::UpdatePassword, "a@example.com", &code)
            .await
            .unwrap();

        assert!(matches!(
            codes
                .redeem(CodePurpose::UpdatePassword, "a@example.com", &code)
                .await,
            Err(CodeError::Expired)
        ));
    }

    #[tokio::test]
    async fn test_mismatch_keeps_code() {
        let (codes, _, _) = exchange();
        let code = codes
            .issue(CodePurpose::Register, "a@example.com")
            .await
            .unwrap();
        let wrong = if code == "000000" { "000001" } else { "000000" };

        assert!(matches!(
            codes.redeem(CodePurpose::Register, "a@example.com", wrong).await,
            Err(CodeError::Mismatch)
        ));
        codes
            .redeem(CodePurpose::Register, "a@example.com", &code)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_purposes_do_not_cross() {
        let (codes, _, _) = exchange();
        let code = codes
            .issue(CodePurpose::Register, "a@example.com")
            .await
            .unwrap();

        assert!(matches!(
            codes
                .redeem(CodePurpose::UpdateUser, "a@example.com", &code)
                .await,
            Err(CodeError::Expired)
        ));
    }

    #[tokio::test]
    async fn test_expired_code() {
        let cache = Arc::new(MemoryCodeCache::new());
        let mail = Arc::new(MemoryMailSender::new());
        let config = CaptchaConfig {
            register_ttl_secs: 0,
            ..Default::default()
        };
        let codes = VerificationCodes::new(cache, mail, config);

        let code = codes
            .issue(CodePurpose::Register, "a@example.com")
            .await
            .unwrap();

        assert!(matches!(
            codes.redeem(CodePurpose::Register, "a@example.com", &code).await,
            Err(CodeError::Expired)
        ));
    }

    #[tokio::test]
    async fn test_mail_failure_tolerated() {
        let (codes, _, mail) = exchange();
        mail.set_failing(true);

        let code = codes
            .issue(CodePurpose::UpdateUser, "a@example.com")
            .await
            .unwrap();

        assert!(mail.sent().is_empty());
        codes
            .redeem(CodePurpose::UpdateUser, "a@example.com", &code)
            .await
            .unwrap();
    }
}
