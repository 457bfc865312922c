//! Configuration for the SMS server.

use anyhow::{Context, Result};
use phone_verification::VerificationPolicy;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use telnyx_client::phone;
use thiserror::Error;

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Telnyx credentials and API settings
    #[serde(default)]
    pub telnyx: TelnyxConfig,

    /// Inbound webhook configuration
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Phone verification configuration
    #[serde(default)]
    pub verification: VerificationConfig,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelnyxConfig {
    /// API key used as bearer token for outbound requests
    #[serde(default)]
    pub api_key: Option<SecretString>,

    /// Public key issued for webhook verification
    #[serde(default)]
    pub public_key: Option<SecretString>,

    /// Messaging profile attached to outbound messages
    #[serde(default)]
    pub messaging_profile_id: Option<String>,

    /// Number that outbound messages and verification codes are sent from
    #[serde(default)]
    pub from_number: Option<String>,

    /// Telnyx API base URL
    #[serde(default = "default_telnyx_base_url")]
    pub base_url: String,

    /// Outbound request timeout
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookConfig {
    /// Shared secret for webhook signatures
    #[serde(default)]
    pub signing_secret: Option<SecretString>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerificationConfig {
    /// Number of digits in a code
    #[serde(default = "default_code_length")]
    pub code_length: usize,

    /// How long a code stays valid
    #[serde(default = "default_code_ttl", with = "humantime_serde")]
    pub ttl: Duration,

    /// Wrong codes allowed before the verification locks
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Messages kept by the in-memory message log
    #[serde(default = "default_message_log_capacity")]
    pub message_log_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human readable output
    #[serde(default)]
    pub json: bool,
}

/// Problems found while validating configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Messaging provider not configured, missing: {}", .0.join(", "))]
    NotConfigured(Vec<&'static str>),

    #[error("Sender number is not a valid NANP number: {0}")]
    InvalidFromNumber(String),

    #[error("Verification code length must be between 4 and 10, got {0}")]
    InvalidCodeLength(usize),

    #[error("Verification max attempts must be at least 1")]
    InvalidMaxAttempts,

    #[error("Verification TTL must be between 1s and 24h, got {0:?}")]
    InvalidTtl(Duration),
}

// Default implementations
impl Default for TelnyxConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            public_key: None,
            messaging_profile_id: None,
            from_number: None,
            base_url: default_telnyx_base_url(),
            timeout: default_timeout(),
        }
    }
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            code_length: default_code_length(),
            ttl: default_code_ttl(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
            message_log_capacity: default_message_log_capacity(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value functions
fn default_telnyx_base_url() -> String {
    telnyx_client::DEFAULT_BASE_URL.into()
}

fn default_timeout() -> Duration {
    telnyx_client::DEFAULT_TIMEOUT
}

fn default_code_length() -> usize {
    phone_verification::DEFAULT_CODE_LENGTH
}

fn default_code_ttl() -> Duration {
    phone_verification::DEFAULT_TTL
}

fn default_max_attempts() -> u32 {
    phone_verification::DEFAULT_MAX_ATTEMPTS
}

fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    3001
}

fn default_message_log_capacity() -> usize {
    1000
}

fn default_log_level() -> String {
    "info".into()
}

fn is_blank(secret: &Option<SecretString>) -> bool {
    secret
        .as_ref()
        .map(|s| s.expose_secret().trim().is_empty())
        .unwrap_or(true)
}

impl Config {
    /// Load and validate configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    /// Names of the provider settings that are missing or empty.
    pub fn missing_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();

        if is_blank(&self.telnyx.api_key) {
            missing.push("TELNYX__API_KEY");
        }
        if is_blank(&self.telnyx.public_key) {
            missing.push("TELNYX__PUBLIC_KEY");
        }
        if self
            .telnyx
            .messaging_profile_id
            .as_deref()
            .map_or(true, |id| id.trim().is_empty())
        {
            missing.push("TELNYX__MESSAGING_PROFILE_ID");
        }
        if is_blank(&self.webhook.signing_secret) {
            missing.push("WEBHOOK__SIGNING_SECRET");
        }
        if self
            .telnyx
            .from_number
            .as_deref()
            .map_or(true, |n| n.trim().is_empty())
        {
            missing.push("TELNYX__FROM_NUMBER");
        }

        missing
    }

    /// True when every provider credential is present.
    pub fn is_configured(&self) -> bool {
        self.missing_settings().is_empty()
    }

    /// Check the configuration before anything is built from it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let missing = self.missing_settings();
        if !missing.is_empty() {
            return Err(ConfigError::NotConfigured(missing));
        }

        let from = self.from_number();
        if !phone::is_valid(from) {
            return Err(ConfigError::InvalidFromNumber(from.to_string()));
        }

        if !(4..=10).contains(&self.verification.code_length) {
            return Err(ConfigError::InvalidCodeLength(self.verification.code_length));
        }

        if self.verification.max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts);
        }

        let ttl = self.verification.ttl;
        if ttl < Duration::from_secs(1) || ttl > phone_verification::MAX_TTL {
            return Err(ConfigError::InvalidTtl(ttl));
        }

        Ok(())
    }

    /// Sender number, empty if unset.
    pub fn from_number(&self) -> &str {
        self.telnyx.from_number.as_deref().unwrap_or_default()
    }

    /// Verification policy derived from the verification section.
    pub fn verification_policy(&self) -> VerificationPolicy {
        VerificationPolicy {
            code_length: self.verification.code_length,
            ttl: self.verification.ttl,
            max_attempts: self.verification.max_attempts,
        }
    }
}
