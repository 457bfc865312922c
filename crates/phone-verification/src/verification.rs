//! The verification record and its state machine.

use crate::error::VerifyError;
use chrono::{DateTime, Utc};
use rand::{rngs::OsRng, Rng};
use serde::Serialize;
use std::time::Duration;
use subtle::ConstantTimeEq;
use telnyx_client::{phone, GatewayError, PhoneError, SentMessage, TelnyxClient};
use tracing::{debug, info, instrument};

pub const DEFAULT_CODE_LENGTH: usize = 6;
pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Longest code lifetime accepted by configuration.
pub const MAX_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Tunables for issuing codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationPolicy {
    pub code_length: usize,
    pub ttl: Duration,
    pub max_attempts: u32,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            code_length: DEFAULT_CODE_LENGTH,
            ttl: DEFAULT_TTL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl VerificationPolicy {
    /// Expiry for a code issued at `now`. The TTL is used as given; it
    /// saturates only past the largest representable time.
    fn expiry_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        chrono::Duration::from_std(self.ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Where a verification stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationState {
    /// Code sent, still accepting attempts
    Issued,
    /// Correct code supplied
    Verified,
    /// Past its expiry time
    Expired,
    /// Out of attempts
    Exhausted,
}

impl VerificationState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, VerificationState::Issued)
    }
}

/// One attempt at proving ownership of a phone number.
#[derive(Clone, Serialize)]
pub struct PhoneVerification {
    pub user_id: String,
    /// Canonical E.164 number.
    pub phone_number: String,
    #[serde(skip_serializing)]
    pub verification_code: String,
    pub attempts: u32,
    pub max_attempts: u32,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub verified: bool,
}

impl PhoneVerification {
    /// Issue a fresh code for `user_id` and the (raw) phone number.
    pub fn issue(
        user_id: impl Into<String>,
        phone_number: &str,
        policy: &VerificationPolicy,
    ) -> Result<Self, PhoneError> {
        Self::issue_at(user_id, phone_number, policy, Utc::now())
    }

    /// Same as [`PhoneVerification::issue`] with an explicit clock.
    pub fn issue_at(
        user_id: impl Into<String>,
        phone_number: &str,
        policy: &VerificationPolicy,
        now: DateTime<Utc>,
    ) -> Result<Self, PhoneError> {
        let phone_number = phone::normalize_valid(phone_number)?;

        Ok(Self {
            user_id: user_id.into(),
            phone_number,
            verification_code: generate_code(policy.code_length),
            attempts: 0,
            max_attempts: policy.max_attempts,
            issued_at: now,
            expires_at: policy.expiry_from(now),
            verified: false,
        })
    }

    /// Check a supplied code.
    pub fn attempt(&mut self, code: &str) -> Result<(), VerifyError> {
        self.attempt_at(code, Utc::now())
    }

    /// Check a supplied code against the record as of `now`.
    ///
    /// Terminal conditions are checked before the code, so a wrong code on an
    /// expired or exhausted record never consumes an attempt. The code must
    /// match exactly; callers strip surrounding whitespace from user input.
    pub fn attempt_at(&mut self, code: &str, now: DateTime<Utc>) -> Result<(), VerifyError> {
        if self.verified {
            return Err(VerifyError::AlreadyVerified);
        }

        if now > self.expires_at {
            return Err(VerifyError::Expired);
        }

        if self.attempts >= self.max_attempts {
            return Err(VerifyError::AttemptsExhausted);
        }

        let matches: bool = self
            .verification_code
            .as_bytes()
            .ct_eq(code.as_bytes())
            .into();

        if !matches {
            self.attempts += 1;
            return Err(VerifyError::CodeMismatch {
                attempts_remaining: self.max_attempts - self.attempts,
            });
        }

        self.verified = true;
        Ok(())
    }

    /// Current state as of `now`.
    pub fn state_at(&self, now: DateTime<Utc>) -> VerificationState {
        if self.verified {
            VerificationState::Verified
        } else if now > self.expires_at {
            VerificationState::Expired
        } else if self.attempts >= self.max_attempts {
            VerificationState::Exhausted
        } else {
            VerificationState::Issued
        }
    }

    pub fn state(&self) -> VerificationState {
        self.state_at(Utc::now())
    }

    /// Lifetime of the code in whole minutes (at least one).
    pub fn ttl_minutes(&self) -> i64 {
        (self.expires_at - self.issued_at).num_minutes().max(1)
    }

    /// Text of the SMS carrying the code.
    pub fn message_text(&self) -> String {
        format!(
            "Your verification code is: {}. It will expire in {} minutes.",
            self.verification_code,
            self.ttl_minutes()
        )
    }
}

impl std::fmt::Debug for PhoneVerification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhoneVerification")
            .field("user_id", &self.user_id)
            .field("phone_number", &phone::mask(&self.phone_number))
            .field("verification_code", &"<redacted>")
            .field("attempts", &self.attempts)
            .field("max_attempts", &self.max_attempts)
            .field("expires_at", &self.expires_at)
            .field("verified", &self.verified)
            .finish()
    }
}

/// Generate a numeric code with each digit drawn independently from the OS RNG.
pub fn generate_code(length: usize) -> String {
    let mut rng = OsRng;
    (0..length.max(1))
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Send the code to the verification's phone number.
///
/// The record is left untouched whatever the outcome, so a failed send can be
/// retried with the same code.
#[instrument(skip(verification, gateway), fields(to = %phone::mask(&verification.phone_number)))]
pub async fn dispatch(
    verification: &PhoneVerification,
    sender: &str,
    gateway: &TelnyxClient,
) -> Result<SentMessage, GatewayError> {
    debug!(user_id = %verification.user_id, "Dispatching verification code");

    let sent = gateway
        .send(sender, &verification.phone_number, &verification.message_text())
        .await?;

    info!(message_id = %sent.id, "Verification code sent");
    Ok(sent)
}
