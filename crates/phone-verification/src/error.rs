//! Verification errors.

use telnyx_client::{GatewayError, PhoneError};
use thiserror::Error;

/// Why a code attempt was rejected.
///
/// These are expected outcomes of the flow and are meant to be shown to the
/// user, so they carry no source errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("Phone number already verified")]
    AlreadyVerified,

    #[error("Verification code expired")]
    Expired,

    #[error("Too many verification attempts")]
    AttemptsExhausted,

    #[error("Invalid verification code")]
    CodeMismatch { attempts_remaining: u32 },
}

/// Errors from the verification store.
#[derive(Error, Debug)]
pub enum VerificationError {
    #[error(transparent)]
    InvalidPhoneNumber(#[from] PhoneError),

    #[error("No verification pending for this phone number")]
    NotFound,

    #[error(transparent)]
    Attempt(#[from] VerifyError),

    #[error("Failed to send verification code: {0}")]
    Gateway(#[from] GatewayError),
}
