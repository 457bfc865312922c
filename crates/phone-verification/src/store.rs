//! In-memory verification store with per-record locking.

use crate::error::{VerificationError, VerifyError};
use crate::verification::{dispatch, PhoneVerification, VerificationPolicy, VerificationState};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use telnyx_client::{phone, SentMessage, TelnyxClient};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

/// Records are keyed by user and canonical phone number.
type Key = (String, String);

/// Shared store of outstanding verifications.
///
/// Each record sits behind its own mutex, so concurrent attempts against the
/// same record are serialized while different users never contend.
#[derive(Clone)]
pub struct VerificationStore {
    records: Arc<RwLock<HashMap<Key, Arc<Mutex<PhoneVerification>>>>>,
    policy: VerificationPolicy,
}

impl VerificationStore {
    /// Create a new store.
    ///
    /// Spawns a background task that drops finished records once a minute.
    pub fn new(policy: VerificationPolicy) -> Self {
        let store = Self::without_cleanup(policy);

        let cleanup_store = store.clone();
        tokio::spawn(async move {
            cleanup_store.cleanup_loop().await;
        });

        info!(
            "Verification store initialized (code_length={}, ttl={:?}, max_attempts={})",
            policy.code_length, policy.ttl, policy.max_attempts
        );

        store
    }

    /// Create a store without the background cleanup task.
    pub fn without_cleanup(policy: VerificationPolicy) -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            policy,
        }
    }

    pub fn policy(&self) -> &VerificationPolicy {
        &self.policy
    }

    async fn cleanup_loop(&self) {
        let cleanup_interval = Duration::from_secs(60);

        loop {
            tokio::time::sleep(cleanup_interval).await;
            let removed = self.purge_inactive().await;
            if removed > 0 {
                debug!("Purged {} finished verifications", removed);
            }
        }
    }

    fn key(user_id: &str, phone_number: &str) -> Result<Key, VerificationError> {
        Ok((user_id.to_string(), phone::normalize(phone_number)?))
    }

    async fn record(
        &self,
        user_id: &str,
        phone_number: &str,
    ) -> Result<Arc<Mutex<PhoneVerification>>, VerificationError> {
        let key = Self::key(user_id, phone_number)?;
        let records = self.records.read().await;
        records.get(&key).cloned().ok_or(VerificationError::NotFound)
    }

    /// Issue a new code, replacing any earlier one for the same user and number.
    #[instrument(skip(self, phone_number))]
    pub async fn issue(
        &self,
        user_id: &str,
        phone_number: &str,
    ) -> Result<PhoneVerification, VerificationError> {
        let verification = PhoneVerification::issue(user_id, phone_number, &self.policy)?;
        let key = (verification.user_id.clone(), verification.phone_number.clone());

        let mut records = self.records.write().await;
        if records
            .insert(key, Arc::new(Mutex::new(verification.clone())))
            .is_some()
        {
            debug!("Replaced earlier verification");
        }

        info!(
            phone_number = %phone::mask(&verification.phone_number),
            expires_at = %verification.expires_at,
            "Verification issued"
        );

        Ok(verification)
    }

    /// Snapshot of a record.
    pub async fn get(
        &self,
        user_id: &str,
        phone_number: &str,
    ) -> Result<Option<PhoneVerification>, VerificationError> {
        match self.record(user_id, phone_number).await {
            Ok(record) => Ok(Some(record.lock().await.clone())),
            Err(VerificationError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Check a code against the stored record.
    #[instrument(skip(self, phone_number, code))]
    pub async fn attempt(
        &self,
        user_id: &str,
        phone_number: &str,
        code: &str,
    ) -> Result<(), VerificationError> {
        let record = self.record(user_id, phone_number).await?;
        let mut verification = record.lock().await;

        match verification.attempt(code) {
            Ok(()) => {
                info!(
                    phone_number = %phone::mask(&verification.phone_number),
                    "Phone number verified"
                );
                Ok(())
            }
            Err(e) => {
                warn!(
                    phone_number = %phone::mask(&verification.phone_number),
                    attempts = verification.attempts,
                    error = %e,
                    "Verification attempt rejected"
                );
                Err(e.into())
            }
        }
    }

    /// Send (or resend) the stored code.
    ///
    /// Only records still in the `Issued` state are sent.
    pub async fn send_code(
        &self,
        user_id: &str,
        phone_number: &str,
        sender: &str,
        gateway: &TelnyxClient,
    ) -> Result<SentMessage, VerificationError> {
        let record = self.record(user_id, phone_number).await?;
        let verification = record.lock().await.clone();

        match verification.state() {
            VerificationState::Issued => {}
            VerificationState::Verified => return Err(VerifyError::AlreadyVerified.into()),
            VerificationState::Expired => return Err(VerifyError::Expired.into()),
            VerificationState::Exhausted => return Err(VerifyError::AttemptsExhausted.into()),
        }

        Ok(dispatch(&verification, sender, gateway).await?)
    }

    /// Drop every record that can no longer change state.
    pub async fn purge_inactive(&self) -> usize {
        let now = Utc::now();
        let mut records = self.records.write().await;
        let before = records.len();

        let mut keep = HashMap::with_capacity(before);
        for (key, record) in records.drain() {
            let terminal = record.lock().await.state_at(now).is_terminal();
            if !terminal {
                keep.insert(key, record);
            }
        }
        *records = keep;

        before - records.len()
    }

    /// Number of records still accepting attempts.
    pub async fn pending_count(&self) -> usize {
        let now = Utc::now();
        let records = self.records.read().await;
        let mut count = 0;
        for record in records.values() {
            if record.lock().await.state_at(now) == VerificationState::Issued {
                count += 1;
            }
        }
        count
    }
}
