//! Phone ownership verification with short-lived numeric codes.
//!
//! A [`PhoneVerification`] moves from `Issued` to exactly one of `Verified`,
//! `Expired` or `Exhausted`. The [`VerificationStore`] keeps records in memory
//! and serializes attempts per record.

mod error;
mod store;
mod verification;

pub use error::{VerificationError, VerifyError};
pub use store::VerificationStore;
pub use verification::{
    dispatch, generate_code, PhoneVerification, VerificationPolicy, VerificationState,
    DEFAULT_CODE_LENGTH, DEFAULT_MAX_ATTEMPTS, DEFAULT_TTL, MAX_TTL,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use telnyx_client::TelnyxClient;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store() -> VerificationStore {
        VerificationStore::without_cleanup(VerificationPolicy::default())
    }

    fn wrong(code: &str) -> String {
        code.chars().map(|c| if c == '1' { '2' } else { '1' }).collect()
    }

    #[tokio::test]
    async fn test_store_issue_and_verify() {
        let store = store();

        let v = store.issue("u1", "555 123 4567").await.unwrap();
        assert_eq!(v.phone_number, "+15551234567");
        assert_eq!(store.pending_count().await, 1);

        // Any spelling of the same number finds the record
        tokio_test::assert_ok!(
            store
                .attempt("u1", "(555) 123-4567", &v.verification_code)
                .await
        );

        let stored = store.get("u1", "+15551234567").await.unwrap().unwrap();
        assert!(stored.verified);
        assert_eq!(store.pending_count().await, 0);

        let again = store.attempt("u1", "5551234567", &v.verification_code).await;
        assert!(matches!(
            again,
            Err(VerificationError::Attempt(VerifyError::AlreadyVerified))
        ));
    }

    #[tokio::test]
    async fn test_store_records_are_per_user() {
        let store = store();

        let v1 = store.issue("u1", "5551234567").await.unwrap();
        let v2 = store.issue("u2", "5551234567").await.unwrap();

        let result = store.attempt("u3", "5551234567", &v1.verification_code).await;
        assert!(matches!(result, Err(VerificationError::NotFound)));

        tokio_test::assert_ok!(store.attempt("u2", "5551234567", &v2.verification_code).await);
        assert!(!store.get("u1", "5551234567").await.unwrap().unwrap().verified);
    }

    #[tokio::test]
    async fn test_store_reissue_replaces_code() {
        let store = store();

        store.issue("u1", "5551234567").await.unwrap();
        let first = store.get("u1", "5551234567").await.unwrap().unwrap();
        let wrong_code = wrong(&first.verification_code);
        let _ = store.attempt("u1", "5551234567", &wrong_code).await;

        let second = store.issue("u1", "5551234567").await.unwrap();
        let stored = store.get("u1", "5551234567").await.unwrap().unwrap();

        assert_eq!(stored.verification_code, second.verification_code);
        assert_eq!(stored.attempts, 0);
    }

    #[tokio::test]
    async fn test_store_invalid_phone() {
        let store = store();

        assert!(matches!(
            store.issue("u1", "not a phone").await,
            Err(VerificationError::InvalidPhoneNumber(_))
        ));
        assert!(matches!(
            store.attempt("u1", "42", "123456").await,
            Err(VerificationError::InvalidPhoneNumber(_))
        ));
        assert!(store.get("u1", "5551234567").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_concurrent_attempts_never_exceed_max() {
        let store = store();
        let v = store.issue("u1", "5551234567").await.unwrap();
        let wrong_code = wrong(&v.verification_code);

        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = store.clone();
            let code = wrong_code.clone();
            handles.push(tokio::spawn(async move {
                store.attempt("u1", "5551234567", &code).await
            }));
        }

        let mut mismatches = 0;
        let mut exhausted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Err(VerificationError::Attempt(VerifyError::CodeMismatch { .. })) => {
                    mismatches += 1
                }
                Err(VerificationError::Attempt(VerifyError::AttemptsExhausted)) => exhausted += 1,
                other => panic!("unexpected result: {:?}", other),
            }
        }

        assert_eq!(mismatches, 3);
        assert_eq!(exhausted, 17);

        let stored = store.get("u1", "5551234567").await.unwrap().unwrap();
        assert_eq!(stored.attempts, 3);
    }

    #[tokio::test]
    async fn test_store_purge_inactive() {
        let store = store();

        let verified = store.issue("u1", "5551234567").await.unwrap();
        store
            .attempt("u1", "5551234567", &verified.verification_code)
            .await
            .unwrap();

        let exhausted = store.issue("u2", "5551234567").await.unwrap();
        let wrong_code = wrong(&exhausted.verification_code);
        for _ in 0..3 {
            let _ = store.attempt("u2", "5551234567", &wrong_code).await;
        }

        store.issue("u3", "5551234567").await.unwrap();

        assert_eq!(store.purge_inactive().await, 2);
        assert!(store.get("u1", "5551234567").await.unwrap().is_none());
        assert!(store.get("u2", "5551234567").await.unwrap().is_none());
        assert!(store.get("u3", "5551234567").await.unwrap().is_some());
        assert_eq!(store.pending_count().await, 1);
    }

    #[tokio::test]
    async fn test_store_purge_expired() {
        let policy = VerificationPolicy {
            ttl: Duration::from_millis(20),
            ..VerificationPolicy::default()
        };
        let store = VerificationStore::without_cleanup(policy);

        let v = store.issue("u1", "5551234567").await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let result = store.attempt("u1", "5551234567", &v.verification_code).await;
        assert!(matches!(
            result,
            Err(VerificationError::Attempt(VerifyError::Expired))
        ));
        assert_eq!(store.purge_inactive().await, 1);
    }

    #[tokio::test]
    async fn test_store_send_code() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "id": "otp-9" }
            })))
            .expect(2)
            .mount(&mock_server)
            .await;

        let gateway = TelnyxClient::new("key", mock_server.uri(), Duration::from_secs(5)).unwrap();
        let store = store();
        let v = store.issue("u1", "5551234567").await.unwrap();

        // Resending reuses the same code
        for _ in 0..2 {
            let sent = store
                .send_code("u1", "5551234567", "+14155550000", &gateway)
                .await
                .unwrap();
            assert_eq!(sent.id, "otp-9");
        }

        let stored = store.get("u1", "5551234567").await.unwrap().unwrap();
        assert_eq!(stored.verification_code, v.verification_code);
    }

    #[tokio::test]
    async fn test_store_send_code_refuses_finished_record() {
        let gateway =
            TelnyxClient::new("key", "http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let store = store();

        let v = store.issue("u1", "5551234567").await.unwrap();
        store
            .attempt("u1", "5551234567", &v.verification_code)
            .await
            .unwrap();

        let result = store
            .send_code("u1", "5551234567", "+14155550000", &gateway)
            .await;
        assert!(matches!(
            result,
            Err(VerificationError::Attempt(VerifyError::AlreadyVerified))
        ));

        let result = store
            .send_code("nobody", "5551234567", "+14155550000", &gateway)
            .await;
        assert!(matches!(result, Err(VerificationError::NotFound)));
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&VerificationState::Issued).unwrap();
        assert_eq!(json, "\"issued\"");

        let json = serde_json::to_string(&VerificationState::Exhausted).unwrap();
        assert_eq!(json, "\"exhausted\"");
    }
}
