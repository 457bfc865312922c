//! Webhook signature computation and verification.
//!
//! The provider signs `timestamp | raw_body` with HMAC-SHA256 and sends the
//! lowercase hex digest in a header. Verification must run over the body bytes
//! exactly as received: re-serializing parsed JSON changes whitespace and key
//! order and breaks the digest.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Separator between timestamp and body in the signed payload.
const SEPARATOR: &[u8] = b"|";

fn mac_for(secret: &[u8], timestamp: &str, raw_body: &[u8]) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(timestamp.as_bytes());
    mac.update(SEPARATOR);
    mac.update(raw_body);
    mac
}

/// Compute the lowercase hex signature for a payload.
pub fn compute_digest(secret: &[u8], timestamp: &str, raw_body: &[u8]) -> String {
    hex::encode(mac_for(secret, timestamp, raw_body).finalize().into_bytes())
}

/// Check a supplied signature against the payload.
///
/// Returns `false` for any mismatch, including signatures that are not hex or
/// have the wrong length. The supplied value is hex-decoded before the
/// constant-time comparison, so hex case does not matter. Whitespace is not
/// stripped here.
pub fn verify(secret: &[u8], timestamp: &str, raw_body: &[u8], supplied: &str) -> bool {
    let Ok(supplied) = hex::decode(supplied) else {
        return false;
    };

    mac_for(secret, timestamp, raw_body)
        .verify_slice(&supplied)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"whsec_test";
    const TIMESTAMP: &str = "1700000000";
    const BODY: &[u8] = br#"{"data":{"event_type":"message.received","id":"evt-1"}}"#;

    #[test]
    fn test_digest_covers_timestamp_separator_and_body() {
        let mut mac = HmacSha256::new_from_slice(b"key").unwrap();
        mac.update(b"The quick brown fox| jumps over the lazy dog");
        let expected = hex::encode(mac.finalize().into_bytes());

        assert_eq!(
            compute_digest(b"key", "The quick brown fox", b" jumps over the lazy dog"),
            expected
        );
    }

    #[test]
    fn test_digest_is_lowercase_hex() {
        let digest = compute_digest(SECRET, TIMESTAMP, BODY);
        assert_eq!(digest.len(), 64);
        assert!(digest
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_round_trip() {
        let signature = compute_digest(SECRET, TIMESTAMP, BODY);
        assert!(verify(SECRET, TIMESTAMP, BODY, &signature));
    }

    #[test]
    fn test_uppercase_signature_accepted() {
        let signature = compute_digest(SECRET, TIMESTAMP, BODY).to_uppercase();
        assert!(verify(SECRET, TIMESTAMP, BODY, &signature));
    }

    #[test]
    fn test_padded_signature_rejected() {
        let signature = compute_digest(SECRET, TIMESTAMP, BODY);
        assert!(!verify(SECRET, TIMESTAMP, BODY, &format!(" {}", signature)));
        assert!(!verify(SECRET, TIMESTAMP, BODY, &format!("{}\n", signature)));
    }

    #[test]
    fn test_body_bit_flip_rejected() {
        let signature = compute_digest(SECRET, TIMESTAMP, BODY);

        for i in 0..BODY.len() {
            let mut tampered = BODY.to_vec();
            tampered[i] ^= 0x01;
            assert!(!verify(SECRET, TIMESTAMP, &tampered, &signature));
        }
    }

    #[test]
    fn test_timestamp_change_rejected() {
        let signature = compute_digest(SECRET, TIMESTAMP, BODY);
        assert!(!verify(SECRET, "1700000001", BODY, &signature));
        assert!(!verify(SECRET, "", BODY, &signature));
    }

    #[test]
    fn test_separator_is_part_of_payload() {
        // Moving bytes across the separator changes the digest
        let a = compute_digest(SECRET, "12", b"34");
        let b = compute_digest(SECRET, "123", b"4");
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let signature = compute_digest(SECRET, TIMESTAMP, BODY);
        assert!(!verify(b"other", TIMESTAMP, BODY, &signature));
    }

    #[test]
    fn test_malformed_signatures_rejected() {
        let signature = compute_digest(SECRET, TIMESTAMP, BODY);

        assert!(!verify(SECRET, TIMESTAMP, BODY, ""));
        assert!(!verify(SECRET, TIMESTAMP, BODY, "not-hex"));
        assert!(!verify(SECRET, TIMESTAMP, BODY, &signature[..62]));
        assert!(!verify(SECRET, TIMESTAMP, BODY, &format!("{}00", signature)));
        assert!(!verify(SECRET, TIMESTAMP, BODY, &signature[..63]));
    }

    #[test]
    fn test_reserialized_body_rejected() {
        let raw = br#"{ "data": { "id": "evt-1", "event_type": "message.received" } }"#;
        let signature = compute_digest(SECRET, TIMESTAMP, raw);

        let parsed: serde_json::Value = serde_json::from_slice(raw).unwrap();
        let reserialized = serde_json::to_vec(&parsed).unwrap();

        assert_ne!(raw.as_slice(), reserialized.as_slice());
        assert!(verify(SECRET, TIMESTAMP, raw, &signature));
        assert!(!verify(SECRET, TIMESTAMP, &reserialized, &signature));
    }
}
