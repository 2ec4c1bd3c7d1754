//! Stripe webhook signature verification.
//!
//! HMAC-SHA256 over `"{timestamp}.{payload}"` with a replay window.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::stripe_event::StripeEvent;
use super::webhook_errors::WebhookError;

/// Maximum allowed age for webhook events (5 minutes).
const MAX_EVENT_AGE_SECS: i64 = 300;

/// Maximum allowed clock skew for future events (1 minute).
const MAX_CLOCK_SKEW_SECS: i64 = 60;

type HmacSha256 = Hmac<Sha256>;

/// Parsed components of the Stripe-Signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    /// Every v1 signature present. Stripe sends several while a secret is
    /// being rolled.
    pub v1_signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    /// Parses `t=<timestamp>,v1=<signature>[,v1=<signature>...]`.
    ///
    /// Unknown keys (including legacy `v0`) are skipped.
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp: Option<i64> = None;
        let mut v1_signatures = Vec::new();

        for part in header.split(',') {
            let (key, value) = part
                .trim()
                .split_once('=')
                .ok_or_else(|| WebhookError::ParseError("invalid header format".to_string()))?;

            match key {
                "t" => {
                    timestamp = Some(value.parse().map_err(|_| {
                        WebhookError::ParseError("invalid timestamp".to_string())
                    })?);
                }
                "v1" => {
                    v1_signatures.push(hex::decode(value).map_err(|_| {
                        WebhookError::ParseError("invalid v1 signature hex".to_string())
                    })?);
                }
                _ => {}
            }
        }

        let timestamp =
            timestamp.ok_or_else(|| WebhookError::ParseError("missing timestamp".to_string()))?;
        if v1_signatures.is_empty() {
            return Err(WebhookError::ParseError("missing v1 signature".to_string()));
        }

        Ok(SignatureHeader {
            timestamp,
            v1_signatures,
        })
    }
}

/// Verifier for Stripe webhook signatures.
pub struct StripeWebhookVerifier {
    secret: SecretString,
}

impl StripeWebhookVerifier {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Verifies the signature header and parses the event.
    ///
    /// # Errors
    ///
    /// - `ParseError` - malformed header or JSON payload
    /// - `TimestampOutOfRange` - signed more than 5 minutes ago
    /// - `InvalidTimestamp` - signed in the future beyond clock skew
    /// - `InvalidSignature` - no v1 signature matches
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<StripeEvent, WebhookError> {
        let header = SignatureHeader::parse(signature_header)?;
        validate_timestamp(header.timestamp, chrono::Utc::now().timestamp())?;

        let expected = self.compute_signature(header.timestamp, payload)?;
        if !header
            .v1_signatures
            .iter()
            .any(|candidate| constant_time_compare(&expected, candidate))
        {
            return Err(WebhookError::InvalidSignature);
        }

        serde_json::from_slice(payload).map_err(|e| WebhookError::ParseError(e.to_string()))
    }

    /// Builds a Stripe-Signature header value for `payload`, the way Stripe
    /// signs deliveries. Used by local tooling and tests.
    pub fn signature_header(&self, timestamp: i64, payload: &[u8]) -> Result<String, WebhookError> {
        let signature = self.compute_signature(timestamp, payload)?;
        Ok(format!("t={},v1={}", timestamp, hex::encode(signature)))
    }

    fn compute_signature(&self, timestamp: i64, payload: &[u8]) -> Result<Vec<u8>, WebhookError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| WebhookError::InvalidSignature)?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

fn validate_timestamp(timestamp: i64, now: i64) -> Result<(), WebhookError> {
    let age = now - timestamp;

    if age > MAX_EVENT_AGE_SECS {
        return Err(WebhookError::TimestampOutOfRange);
    }
    if age < -MAX_CLOCK_SKEW_SECS {
        return Err(WebhookError::InvalidTimestamp);
    }
    Ok(())
}

fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "whsec_test_secret_12345";

    fn verifier(secret: &str) -> StripeWebhookVerifier {
        StripeWebhookVerifier::new(SecretString::new(secret.to_string()))
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    const PAYLOAD: &str = r#"{"id":"evt_test123","type":"checkout.session.completed","created":1704067200,"data":{"object":{}},"livemode":false}"#;

    // ══════════════════════════════════════════════════════════════
    // SignatureHeader Parsing Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn parse_header_with_single_v1() {
        let header = SignatureHeader::parse(&format!("t=1234567890,v1={}", "a".repeat(64))).unwrap();

        assert_eq!(header.timestamp, 1234567890);
        assert_eq!(header.v1_signatures.len(), 1);
        assert_eq!(header.v1_signatures[0].len(), 32);
    }

    #[test]
    fn parse_header_collects_every_v1_and_skips_v0() {
        let header = SignatureHeader::parse(&format!(
            "t=1,v1={},v0={},v1={}",
            "a".repeat(64),
            "b".repeat(64),
            "c".repeat(64)
        ))
        .unwrap();

        assert_eq!(header.v1_signatures.len(), 2);
    }

    #[test]
    fn parse_header_rejects_malformed_input() {
        for header in [
            format!("v1={}", "a".repeat(64)),
            "t=1234567890".to_string(),
            format!("t=not_a_number,v1={}", "a".repeat(64)),
            "t=1234567890,v1=not_valid_hex".to_string(),
            "t1234567890".to_string(),
        ] {
            assert!(
                matches!(SignatureHeader::parse(&header), Err(WebhookError::ParseError(_))),
                "accepted {header}"
            );
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Signature Verification Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn verify_valid_signature() {
        let verifier = verifier(TEST_SECRET);
        let header = verifier.signature_header(now(), PAYLOAD.as_bytes()).unwrap();

        let event = verifier.verify_and_parse(PAYLOAD.as_bytes(), &header).unwrap();

        assert_eq!(event.id, "evt_test123");
    }

    #[test]
    fn verify_accepts_any_matching_v1() {
        let verifier = verifier(TEST_SECRET);
        let ts = now();
        let good = verifier.signature_header(ts, PAYLOAD.as_bytes()).unwrap();
        let good_sig = good.split("v1=").nth(1).unwrap();
        let header = format!("t={},v1={},v1={}", ts, "a".repeat(64), good_sig);

        assert!(verifier.verify_and_parse(PAYLOAD.as_bytes(), &header).is_ok());
    }

    #[test]
    fn verify_wrong_secret_fails() {
        let header = verifier(TEST_SECRET)
            .signature_header(now(), PAYLOAD.as_bytes())
            .unwrap();

        let result = verifier("whsec_other").verify_and_parse(PAYLOAD.as_bytes(), &header);

        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn verify_tampered_payload_fails() {
        let verifier = verifier(TEST_SECRET);
        let header = verifier.signature_header(now(), PAYLOAD.as_bytes()).unwrap();
        let tampered = PAYLOAD.replace("evt_test123", "evt_hacked");

        let result = verifier.verify_and_parse(tampered.as_bytes(), &header);

        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn verify_invalid_json_fails_after_signature_check() {
        let verifier = verifier(TEST_SECRET);
        let payload = b"not valid json";
        let header = verifier.signature_header(now(), payload).unwrap();

        let result = verifier.verify_and_parse(payload, &header);

        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    // ══════════════════════════════════════════════════════════════
    // Timestamp Validation Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn timestamp_window_boundaries() {
        let now = 1_700_000_000;
        assert!(validate_timestamp(now - 120, now).is_ok());
        assert!(validate_timestamp(now - 300, now).is_ok());
        assert!(matches!(
            validate_timestamp(now - 301, now),
            Err(WebhookError::TimestampOutOfRange)
        ));
        assert!(validate_timestamp(now + 60, now).is_ok());
        assert!(matches!(
            validate_timestamp(now + 61, now),
            Err(WebhookError::InvalidTimestamp)
        ));
    }

    #[test]
    fn stale_delivery_is_rejected() {
        let verifier = verifier(TEST_SECRET);
        let header = verifier
            .signature_header(now() - 600, PAYLOAD.as_bytes())
            .unwrap();

        let result = verifier.verify_and_parse(PAYLOAD.as_bytes(), &header);

        assert!(matches!(result, Err(WebhookError::TimestampOutOfRange)));
    }

    #[test]
    fn constant_time_compare_checks_length_and_content() {
        assert!(constant_time_compare(&[1, 2, 3], &[1, 2, 3]));
        assert!(!constant_time_compare(&[1, 2, 3], &[1, 2, 4]));
        assert!(!constant_time_compare(&[1, 2, 3], &[1, 2, 3, 4]));
        assert!(constant_time_compare(&[], &[]));
    }
}
