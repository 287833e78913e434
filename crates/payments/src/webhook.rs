//! Webhook authentication and payload schema for the payment processor.

use ring::hmac;
use serde::Deserialize;

/// Header carrying the signature timestamp.
pub const TIMESTAMP_HEADER: &str = "x-ping-timestamp";

/// Header carrying the hex-encoded HMAC signature.
pub const SIGNATURE_HEADER: &str = "x-ping-signature";

/// Inbound webhook notification body.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "resourceId")]
    pub resource_id: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

/// The webhook event kinds the platform acts on. Everything else is
/// acknowledged and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookKind {
    PaymentSucceeded,
    SessionCompleted,
    SessionExpired,
}

impl WebhookKind {
    /// Parses a raw event type against the allow-list.
    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            "payment.success" => Some(WebhookKind::PaymentSucceeded),
            "checkout.session.completed" => Some(WebhookKind::SessionCompleted),
            "checkout.session.expired" => Some(WebhookKind::SessionExpired),
            _ => None,
        }
    }

    /// True for kinds that signal a completed payment.
    pub fn confirms_payment(&self) -> bool {
        matches!(
            self,
            WebhookKind::PaymentSucceeded | WebhookKind::SessionCompleted
        )
    }
}

fn signed_message(timestamp: &str, body: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(timestamp.len() + 1 + body.len());
    message.extend_from_slice(timestamp.as_bytes());
    message.push(b'.');
    message.extend_from_slice(body);
    message
}

/// Verifies the HMAC-SHA256 signature over `timestamp + "." + body`.
///
/// The comparison is constant time. A missing secret or undecodable
/// signature fails closed.
pub fn verify_signature(secret: &str, timestamp: &str, body: &[u8], signature_hex: &str) -> bool {
    if secret.is_empty() {
        return false;
    }
    let Ok(signature) = hex::decode(signature_hex) else {
        return false;
    };
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    hmac::verify(&key, &signed_message(timestamp, body), &signature).is_ok()
}

/// Computes the hex signature for a payload. Counterpart of
/// [`verify_signature`], used by tests and local tooling.
pub fn sign(secret: &str, timestamp: &str, body: &[u8]) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    let tag = hmac::sign(&key, &signed_message(timestamp, body));
    hex::encode(tag.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";
    const BODY: &[u8] = br#"{"id":"evt-1","type":"payment.success","resourceId":"cs-1","createdAt":"2024-01-01T00:00:00Z"}"#;

    #[test]
    fn test_sign_verify_roundtrip() {
        let signature = sign(SECRET, "1700000000", BODY);
        assert!(verify_signature(SECRET, "1700000000", BODY, &signature));
    }

    #[test]
    fn test_tampered_body_fails() {
        let signature = sign(SECRET, "1700000000", BODY);
        let mut tampered = BODY.to_vec();
        tampered[0] ^= 1;
        assert!(!verify_signature(SECRET, "1700000000", &tampered, &signature));
    }

    #[test]
    fn test_wrong_timestamp_fails() {
        let signature = sign(SECRET, "1700000000", BODY);
        assert!(!verify_signature(SECRET, "1700000001", BODY, &signature));
    }

    #[test]
    fn test_wrong_secret_fails() {
        let signature = sign(SECRET, "1700000000", BODY);
        assert!(!verify_signature("whsec_other", "1700000000", BODY, &signature));
    }

    #[test]
    fn test_missing_secret_fails_closed() {
        let signature = sign(SECRET, "1700000000", BODY);
        assert!(!verify_signature("", "1700000000", BODY, &signature));
    }

    #[test]
    fn test_garbage_signature_fails() {
        assert!(!verify_signature(SECRET, "1700000000", BODY, "not-hex"));
        assert!(!verify_signature(SECRET, "1700000000", BODY, "abcd"));
    }

    #[test]
    fn test_event_deserialization() {
        let event: WebhookEvent = serde_json::from_slice(BODY).unwrap();
        assert_eq!(event.id, "evt-1");
        assert_eq!(event.kind, "payment.success");
        assert_eq!(event.resource_id, "cs-1");
        assert_eq!(event.data, None);
    }

    #[test]
    fn test_kind_allow_list() {
        assert_eq!(
            WebhookKind::parse("payment.success"),
            Some(WebhookKind::PaymentSucceeded)
        );
        assert_eq!(
            WebhookKind::parse("checkout.session.completed"),
            Some(WebhookKind::SessionCompleted)
        );
        assert_eq!(
            WebhookKind::parse("checkout.session.expired"),
            Some(WebhookKind::SessionExpired)
        );
        assert_eq!(WebhookKind::parse("payment.refunded"), None);

        assert!(WebhookKind::PaymentSucceeded.confirms_payment());
        assert!(WebhookKind::SessionCompleted.confirms_payment());
        assert!(!WebhookKind::SessionExpired.confirms_payment());
    }
}
