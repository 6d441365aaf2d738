use chrono::{DateTime, Utc};
use ring::hmac;
use thiserror::Error;

/// Header carrying the collector's callback signature,
/// `t=<unix-ms>,v0=<hex-hmac>`.
pub const SIGNATURE_HEADER: &str = "readme-signature";

const SIGNATURE_SCHEME: &str = "v0";
const EXPIRATION_WINDOW_MS: i64 = 30 * 60 * 1000;

/// Rejection reasons for an inbound callback. These guard a trust boundary
/// and must surface to the caller as hard failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WebhookError {
    #[error("missing signature")]
    MissingSignature,
    #[error("invalid signature format")]
    InvalidFormat,
    #[error("expired signature")]
    Expired,
    #[error("invalid signature")]
    InvalidSignature,
}

/// Validates an inbound collector callback against the shared secret and
/// returns the verified body. Signatures outside the 30-minute window are
/// rejected in both directions, past and future.
pub fn verify_webhook<'a>(
    body: &'a str,
    signature: Option<&str>,
    secret: &str,
) -> Result<&'a str, WebhookError> {
    verify_at(body, signature, secret, Utc::now())
}

fn verify_at<'a>(
    body: &'a str,
    signature: Option<&str>,
    secret: &str,
    now: DateTime<Utc>,
) -> Result<&'a str, WebhookError> {
    let signature = signature
        .filter(|value| !value.is_empty())
        .ok_or(WebhookError::MissingSignature)?;

    let mut timestamp = None;
    let mut expected = None;
    for pair in signature.split(',') {
        if let Some((key, value)) = pair.split_once('=') {
            match key.trim() {
                "t" => timestamp = Some(value.trim()),
                SIGNATURE_SCHEME => expected = Some(value.trim()),
                _ => {}
            }
        }
    }
    let timestamp: i64 = timestamp
        .and_then(|raw| raw.parse().ok())
        .ok_or(WebhookError::InvalidFormat)?;
    let expected = expected.ok_or(WebhookError::InvalidFormat)?;

    if (now.timestamp_millis() - timestamp).abs() > EXPIRATION_WINDOW_MS {
        return Err(WebhookError::Expired);
    }

    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    let message = format!("{}.{}", timestamp, body);
    let tag = hex::decode(expected).map_err(|_| WebhookError::InvalidSignature)?;
    hmac::verify(&key, message.as_bytes(), &tag).map_err(|_| WebhookError::InvalidSignature)?;

    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sign(body: &str, secret: &str, at: DateTime<Utc>) -> String {
        let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
        let message = format!("{}.{}", at.timestamp_millis(), body);
        let tag = hmac::sign(&key, message.as_bytes());
        format!("t={},v0={}", at.timestamp_millis(), hex::encode(tag.as_ref()))
    }

    #[test]
    fn valid_signature_returns_the_body() {
        let now = Utc::now();
        let signature = sign(r#"{"email":"owlbert@example.com"}"#, "shhh", now);
        let verified = verify_at(
            r#"{"email":"owlbert@example.com"}"#,
            Some(&signature),
            "shhh",
            now,
        );
        assert_eq!(verified, Ok(r#"{"email":"owlbert@example.com"}"#));
    }

    #[test]
    fn signature_expires_after_thirty_minutes() {
        let now = Utc::now();
        let signature = sign("{}", "shhh", now);
        assert_eq!(
            verify_at("{}", Some(&signature), "shhh", now + Duration::minutes(31)),
            Err(WebhookError::Expired)
        );
        // Still valid just inside the window.
        assert!(verify_at("{}", Some(&signature), "shhh", now + Duration::minutes(29)).is_ok());
    }

    #[test]
    fn future_dated_signatures_beyond_the_window_are_rejected() {
        let now = Utc::now();
        let signature = sign("{}", "shhh", now + Duration::minutes(31));
        assert_eq!(
            verify_at("{}", Some(&signature), "shhh", now),
            Err(WebhookError::Expired)
        );
    }

    #[test]
    fn wrong_secret_is_rejected_regardless_of_timing() {
        let now = Utc::now();
        let signature = sign("{}", "other-secret", now);
        assert_eq!(
            verify_at("{}", Some(&signature), "shhh", now),
            Err(WebhookError::InvalidSignature)
        );
    }

    #[test]
    fn tampered_body_is_rejected() {
        let now = Utc::now();
        let signature = sign(r#"{"email":"a@example.com"}"#, "shhh", now);
        assert_eq!(
            verify_at(r#"{"email":"b@example.com"}"#, Some(&signature), "shhh", now),
            Err(WebhookError::InvalidSignature)
        );
    }

    #[test]
    fn missing_or_empty_signature_is_rejected() {
        let now = Utc::now();
        assert_eq!(
            verify_at("{}", None, "shhh", now),
            Err(WebhookError::MissingSignature)
        );
        assert_eq!(
            verify_at("{}", Some(""), "shhh", now),
            Err(WebhookError::MissingSignature)
        );
    }

    #[test]
    fn signatures_without_both_fields_are_malformed() {
        let now = Utc::now();
        assert_eq!(
            verify_at("{}", Some("t=123"), "shhh", now),
            Err(WebhookError::InvalidFormat)
        );
        assert_eq!(
            verify_at("{}", Some("v0=abcdef"), "shhh", now),
            Err(WebhookError::InvalidFormat)
        );
        assert_eq!(
            verify_at("{}", Some("t=not-a-number,v0=abcdef"), "shhh", now),
            Err(WebhookError::InvalidFormat)
        );
        assert_eq!(
            verify_at("{}", Some("garbage"), "shhh", now),
            Err(WebhookError::InvalidFormat)
        );
    }

    #[test]
    fn undecodable_hex_is_an_invalid_signature() {
        let now = Utc::now();
        let value = format!("t={},v0=zzzz", now.timestamp_millis());
        assert_eq!(
            verify_at("{}", Some(&value), "shhh", now),
            Err(WebhookError::InvalidSignature)
        );
    }
}
