//! HMAC-SHA256 checks for the two channels that can claim a payment happened:
//! the client-submitted checkout signature and the gateway webhook.
//!
//! Both compare in constant time through `Mac::verify_slice` and never put the
//! expected value into an error.

use {
    super::error::CheckoutError,
    hmac::{Hmac, Mac},
    sha2::Sha256,
};

type HmacSha256 = Hmac<Sha256>;

fn mac(secret: &str) -> Result<HmacSha256, CheckoutError> {
    if secret.is_empty() {
        return Err(CheckoutError::Configuration("signing secret is empty".into()));
    }
    HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| CheckoutError::Configuration("invalid signing secret".into()))
}

fn verify_hex(mac: HmacSha256, signature: &str) -> Result<(), CheckoutError> {
    let provided = hex::decode(signature.trim())
        .map_err(|_| CheckoutError::SignatureInvalid("signature is not hex".into()))?;
    mac.verify_slice(&provided)
        .map_err(|_| CheckoutError::SignatureInvalid("signature mismatch".into()))
}

fn payment_mac(intent_id: &str, payment_id: &str, secret: &str) -> Result<HmacSha256, CheckoutError> {
    let mut mac = mac(secret)?;
    mac.update(intent_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    Ok(mac)
}

/// Hex signature the gateway's checkout returns to the client for
/// `(intent_id, payment_id)`.
pub fn payment_signature(intent_id: &str, payment_id: &str, secret: &str) -> Result<String, CheckoutError> {
    let mac = payment_mac(intent_id, payment_id, secret)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

pub fn verify_payment_signature(
    intent_id: &str,
    payment_id: &str,
    signature: &str,
    secret: &str,
) -> Result<(), CheckoutError> {
    verify_hex(payment_mac(intent_id, payment_id, secret)?, signature)
}

/// Hex signature over the raw webhook body, as sent in `X-Razorpay-Signature`.
pub fn webhook_signature(raw_body: &[u8], secret: &str) -> Result<String, CheckoutError> {
    let mut mac = mac(secret)?;
    mac.update(raw_body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Must run on the unparsed bytes, before any JSON decoding.
pub fn verify_webhook_signature(
    raw_body: &[u8],
    signature: &str,
    secret: &str,
) -> Result<(), CheckoutError> {
    let mut mac = mac(secret)?;
    mac.update(raw_body);
    verify_hex(mac, signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "rzp_test_secret";

    #[test]
    fn payment_signature_accepts_matching() {
        let sig = payment_signature("order_Abc", "pay_Xyz", SECRET).unwrap();
        assert_eq!(sig.len(), 64);
        assert!(verify_payment_signature("order_Abc", "pay_Xyz", &sig, SECRET).is_ok());
    }

    #[test]
    fn payment_signature_rejects_wrong_secret() {
        let sig = payment_signature("order_Abc", "pay_Xyz", "other_secret").unwrap();
        let err = verify_payment_signature("order_Abc", "pay_Xyz", &sig, SECRET).unwrap_err();
        assert!(matches!(err, CheckoutError::SignatureInvalid(_)));
    }

    #[test]
    fn payment_signature_binds_both_ids() {
        let sig = payment_signature("order_Abc", "pay_Xyz", SECRET).unwrap();
        assert!(verify_payment_signature("order_Abc", "pay_Other", &sig, SECRET).is_err());
        assert!(verify_payment_signature("order_Other", "pay_Xyz", &sig, SECRET).is_err());
    }

    #[test]
    fn payment_signature_known_vector() {
        let sig = payment_signature("order_1", "pay_1", "secret").unwrap();
        let mut mac = HmacSha256::new_from_slice(b"secret").unwrap();
        mac.update(b"order_1|pay_1");
        assert_eq!(sig, hex::encode(mac.finalize().into_bytes()));
    }

    #[test]
    fn webhook_signature_is_over_raw_bytes() {
        let body = br#"{"event":"payment.captured"}"#;
        let sig = webhook_signature(body, SECRET).unwrap();
        assert!(verify_webhook_signature(body, &sig, SECRET).is_ok());

        // Same JSON, different bytes.
        let reformatted = br#"{ "event": "payment.captured" }"#;
        assert!(verify_webhook_signature(reformatted, &sig, SECRET).is_err());
    }

    #[test]
    fn non_hex_signature_is_rejected() {
        let err = verify_webhook_signature(b"{}", "not-hex!", SECRET).unwrap_err();
        assert!(matches!(err, CheckoutError::SignatureInvalid(_)));
    }

    #[test]
    fn empty_secret_fails_closed() {
        let err = verify_webhook_signature(b"{}", "00", "").unwrap_err();
        assert!(matches!(err, CheckoutError::Configuration(_)));
    }
}
