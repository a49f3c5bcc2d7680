//! Wire codec for x402 HTTP headers.
//!
//! All three protocol headers carry Base64-encoded JSON: the payment proof
//! in `PAYMENT-SIGNATURE`, the 402 descriptor in `PAYMENT-REQUIRED`, and
//! the settlement receipt in `PAYMENT-RESPONSE`. Encoding and decoding are
//! exact inverses of each other.

use base64::prelude::*;
use gate402::{PaymentPayload, PaymentRequired, SettlementReceipt};

use crate::error::HttpError;

/// Decodes a `PAYMENT-SIGNATURE` header value into a [`PaymentPayload`].
///
/// # Errors
///
/// Returns [`HttpError`] on Base64 or JSON decode failure.
pub fn decode_payment_payload(header_value: &str) -> Result<PaymentPayload, HttpError> {
    let bytes = BASE64_STANDARD.decode(header_value.trim())?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Encodes a [`PaymentPayload`] as a Base64 string for the
/// `PAYMENT-SIGNATURE` header.
///
/// # Errors
///
/// Returns [`HttpError::Serialize`] if JSON serialization fails.
pub fn encode_payment_payload(payload: &PaymentPayload) -> Result<String, HttpError> {
    let json = serde_json::to_vec(payload)?;
    Ok(BASE64_STANDARD.encode(&json))
}

/// Encodes a [`PaymentRequired`] descriptor as a Base64 string for the
/// `PAYMENT-REQUIRED` header.
///
/// # Errors
///
/// Returns [`HttpError::Serialize`] if JSON serialization fails.
pub fn encode_payment_required(required: &PaymentRequired) -> Result<String, HttpError> {
    let json = serde_json::to_vec(required)?;
    Ok(BASE64_STANDARD.encode(&json))
}

/// Decodes a `PAYMENT-REQUIRED` header value into a [`PaymentRequired`].
///
/// # Errors
///
/// Returns [`HttpError`] on Base64 or JSON decode failure.
pub fn decode_payment_required(header_value: &str) -> Result<PaymentRequired, HttpError> {
    let bytes = BASE64_STANDARD.decode(header_value.trim())?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Encodes a [`SettlementReceipt`] as a Base64 string for the
/// `PAYMENT-RESPONSE` header.
///
/// # Errors
///
/// Returns [`HttpError::Serialize`] if JSON serialization fails.
pub fn encode_settlement_receipt(receipt: &SettlementReceipt) -> Result<String, HttpError> {
    let json = serde_json::to_vec(receipt)?;
    Ok(BASE64_STANDARD.encode(&json))
}

/// Decodes a `PAYMENT-RESPONSE` header value into a [`SettlementReceipt`].
///
/// # Errors
///
/// Returns [`HttpError`] on Base64 or JSON decode failure.
pub fn decode_settlement_receipt(header_value: &str) -> Result<SettlementReceipt, HttpError> {
    let bytes = BASE64_STANDARD.decode(header_value.trim())?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gate402::{PaymentRequirements, ResourceInfo};
    use serde_json::json;

    fn requirement() -> PaymentRequirements {
        PaymentRequirements {
            scheme: "exact".into(),
            network: "eip155:8453".into(),
            asset: "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48".into(),
            amount: "10000".into(),
            pay_to: "0xRecipient".into(),
            max_timeout_seconds: 300,
            extra: json!({}),
        }
    }

    #[test]
    fn payment_required_round_trips_through_header() {
        let required = PaymentRequired {
            x402_version: 2,
            error: Some("Payment required".into()),
            resource: Some(ResourceInfo {
                url: "https://api.example.com/data".into(),
                description: None,
                mime_type: Some("application/json".into()),
            }),
            accepts: vec![requirement()],
            extensions: Some(json!({"bazaar": {"listing": "abc"}})),
        };

        let encoded = encode_payment_required(&required).unwrap();
        let decoded = decode_payment_required(&encoded).unwrap();
        assert_eq!(decoded, required);
    }

    #[test]
    fn settlement_receipt_round_trips_through_header() {
        let receipt = SettlementReceipt {
            success: true,
            transaction: "0xdeadbeef".into(),
            network: "eip155:8453".into(),
            payer: Some("0xPayer".into()),
            requirements: requirement(),
        };

        let encoded = encode_settlement_receipt(&receipt).unwrap();
        let decoded = decode_settlement_receipt(&encoded).unwrap();
        assert_eq!(decoded, receipt);
    }

    #[test]
    fn payment_payload_round_trips_through_header() {
        let payload = PaymentPayload {
            x402_version: 2,
            payload: json!({"signature": "0xsig"}),
            accepted: requirement(),
            resource: None,
            extensions: None,
        };

        let encoded = encode_payment_payload(&payload).unwrap();
        let decoded = decode_payment_payload(&encoded).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn decode_tolerates_surrounding_whitespace() {
        let payload = PaymentPayload {
            x402_version: 2,
            payload: json!({}),
            accepted: requirement(),
            resource: None,
            extensions: None,
        };
        let encoded = format!("  {}  ", encode_payment_payload(&payload).unwrap());
        assert!(decode_payment_payload(&encoded).is_ok());
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_payment_payload("not base64!!!").is_err());
        let not_json = BASE64_STANDARD.encode(b"hello");
        assert!(decode_payment_payload(&not_json).is_err());
    }
}
