//! Wire format types for x402 payment messages.
//!
//! These types follow the V2 x402 wire format: JSON with camelCase field
//! names, CAIP-2 network identifiers, and amounts expressed in the asset's
//! smallest unit as strings.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{VecSkipError, serde_as};

/// Describes the resource being accessed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInfo {
    /// The URL of the resource.
    pub url: String,

    /// Optional human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Optional MIME type of the resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// A fully resolved payment requirement offered to a client.
///
/// Defines what a resource server requires for payment, including scheme,
/// network, asset, amount, recipient, and timeout.
///
/// # JSON Format
///
/// ```json
/// {
///   "scheme": "exact",
///   "network": "eip155:8453",
///   "asset": "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913",
///   "amount": "1000000",
///   "payTo": "0x...",
///   "maxTimeoutSeconds": 300,
///   "extra": {}
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    /// Payment scheme identifier (e.g., "exact").
    pub scheme: String,

    /// CAIP-2 network identifier (e.g., "eip155:8453").
    pub network: String,

    /// Asset address/identifier (e.g., USDC contract address).
    pub asset: String,

    /// Amount in smallest unit (e.g., "1000000" for 1 USDC).
    pub amount: String,

    /// Recipient address.
    pub pay_to: String,

    /// Maximum time in seconds for payment validity.
    pub max_timeout_seconds: u64,

    /// Additional scheme-specific data (e.g., EIP-712 domain params).
    #[serde(default = "default_empty_object")]
    pub extra: Value,
}

/// 402 Payment Required response descriptor.
///
/// Sent by the resource server when payment is required. Contains the list
/// of accepted payment requirements and optional resource information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequired {
    /// Protocol version (always 2).
    #[serde(default = "default_version")]
    pub x402_version: u32,

    /// Optional human-readable error or reason message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Optional resource information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceInfo>,

    /// List of accepted payment requirements.
    pub accepts: Vec<PaymentRequirements>,

    /// Optional extension data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

/// Payment proof payload submitted by a client.
///
/// Carries the scheme-specific proof together with the requirement the
/// client chose to fulfill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    /// Protocol version (always 2).
    #[serde(default = "default_version")]
    pub x402_version: u32,

    /// Scheme-specific proof data (opaque to the mediation engine).
    pub payload: Value,

    /// The payment requirement being fulfilled.
    pub accepted: PaymentRequirements,

    /// Optional resource information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceInfo>,

    /// Optional extension data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl PaymentPayload {
    /// Returns the payment scheme from the accepted requirement.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.accepted.scheme
    }

    /// Returns the network from the accepted requirement.
    #[must_use]
    pub fn network(&self) -> &str {
        &self.accepted.network
    }
}

/// Result of verifying a payment proof against a requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    /// Whether the proof passed verification.
    pub is_valid: bool,

    /// Machine-readable reason verification failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalid_reason: Option<String>,

    /// The payer address, if identifiable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
}

impl VerifyResponse {
    /// Constructs a successful verification response.
    #[must_use]
    pub fn valid(payer: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            invalid_reason: None,
            payer: Some(payer.into()),
        }
    }

    /// Constructs a failed verification response.
    #[must_use]
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            invalid_reason: Some(reason.into()),
            payer: None,
        }
    }
}

/// Result of settling a verified payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleResponse {
    /// Whether settlement succeeded.
    pub success: bool,

    /// Machine-readable reason settlement failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,

    /// The address that paid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,

    /// The on-chain transaction hash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<String>,

    /// The network where settlement occurred or was attempted.
    pub network: String,
}

/// Settlement evidence attached to the outgoing response.
///
/// Embeds the requirement that was fulfilled so clients can tie the
/// receipt back to the offer they paid. Encoded as a Base64 JSON header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementReceipt {
    /// Always `true`: receipts are only issued for successful settlements.
    pub success: bool,

    /// The on-chain transaction hash.
    pub transaction: String,

    /// The network where settlement occurred.
    pub network: String,

    /// The address that paid, if identifiable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,

    /// The requirement that this settlement fulfilled.
    pub requirements: PaymentRequirements,
}

/// Describes a payment method supported by a facilitator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedPaymentKind {
    /// The x402 protocol version.
    pub x402_version: u32,

    /// The payment scheme identifier (e.g., "exact").
    pub scheme: String,

    /// The CAIP-2 network identifier.
    pub network: String,

    /// Optional scheme-specific extra data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

/// Response from a facilitator's supported-kinds query.
#[serde_as]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedResponse {
    /// List of supported payment kinds. Unknown entries are skipped rather
    /// than failing the whole response.
    #[serde_as(as = "VecSkipError<_>")]
    pub kinds: Vec<SupportedPaymentKind>,
}

const fn default_version() -> u32 {
    crate::config::X402_VERSION
}

fn default_empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn requirement() -> PaymentRequirements {
        PaymentRequirements {
            scheme: "exact".into(),
            network: "eip155:8453".into(),
            asset: "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913".into(),
            amount: "10000".into(),
            pay_to: "0xRecipient".into(),
            max_timeout_seconds: 300,
            extra: json!({}),
        }
    }

    #[test]
    fn requirements_use_camel_case_on_the_wire() {
        let value = serde_json::to_value(requirement()).unwrap();
        assert_eq!(value["payTo"], "0xRecipient");
        assert_eq!(value["maxTimeoutSeconds"], 300);
    }

    #[test]
    fn payment_required_round_trips() {
        let required = PaymentRequired {
            x402_version: 2,
            error: Some("Payment required".into()),
            resource: Some(ResourceInfo {
                url: "https://api.example.com/weather".into(),
                description: Some("Weather data".into()),
                mime_type: Some("application/json".into()),
            }),
            accepts: vec![requirement()],
            extensions: None,
        };
        let json = serde_json::to_string(&required).unwrap();
        let back: PaymentRequired = serde_json::from_str(&json).unwrap();
        assert_eq!(back, required);
    }

    #[test]
    fn settlement_receipt_embeds_requirement() {
        let receipt = SettlementReceipt {
            success: true,
            transaction: "0xabc".into(),
            network: "eip155:8453".into(),
            payer: Some("0xPayer".into()),
            requirements: requirement(),
        };
        let json = serde_json::to_string(&receipt).unwrap();
        let back: SettlementReceipt = serde_json::from_str(&json).unwrap();
        assert_eq!(back.requirements, receipt.requirements);
    }

    #[test]
    fn supported_response_skips_malformed_kinds() {
        let raw = json!({
            "kinds": [
                { "x402Version": 2, "scheme": "exact", "network": "eip155:8453" },
                { "bogus": true }
            ]
        });
        let supported: SupportedResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(supported.kinds.len(), 1);
        assert_eq!(supported.kinds[0].scheme, "exact");
    }
}
