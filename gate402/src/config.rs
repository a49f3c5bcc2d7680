//! Payment option configuration shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The x402 protocol version spoken by this workspace.
pub const X402_VERSION: u32 = 2;

/// A payment option with every request-dependent field already resolved.
///
/// This is the shape handed to the
/// [`ResourceAuthority`](crate::authority::ResourceAuthority) when building
/// concrete [`PaymentRequirements`](crate::proto::PaymentRequirements).
/// Dynamic payee/price resolution happens upstream, in the transport layer,
/// before any requirement-building logic sees the option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPaymentOption {
    /// Payment scheme identifier (e.g., `"exact"`).
    pub scheme: String,

    /// Recipient address.
    pub pay_to: String,

    /// Price for the resource — a money string (`"1.50"`) or a structured
    /// asset amount, interpreted by the scheme.
    pub price: Value,

    /// CAIP-2 network identifier (e.g., `"eip155:8453"`).
    pub network: String,

    /// Maximum time in seconds for payment validity.
    /// Defaults to 300 if not set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_timeout_seconds: Option<u64>,

    /// Scheme-specific extra data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}
