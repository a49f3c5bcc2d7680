//! Error types for the HTTP mediation engine.

use gate402::AuthorityError;

use crate::types::RouteValidationError;

/// Errors that can occur during HTTP header encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Base64 decoding failed.
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Verification failures surfaced as 402 reasons.
///
/// These never escape the engine as errors; they become the
/// human-readable cause embedded in the 402 descriptor.
#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    /// No payment proof was supplied (or it failed to decode).
    #[error("Payment required")]
    PaymentRequired,
    /// The decoded proof matches none of the offered requirements.
    #[error("no matching payment requirements")]
    NoPaymentMatching,
    /// The facilitator rejected the proof, or verification errored.
    #[error("{0}")]
    VerificationFailed(String),
}

/// Fatal errors raised at gate construction or initialization.
///
/// These are the only errors the engine ever raises; everything during
/// request processing converges on result data instead.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// A route pattern could not be compiled.
    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The offending pattern text.
        pattern: String,
        /// Why compilation failed.
        reason: String,
    },

    /// A route declares an empty payment-option list.
    #[error("route '{pattern}' declares no payment options")]
    EmptyPaymentOptions {
        /// The offending pattern text.
        pattern: String,
    },

    /// The resource authority failed to initialize.
    #[error("authority initialization failed: {0}")]
    Initialize(AuthorityError),

    /// Startup validation found misconfigured routes. Carries every
    /// violation across all routes, not just the first.
    #[error("invalid route configuration:\n{}", format_violations(.0))]
    InvalidRoutes(Vec<RouteValidationError>),
}

fn format_violations(violations: &[RouteValidationError]) -> String {
    violations
        .iter()
        .map(|v| format!("  - {}", v.message))
        .collect::<Vec<_>>()
        .join("\n")
}
