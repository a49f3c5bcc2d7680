//! The resource-authority boundary.
//!
//! The mediation engine in `gate402-http` never computes prices, performs
//! cryptography, or talks to a facilitator itself. All of that sits behind
//! the [`ResourceAuthority`] trait: requirement building from resolved
//! options, proof-to-requirement matching, verify and settle delegation,
//! and facilitator capability queries.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::config::ResolvedPaymentOption;
use crate::proto::{
    PaymentPayload, PaymentRequired, PaymentRequirements, ResourceInfo, SettleResponse,
    SupportedPaymentKind, VerifyResponse,
};

/// Boxed future returned by object-safe async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Boxed error type used across the authority boundary.
///
/// Authorities may surface structured errors (notably
/// [`SettlementError`](crate::error::SettlementError)) which callers can
/// recover via `downcast_ref`.
pub type AuthorityError = Box<dyn std::error::Error + Send + Sync>;

/// External collaborator owning requirement building, the scheme registry,
/// and facilitator verify/settle calls.
///
/// All methods that may perform network I/O are async (returning
/// [`BoxFuture`]); registry lookups are synchronous reads over state
/// populated during [`initialize`](Self::initialize).
pub trait ResourceAuthority: Send + Sync {
    /// Fetches or refreshes the facilitator-supported scheme/network
    /// combinations. Must complete before any request is processed.
    fn initialize(&self) -> BoxFuture<'_, Result<(), AuthorityError>>;

    /// Checks whether a scheme implementation is registered for the given
    /// network.
    fn has_registered_scheme(&self, network: &str, scheme: &str) -> bool;

    /// Returns the facilitator-advertised kind for a protocol version,
    /// network, and scheme, or `None` if unsupported.
    fn supported_kind(
        &self,
        version: u32,
        network: &str,
        scheme: &str,
    ) -> Option<SupportedPaymentKind>;

    /// Expands resolved payment options into concrete requirements for the
    /// current request.
    fn build_requirements<'a>(
        &'a self,
        options: &'a [ResolvedPaymentOption],
    ) -> BoxFuture<'a, Result<Vec<PaymentRequirements>, AuthorityError>>;

    /// Enriches extension declarations with transport-specific data.
    ///
    /// `transport_context` carries serialized request metadata (method,
    /// path, url). The default implementation returns the declarations
    /// unchanged.
    fn enrich_extensions(&self, declarations: &Value, _transport_context: &Value) -> Value {
        declarations.clone()
    }

    /// Selects the single requirement a submitted proof targets, or `None`.
    ///
    /// Matching is scheme/network/amount/asset/payee-aware.
    fn find_matching_requirements<'a>(
        &self,
        available: &'a [PaymentRequirements],
        payload: &PaymentPayload,
    ) -> Option<&'a PaymentRequirements> {
        available.iter().find(|req| {
            payload.accepted.scheme == req.scheme
                && payload.accepted.network == req.network
                && payload.accepted.amount == req.amount
                && payload.accepted.asset == req.asset
                && payload.accepted.pay_to == req.pay_to
        })
    }

    /// Verifies a payment proof against the matched requirement.
    fn verify_payment<'a>(
        &'a self,
        payload: &'a PaymentPayload,
        requirements: &'a PaymentRequirements,
    ) -> BoxFuture<'a, Result<VerifyResponse, AuthorityError>>;

    /// Settles a previously verified payment.
    ///
    /// May return a boxed [`SettlementError`](crate::error::SettlementError)
    /// to carry structured failure diagnostics.
    fn settle_payment<'a>(
        &'a self,
        payload: &'a PaymentPayload,
        requirements: &'a PaymentRequirements,
    ) -> BoxFuture<'a, Result<SettleResponse, AuthorityError>>;

    /// Builds the protocol-level 402 descriptor from a set of requirements.
    fn create_payment_required(
        &self,
        requirements: Vec<PaymentRequirements>,
        resource: Option<ResourceInfo>,
        error: Option<String>,
        extensions: Option<Value>,
    ) -> PaymentRequired {
        PaymentRequired {
            x402_version: crate::config::X402_VERSION,
            error,
            resource,
            accepts: requirements,
            extensions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct StubAuthority;

    impl ResourceAuthority for StubAuthority {
        fn initialize(&self) -> BoxFuture<'_, Result<(), AuthorityError>> {
            Box::pin(async { Ok(()) })
        }

        fn has_registered_scheme(&self, _network: &str, _scheme: &str) -> bool {
            true
        }

        fn supported_kind(
            &self,
            _version: u32,
            _network: &str,
            _scheme: &str,
        ) -> Option<SupportedPaymentKind> {
            None
        }

        fn build_requirements<'a>(
            &'a self,
            _options: &'a [ResolvedPaymentOption],
        ) -> BoxFuture<'a, Result<Vec<PaymentRequirements>, AuthorityError>> {
            Box::pin(async { Ok(Vec::new()) })
        }

        fn verify_payment<'a>(
            &'a self,
            _payload: &'a PaymentPayload,
            _requirements: &'a PaymentRequirements,
        ) -> BoxFuture<'a, Result<VerifyResponse, AuthorityError>> {
            Box::pin(async { Ok(VerifyResponse::valid("0xPayer")) })
        }

        fn settle_payment<'a>(
            &'a self,
            _payload: &'a PaymentPayload,
            _requirements: &'a PaymentRequirements,
        ) -> BoxFuture<'a, Result<SettleResponse, AuthorityError>> {
            Box::pin(async {
                Ok(SettleResponse {
                    success: true,
                    error_reason: None,
                    payer: None,
                    transaction: None,
                    network: "eip155:8453".to_owned(),
                })
            })
        }
    }

    fn requirement(amount: &str, pay_to: &str) -> PaymentRequirements {
        PaymentRequirements {
            scheme: "exact".into(),
            network: "eip155:8453".into(),
            asset: "0xAsset".into(),
            amount: amount.into(),
            pay_to: pay_to.into(),
            max_timeout_seconds: 300,
            extra: json!({}),
        }
    }

    fn payload_for(accepted: PaymentRequirements) -> PaymentPayload {
        PaymentPayload {
            x402_version: 2,
            payload: json!({}),
            accepted,
            resource: None,
            extensions: None,
        }
    }

    #[test]
    fn default_matching_selects_the_exact_requirement() {
        let offered = vec![
            requirement("10000", "0xAlice"),
            requirement("20000", "0xAlice"),
            requirement("20000", "0xBob"),
        ];
        let payload = payload_for(requirement("20000", "0xBob"));

        let matched = StubAuthority
            .find_matching_requirements(&offered, &payload)
            .unwrap();
        assert_eq!(matched.amount, "20000");
        assert_eq!(matched.pay_to, "0xBob");
    }

    #[test]
    fn default_matching_rejects_near_misses() {
        let offered = vec![requirement("10000", "0xAlice")];
        let payload = payload_for(requirement("10000", "0xMallory"));

        assert!(
            StubAuthority
                .find_matching_requirements(&offered, &payload)
                .is_none()
        );
    }

    #[test]
    fn default_descriptor_carries_version_and_inputs() {
        let required = StubAuthority.create_payment_required(
            vec![requirement("10000", "0xAlice")],
            Some(ResourceInfo {
                url: "https://api.example.com/data".into(),
                description: None,
                mime_type: None,
            }),
            Some("Payment required".into()),
            None,
        );

        assert_eq!(required.x402_version, crate::config::X402_VERSION);
        assert_eq!(required.error.as_deref(), Some("Payment required"));
        assert_eq!(required.accepts.len(), 1);
    }

    #[test]
    fn default_enrichment_is_identity() {
        let declarations = json!({"bazaar": {"listing": "abc"}});
        let enriched = StubAuthority.enrich_extensions(&declarations, &json!({"path": "/x"}));
        assert_eq!(enriched, declarations);
    }
}
