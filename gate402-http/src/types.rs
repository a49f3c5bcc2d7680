//! Route configuration, payment options, and processing result types.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use gate402::{BoxFuture, PaymentPayload, PaymentRequirements, ResolvedPaymentOption};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::RequestContext;

/// Boxed per-request resolver backing [`Dynamic::Resolver`].
pub type DynamicResolver<T> =
    Arc<dyn for<'a> Fn(&'a RequestContext) -> BoxFuture<'a, T> + Send + Sync>;

/// A field that is either statically configured or resolved from the
/// request context.
///
/// Dynamic variants are resolved exactly once per request, after which the
/// owning option is fully static for the rest of request processing.
pub enum Dynamic<T> {
    /// A fixed value.
    Static(T),
    /// A per-request resolver.
    Resolver(DynamicResolver<T>),
}

impl<T> Clone for Dynamic<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        match self {
            Self::Static(v) => Self::Static(v.clone()),
            Self::Resolver(f) => Self::Resolver(Arc::clone(f)),
        }
    }
}

impl<T> fmt::Debug for Dynamic<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(v) => f.debug_tuple("Static").field(v).finish(),
            Self::Resolver(_) => f.debug_tuple("Resolver").field(&"<resolver>").finish(),
        }
    }
}

impl<T> Dynamic<T>
where
    T: Clone + Send + Sync,
{
    /// Creates a dynamic field from an async resolver closure.
    ///
    /// The closure receives the request context and produces the value.
    pub fn from_fn<F, Fut>(resolver: F) -> Self
    where
        F: Fn(&RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        Self::Resolver(Arc::new(move |ctx| Box::pin(resolver(ctx))))
    }

    /// Resolves the field for the given request.
    pub async fn resolve(&self, ctx: &RequestContext) -> T {
        match self {
            Self::Static(v) => v.clone(),
            Self::Resolver(f) => f(ctx).await,
        }
    }
}

impl<T> From<T> for Dynamic<T> {
    fn from(value: T) -> Self {
        Self::Static(value)
    }
}

impl From<&str> for Dynamic<String> {
    fn from(value: &str) -> Self {
        Self::Static(value.to_owned())
    }
}

/// A payment option accepted by a protected route.
///
/// Defines a (scheme, network) pair along with price and recipient for a
/// single payment method accepted at an endpoint. Price and recipient may
/// be request-resolved.
#[derive(Debug, Clone)]
pub struct PaymentOption {
    /// Payment scheme identifier (e.g., `"exact"`).
    pub scheme: String,

    /// CAIP-2 network identifier (e.g., `"eip155:8453"`).
    pub network: String,

    /// Recipient address — static or resolved per request.
    pub pay_to: Dynamic<String>,

    /// Price — a money string (e.g., `"1.50"`) or structured amount,
    /// static or resolved per request.
    pub price: Dynamic<Value>,

    /// Maximum payment validity in seconds (authority defaults apply).
    pub max_timeout_seconds: Option<u64>,

    /// Scheme-specific extra data.
    pub extra: Option<Value>,
}

impl PaymentOption {
    /// Creates a payment option.
    #[must_use]
    pub fn new(
        scheme: impl Into<String>,
        network: impl Into<String>,
        pay_to: impl Into<Dynamic<String>>,
        price: impl Into<Dynamic<Value>>,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            network: network.into(),
            pay_to: pay_to.into(),
            price: price.into(),
            max_timeout_seconds: None,
            extra: None,
        }
    }

    /// Sets the maximum payment validity in seconds.
    #[must_use]
    pub const fn with_max_timeout(mut self, seconds: u64) -> Self {
        self.max_timeout_seconds = Some(seconds);
        self
    }

    /// Sets scheme-specific extra data.
    #[must_use]
    pub fn with_extra(mut self, extra: Value) -> Self {
        self.extra = Some(extra);
        self
    }

    /// Resolves any request-dependent fields, yielding a fully static
    /// option. Each dynamic field is evaluated exactly once.
    pub async fn resolve(&self, ctx: &RequestContext) -> ResolvedPaymentOption {
        let pay_to = self.pay_to.resolve(ctx).await;
        let price = self.price.resolve(ctx).await;
        ResolvedPaymentOption {
            scheme: self.scheme.clone(),
            pay_to,
            price,
            network: self.network.clone(),
            max_timeout_seconds: self.max_timeout_seconds,
            extra: self.extra.clone(),
        }
    }
}

/// Body produced by a route's custom unpaid-response generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnpaidResponse {
    /// Content type of the body.
    pub content_type: String,
    /// The response body.
    pub body: String,
}

/// Async generator for custom unpaid-response bodies.
pub type UnpaidResponseFn =
    Arc<dyn for<'a> Fn(&'a RequestContext) -> BoxFuture<'a, UnpaidResponse> + Send + Sync>;

/// Configuration for a payment-protected route.
///
/// Specifies which payment options a route accepts, along with optional
/// resource metadata, paywall customisation, and extension data.
#[derive(Clone)]
pub struct RouteConfig {
    /// Accepted payment options. Must be non-empty.
    pub accepts: Vec<PaymentOption>,

    /// Override resource URL (defaults to the request URL).
    pub resource: Option<String>,

    /// Human-readable description of the resource.
    pub description: Option<String>,

    /// MIME type of the resource.
    pub mime_type: Option<String>,

    /// Custom paywall HTML served verbatim to browser clients.
    pub custom_paywall_html: Option<String>,

    /// Custom generator for the unpaid 402 body served to API clients.
    pub unpaid_response: Option<UnpaidResponseFn>,

    /// Extension declarations enriched per request by the authority.
    pub extensions: Option<Value>,
}

impl fmt::Debug for RouteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteConfig")
            .field("accepts", &self.accepts)
            .field("resource", &self.resource)
            .field("description", &self.description)
            .field("mime_type", &self.mime_type)
            .field("has_custom_paywall", &self.custom_paywall_html.is_some())
            .field("has_unpaid_response", &self.unpaid_response.is_some())
            .finish_non_exhaustive()
    }
}

impl RouteConfig {
    /// Creates a route config with a single payment option.
    #[must_use]
    pub fn single(option: PaymentOption) -> Self {
        Self::multi(vec![option])
    }

    /// Creates a route config with multiple payment options, offered in
    /// declaration order.
    #[must_use]
    pub fn multi(options: Vec<PaymentOption>) -> Self {
        Self {
            accepts: options,
            resource: None,
            description: None,
            mime_type: None,
            custom_paywall_html: None,
            unpaid_response: None,
            extensions: None,
        }
    }

    /// Sets the resource URL override.
    #[must_use]
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Sets the resource description.
    #[must_use]
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Sets the MIME type.
    #[must_use]
    pub fn with_mime_type(mut self, mime: impl Into<String>) -> Self {
        self.mime_type = Some(mime.into());
        self
    }

    /// Sets custom paywall HTML served verbatim to browser clients.
    #[must_use]
    pub fn with_paywall_html(mut self, html: impl Into<String>) -> Self {
        self.custom_paywall_html = Some(html.into());
        self
    }

    /// Sets a custom generator for the unpaid 402 body.
    #[must_use]
    pub fn with_unpaid_response<F, Fut>(mut self, generator: F) -> Self
    where
        F: Fn(&RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = UnpaidResponse> + Send + 'static,
    {
        self.unpaid_response = Some(Arc::new(move |ctx| Box::pin(generator(ctx))));
        self
    }

    /// Sets extension declarations attached to 402 descriptors.
    #[must_use]
    pub fn with_extensions(mut self, extensions: Value) -> Self {
        self.extensions = Some(extensions);
        self
    }
}

/// Concrete response instructions produced by the engine.
///
/// Transport bindings turn these into their framework's response type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseInstructions {
    /// HTTP status code (402 for payment errors).
    pub status: u16,
    /// Response headers to set.
    pub headers: Vec<(String, String)>,
    /// Content type of the body.
    pub content_type: String,
    /// The response body.
    pub body: String,
}

impl ResponseInstructions {
    /// Whether the body is a human-facing HTML page.
    #[must_use]
    pub fn is_html(&self) -> bool {
        self.content_type.starts_with("text/html")
    }
}

/// Result of processing an HTTP request through the payment gate.
#[derive(Debug)]
pub enum ProcessResult {
    /// Route is not payment-gated — pass the request through unmodified.
    NoPaymentRequired,

    /// Payment verified; the caller should run the protected handler and
    /// then drive settlement.
    PaymentVerified {
        /// The verified payment proof.
        payload: PaymentPayload,
        /// The requirement the proof matched.
        requirements: PaymentRequirements,
    },

    /// Payment missing, unmatched, or invalid — respond as instructed.
    PaymentError(ResponseInstructions),
}

/// Result of driving settlement after the protected handler succeeded.
///
/// Always returned as data; settlement failures never escape as errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettleOutcome {
    /// Whether settlement succeeded.
    pub success: bool,
    /// Failure reason, if settlement failed.
    pub error_reason: Option<String>,
    /// Headers carrying the settlement receipt on success.
    pub headers: Vec<(String, String)>,
    /// Transaction hash/identifier.
    pub transaction: Option<String>,
    /// Network where settlement occurred or was attempted.
    pub network: Option<String>,
    /// Payer address.
    pub payer: Option<String>,
}

/// Paywall UI configuration for browser-facing 402 responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaywallConfig {
    /// Application name to display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,

    /// URL to an application logo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_logo: Option<String>,

    /// Whether this is a testnet deployment.
    #[serde(default)]
    pub testnet: bool,
}

/// Why a route failed startup validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationReason {
    /// No scheme implementation registered for the option's scheme+network.
    MissingScheme,
    /// The facilitator does not advertise support for the combination.
    MissingFacilitator,
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingScheme => f.write_str("missing_scheme"),
            Self::MissingFacilitator => f.write_str("missing_facilitator"),
        }
    }
}

/// A single startup-validation violation for a route's payment option.
#[derive(Debug, Clone)]
pub struct RouteValidationError {
    /// The route pattern (e.g., `"GET /weather"`).
    pub route_pattern: String,
    /// Scheme identifier of the offending option.
    pub scheme: String,
    /// Network identifier of the offending option.
    pub network: String,
    /// Reason code.
    pub reason: ValidationReason,
    /// Human-readable error message.
    pub message: String,
}

impl fmt::Display for RouteValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
