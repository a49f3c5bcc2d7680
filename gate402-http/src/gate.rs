//! The payment gate: route-aware x402 mediation engine.
//!
//! [`PaymentGate`] turns a declarative route table plus an incoming request
//! into one of three outcomes: pass through, respond with 402, or payment
//! verified. After the protected handler runs, it drives settlement and
//! derives the receipt header. All facilitator interaction goes through the
//! [`ResourceAuthority`] boundary; nothing inside request processing ever
//! escapes as an error.

use std::fmt;
use std::sync::Arc;

use gate402::{
    PaymentPayload, PaymentRequired, PaymentRequirements, ResourceAuthority, ResourceInfo,
    SettlementError, SettlementReceipt, X402_VERSION,
};

use crate::constants::{
    ACCESS_CONTROL_EXPOSE_HEADERS, HTTP_STATUS_PAYMENT_REQUIRED, PAYMENT_REQUIRED_HEADER,
    PAYMENT_RESPONSE_HEADER,
};
use crate::context::RequestContext;
use crate::error::{GateError, VerificationError};
use crate::headers;
use crate::paywall::{self, PaywallRenderer};
use crate::routes::{CompiledRoute, RoutesConfig, compile_routes};
use crate::types::{
    PaywallConfig, ProcessResult, ResponseInstructions, RouteConfig, RouteValidationError,
    SettleOutcome, ValidationReason,
};

/// Route-aware payment mediation engine.
///
/// Construct with a route table and a [`ResourceAuthority`], call
/// [`initialize`](Self::initialize) once, then process requests. The
/// compiled route list is immutable after construction and the gate can be
/// shared freely across concurrent requests.
pub struct PaymentGate<A> {
    authority: Arc<A>,
    routes: Vec<CompiledRoute>,
    renderer: Option<Box<dyn PaywallRenderer>>,
    initialized: bool,
}

impl<A> fmt::Debug for PaymentGate<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentGate")
            .field("routes_count", &self.routes.len())
            .field("has_renderer", &self.renderer.is_some())
            .field("initialized", &self.initialized)
            .finish_non_exhaustive()
    }
}

impl<A> PaymentGate<A>
where
    A: ResourceAuthority,
{
    /// Compiles the route table and creates an uninitialized gate.
    ///
    /// # Errors
    ///
    /// Returns [`GateError`] if a pattern fails to compile or a route
    /// declares no payment options.
    pub fn new(authority: Arc<A>, routes: RoutesConfig) -> Result<Self, GateError> {
        Ok(Self {
            authority,
            routes: compile_routes(routes)?,
            renderer: None,
            initialized: false,
        })
    }

    /// Registers a paywall renderer for browser-facing 402 responses.
    #[must_use]
    pub fn with_paywall_renderer(mut self, renderer: Box<dyn PaywallRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Initializes the gate: refreshes the authority's facilitator support
    /// data, then validates every route's payment options against the
    /// scheme registry and facilitator-advertised kinds.
    ///
    /// All routes and options are checked before reporting, so a single
    /// call surfaces the complete list of misconfigurations.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Initialize`] if the authority fails to
    /// initialize, or [`GateError::InvalidRoutes`] carrying every
    /// violation found.
    pub async fn initialize(&mut self) -> Result<(), GateError> {
        self.authority
            .initialize()
            .await
            .map_err(GateError::Initialize)?;

        let violations = self.validate_routes();
        if !violations.is_empty() {
            return Err(GateError::InvalidRoutes(violations));
        }

        self.initialized = true;
        Ok(())
    }

    /// Returns whether the gate has been initialized.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Returns whether the request targets a payment-gated route.
    #[must_use]
    pub fn requires_payment(&self, ctx: &RequestContext) -> bool {
        self.find_route(ctx).is_some()
    }

    /// Processes an incoming request against the route table.
    ///
    /// Returns [`ProcessResult::NoPaymentRequired`] for ungated routes,
    /// [`ProcessResult::PaymentVerified`] when a submitted proof matches an
    /// offered requirement and verifies, and
    /// [`ProcessResult::PaymentError`] with concrete response instructions
    /// in every other case. Never returns an error.
    pub async fn process_http_request(
        &self,
        ctx: &RequestContext,
        paywall_config: Option<&PaywallConfig>,
    ) -> ProcessResult {
        if !self.initialized {
            return ProcessResult::PaymentError(internal_error_response(
                "payment gate not initialized",
            ));
        }

        let Some(route) = self.find_route(ctx) else {
            return ProcessResult::NoPaymentRequired;
        };

        #[cfg(feature = "telemetry")]
        tracing::debug!(
            pattern = %route.pattern,
            method = %ctx.method(),
            path = %ctx.path(),
            "route matched payment gate"
        );

        // Normalize options: resolve dynamic payee/price left-to-right,
        // each exactly once, before anything else sees them.
        let mut options = Vec::with_capacity(route.config.accepts.len());
        for option in &route.config.accepts {
            options.push(option.resolve(ctx).await);
        }

        let requirements = match self.authority.build_requirements(&options).await {
            Ok(reqs) => reqs,
            Err(e) => {
                return ProcessResult::PaymentError(internal_error_response(&format!(
                    "failed to build payment requirements: {e}"
                )));
            }
        };

        let resource = resource_info(&route.config, ctx);
        let extensions = route
            .config
            .extensions
            .as_ref()
            .map(|decls| self.authority.enrich_extensions(decls, &ctx.transport_context()));

        let Some(payload) = extract_payment_payload(ctx) else {
            let required = self.authority.create_payment_required(
                requirements,
                Some(resource),
                Some(VerificationError::PaymentRequired.to_string()),
                extensions,
            );
            return ProcessResult::PaymentError(
                self.compose_payment_error(&required, ctx, &route.config, paywall_config)
                    .await,
            );
        };

        let matched = self
            .authority
            .find_matching_requirements(&requirements, &payload)
            .cloned();
        let Some(matched) = matched else {
            #[cfg(feature = "telemetry")]
            tracing::debug!(
                scheme = %payload.scheme(),
                network = %payload.network(),
                "payment proof matches no offered requirement"
            );
            let required = self.authority.create_payment_required(
                requirements,
                Some(resource),
                Some(VerificationError::NoPaymentMatching.to_string()),
                extensions,
            );
            return ProcessResult::PaymentError(
                self.compose_payment_error(&required, ctx, &route.config, paywall_config)
                    .await,
            );
        };

        let reason = match self.authority.verify_payment(&payload, &matched).await {
            Ok(response) if response.is_valid => {
                #[cfg(feature = "telemetry")]
                tracing::debug!(payer = ?response.payer, "payment verified");
                return ProcessResult::PaymentVerified {
                    payload,
                    requirements: matched,
                };
            }
            Ok(response) => response
                .invalid_reason
                .unwrap_or_else(|| "payment verification failed".to_owned()),
            Err(e) => e.to_string(),
        };

        #[cfg(feature = "telemetry")]
        tracing::warn!(reason = %reason, "payment verification rejected");

        let required = self.authority.create_payment_required(
            requirements,
            Some(resource),
            Some(VerificationError::VerificationFailed(reason).to_string()),
            extensions,
        );
        ProcessResult::PaymentError(
            self.compose_payment_error(&required, ctx, &route.config, paywall_config)
                .await,
        )
    }

    /// Settles a previously verified payment and derives the receipt
    /// header. Called after the protected handler produced a successful
    /// response; attempted at most once per verified proof. Failures are
    /// always returned as data, never raised.
    pub async fn process_settlement(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> SettleOutcome {
        match self.authority.settle_payment(payload, requirements).await {
            Ok(response) if response.success => {
                let receipt = SettlementReceipt {
                    success: true,
                    transaction: response.transaction.clone().unwrap_or_default(),
                    network: response.network.clone(),
                    payer: response.payer.clone(),
                    requirements: requirements.clone(),
                };
                match headers::encode_settlement_receipt(&receipt) {
                    Ok(encoded) => {
                        #[cfg(feature = "telemetry")]
                        tracing::debug!(
                            transaction = %receipt.transaction,
                            network = %receipt.network,
                            "payment settled"
                        );
                        SettleOutcome {
                            success: true,
                            error_reason: None,
                            headers: vec![
                                (PAYMENT_RESPONSE_HEADER.to_owned(), encoded),
                                (
                                    ACCESS_CONTROL_EXPOSE_HEADERS.to_owned(),
                                    PAYMENT_RESPONSE_HEADER.to_owned(),
                                ),
                            ],
                            transaction: response.transaction,
                            network: Some(response.network),
                            payer: response.payer,
                        }
                    }
                    Err(e) => settle_failure(
                        e.to_string(),
                        Some(response.network),
                        response.payer,
                        response.transaction,
                    ),
                }
            }
            Ok(response) => {
                let reason = response
                    .error_reason
                    .unwrap_or_else(|| "settlement failed".to_owned());
                #[cfg(feature = "telemetry")]
                tracing::warn!(reason = %reason, network = %response.network, "settlement failed");
                settle_failure(
                    reason,
                    Some(response.network),
                    response.payer,
                    response.transaction,
                )
            }
            Err(e) => {
                #[cfg(feature = "telemetry")]
                tracing::warn!(error = %e, "settlement errored");
                if let Some(structured) = e.downcast_ref::<SettlementError>() {
                    settle_failure(
                        structured.reason.clone(),
                        structured
                            .network
                            .clone()
                            .or_else(|| Some(requirements.network.clone())),
                        structured.payer.clone(),
                        structured.transaction.clone(),
                    )
                } else {
                    settle_failure(
                        e.to_string(),
                        Some(requirements.network.clone()),
                        None,
                        Some(String::new()),
                    )
                }
            }
        }
    }

    /// Returns every validation violation across all routes and options.
    /// Never short-circuits: later routes are checked even after earlier
    /// failures.
    fn validate_routes(&self) -> Vec<RouteValidationError> {
        let mut violations = Vec::new();
        for route in &self.routes {
            for option in &route.config.accepts {
                if !self
                    .authority
                    .has_registered_scheme(&option.network, &option.scheme)
                {
                    violations.push(RouteValidationError {
                        route_pattern: route.pattern.clone(),
                        scheme: option.scheme.clone(),
                        network: option.network.clone(),
                        reason: ValidationReason::MissingScheme,
                        message: format!(
                            "route '{}': no scheme '{}' registered for network '{}'",
                            route.pattern, option.scheme, option.network
                        ),
                    });
                }
                if self
                    .authority
                    .supported_kind(X402_VERSION, &option.network, &option.scheme)
                    .is_none()
                {
                    violations.push(RouteValidationError {
                        route_pattern: route.pattern.clone(),
                        scheme: option.scheme.clone(),
                        network: option.network.clone(),
                        reason: ValidationReason::MissingFacilitator,
                        message: format!(
                            "route '{}': facilitator does not support scheme '{}' on network '{}' for x402 v{}",
                            route.pattern, option.scheme, option.network, X402_VERSION
                        ),
                    });
                }
            }
        }
        violations
    }

    /// First declared route whose verb and matcher accept the request.
    fn find_route(&self, ctx: &RequestContext) -> Option<&CompiledRoute> {
        self.routes
            .iter()
            .find(|r| r.matches(ctx.method(), ctx.path()))
    }

    /// Shapes a 402 response: paywall HTML for browsers, structured body
    /// with protocol headers for API clients.
    async fn compose_payment_error(
        &self,
        required: &PaymentRequired,
        ctx: &RequestContext,
        config: &RouteConfig,
        paywall_config: Option<&PaywallConfig>,
    ) -> ResponseInstructions {
        let encoded = headers::encode_payment_required(required).unwrap_or_default();

        let accept = ctx.adapter().accept();
        let user_agent = ctx.adapter().user_agent();
        if paywall::is_browser_request(accept.as_deref(), user_agent.as_deref()) {
            // Prioritized chain: custom HTML, registered renderer, fallback.
            let html = if let Some(custom) = &config.custom_paywall_html {
                custom.clone()
            } else if let Some(renderer) = &self.renderer {
                renderer.generate_html(required, paywall_config)
            } else {
                paywall::fallback_page(required, &encoded, paywall_config)
            };
            return ResponseInstructions {
                status: HTTP_STATUS_PAYMENT_REQUIRED,
                headers: Vec::new(),
                content_type: "text/html; charset=utf-8".to_owned(),
                body: html,
            };
        }

        let (content_type, body) = if let Some(generator) = &config.unpaid_response {
            let unpaid = generator(ctx).await;
            (unpaid.content_type, unpaid.body)
        } else {
            ("application/json".to_owned(), "{}".to_owned())
        };

        ResponseInstructions {
            status: HTTP_STATUS_PAYMENT_REQUIRED,
            headers: vec![
                (PAYMENT_REQUIRED_HEADER.to_owned(), encoded),
                (
                    ACCESS_CONTROL_EXPOSE_HEADERS.to_owned(),
                    PAYMENT_REQUIRED_HEADER.to_owned(),
                ),
            ],
            content_type,
            body,
        }
    }
}

/// Reads and decodes the payment proof header. Absence and decode failure
/// are equivalent: both degrade to "no proof" rather than failing the
/// request.
fn extract_payment_payload(ctx: &RequestContext) -> Option<PaymentPayload> {
    let raw = ctx.payment_header()?;
    match headers::decode_payment_payload(raw) {
        Ok(payload) => Some(payload),
        Err(_err) => {
            #[cfg(feature = "telemetry")]
            tracing::warn!(error = %_err, "malformed payment header; treating as unpaid");
            None
        }
    }
}

fn resource_info(config: &RouteConfig, ctx: &RequestContext) -> ResourceInfo {
    ResourceInfo {
        url: config
            .resource
            .clone()
            .unwrap_or_else(|| ctx.adapter().url()),
        description: config.description.clone(),
        mime_type: config.mime_type.clone(),
    }
}

fn internal_error_response(message: &str) -> ResponseInstructions {
    ResponseInstructions {
        status: 500,
        headers: Vec::new(),
        content_type: "application/json".to_owned(),
        body: serde_json::json!({ "error": message }).to_string(),
    }
}

fn settle_failure(
    reason: String,
    network: Option<String>,
    payer: Option<String>,
    transaction: Option<String>,
) -> SettleOutcome {
    SettleOutcome {
        success: false,
        error_reason: Some(reason),
        headers: Vec::new(),
        transaction,
        network,
        payer,
    }
}
