#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! HTTP mediation engine for the x402 payment protocol.
//!
//! Sits between an HTTP framework and a [`gate402::ResourceAuthority`]:
//! decides per request whether payment is required, extracts and verifies
//! payment proofs, drives settlement, and composes 402 responses (paywall
//! HTML for browsers, structured bodies for API clients). Framework
//! bindings stay thin: they adapt requests via [`context::Adapter`] and
//! apply the [`types::ResponseInstructions`] the engine hands back.
//!
//! # Modules
//!
//! - [`gate`] — the [`PaymentGate`] mediation engine
//! - [`routes`] — route patterns, compilation, path normalization
//! - [`context`] — request adaptation and per-request context
//! - [`headers`] — Base64 codec for the x402 HTTP headers
//! - [`paywall`] — browser detection and paywall rendering
//! - [`types`] — route configuration and processing results
//! - [`constants`] — header names and status codes
//! - [`error`] — engine error types

pub mod constants;
pub mod context;
pub mod error;
pub mod gate;
pub mod headers;
pub mod paywall;
pub mod routes;
pub mod types;

pub use constants::{
    PAYMENT_REQUIRED_HEADER, PAYMENT_RESPONSE_HEADER, PAYMENT_SIGNATURE_HEADER,
};
pub use context::{Adapter, HttpAdapter, RequestContext};
pub use error::{GateError, HttpError, VerificationError};
pub use gate::PaymentGate;
pub use paywall::{PaywallRenderer, is_browser_request};
pub use routes::{RoutesConfig, normalize_path};
pub use types::{
    Dynamic, PaymentOption, PaywallConfig, ProcessResult, ResponseInstructions, RouteConfig,
    RouteValidationError, SettleOutcome, UnpaidResponse, ValidationReason,
};
