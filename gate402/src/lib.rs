#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for x402 payment mediation.
//!
//! This crate provides the foundational types used by the HTTP mediation
//! engine in `gate402-http` for implementing HTTP 402 Payment Required
//! flows. It is transport-agnostic: wire types, structured errors, payment
//! option configuration, and the [`authority::ResourceAuthority`] boundary
//! trait live here, while request handling lives in the transport crate.
//!
//! # Overview
//!
//! When a client requests a payment-gated resource, the server responds
//! with payment requirements (a 402 response). The client submits a payment
//! proof, which the server verifies and later settles through a resource
//! authority backed by a remote facilitator.
//!
//! # Modules
//!
//! - [`authority`] - Boundary trait for requirement building, verify and settle
//! - [`config`] - Payment option configuration shapes
//! - [`error`] - Structured error types
//! - [`proto`] - Wire format types shared across the protocol

pub mod authority;
pub mod config;
pub mod error;
pub mod proto;

pub use authority::{AuthorityError, BoxFuture, ResourceAuthority};
pub use config::{ResolvedPaymentOption, X402_VERSION};
pub use error::{SchemeNotFoundError, SettlementError};
pub use proto::{
    PaymentPayload, PaymentRequired, PaymentRequirements, ResourceInfo, SettleResponse,
    SettlementReceipt, SupportedPaymentKind, SupportedResponse, VerifyResponse,
};
