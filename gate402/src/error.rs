//! Structured error types for payment mediation.

use std::fmt;

/// Settlement failed with structured diagnostics.
///
/// Raised (or returned boxed) by [`ResourceAuthority`](crate::authority::ResourceAuthority)
/// implementations when settlement fails in a way that carries on-chain
/// context. The mediation engine preserves these fields in its settlement
/// outcome instead of collapsing them into a plain message.
#[derive(Debug, Clone)]
pub struct SettlementError {
    /// Machine-readable reason for the failure.
    pub reason: String,
    /// Optional human-readable message.
    pub message: Option<String>,
    /// The payer's address, if known.
    pub payer: Option<String>,
    /// The network where settlement was attempted.
    pub network: Option<String>,
    /// Transaction hash/identifier, if one was produced.
    pub transaction: Option<String>,
}

impl SettlementError {
    /// Creates a new settlement error with the given reason.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            message: None,
            payer: None,
            network: None,
            transaction: None,
        }
    }

    /// Sets the human-readable message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the payer address.
    #[must_use]
    pub fn with_payer(mut self, payer: impl Into<String>) -> Self {
        self.payer = Some(payer.into());
        self
    }

    /// Sets the network identifier.
    #[must_use]
    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = Some(network.into());
        self
    }

    /// Sets the transaction identifier.
    #[must_use]
    pub fn with_transaction(mut self, tx: impl Into<String>) -> Self {
        self.transaction = Some(tx.into());
        self
    }
}

impl fmt::Display for SettlementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(msg) = &self.message {
            write!(f, "{}: {}", self.reason, msg)
        } else {
            write!(f, "{}", self.reason)
        }
    }
}

impl std::error::Error for SettlementError {}

/// No registered scheme found for a scheme/network combination.
#[derive(Debug, Clone)]
pub struct SchemeNotFoundError {
    /// The requested scheme.
    pub scheme: String,
    /// The requested network.
    pub network: String,
}

impl SchemeNotFoundError {
    /// Creates a new scheme-not-found error.
    #[must_use]
    pub fn new(scheme: impl Into<String>, network: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            network: network.into(),
        }
    }
}

impl fmt::Display for SchemeNotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "No scheme '{}' registered for network '{}'",
            self.scheme, self.network
        )
    }
}

impl std::error::Error for SchemeNotFoundError {}
