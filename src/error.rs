//! Console error taxonomy
//!
//! Nothing here is fatal to a session. Every variant maps to a defined
//! recovery: keep stale data, show a notice, or reject before any request.
//!
//! Created: 2026-10-19

use std::fmt;
use thiserror::Error;

/// Why a backend request did not produce a usable payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportKind {
    /// Connection refused, reset, DNS failure, ...
    Network(String),
    /// Backend answered with a non-2xx status
    Status(u16),
    /// Body did not decode into the expected type
    Decode(String),
    /// Body decoded but violates a payload invariant
    Malformed(String),
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TransportKind::Network(e) => write!(f, "network error: {}", e),
            TransportKind::Status(code) => write!(f, "HTTP {}", code),
            TransportKind::Decode(e) => write!(f, "decode error: {}", e),
            TransportKind::Malformed(e) => write!(f, "malformed payload: {}", e),
        }
    }
}

/// Network/HTTP failure on a backend call. Readers keep their previous snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{endpoint}: {kind}")]
pub struct TransportError {
    pub endpoint: String,
    pub kind: TransportKind,
}

impl TransportError {
    pub fn new(endpoint: impl Into<String>, kind: TransportKind) -> Self {
        Self {
            endpoint: endpoint.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// No wallet provider is available; trading cannot proceed
    #[error("no wallet provider available")]
    ProviderUnavailable,
    /// User or provider declined account access
    #[error("wallet connection rejected: {0}")]
    ConnectionRejected(String),
}

/// A command precondition that did not hold when the command was issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    BotAlreadyActive,
    ContractNotDeployed,
    ContractAlreadyDeployed,
    BotNotActive,
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Precondition::BotAlreadyActive => write!(f, "bot is already active"),
            Precondition::ContractNotDeployed => write!(f, "contract is not deployed"),
            Precondition::ContractAlreadyDeployed => write!(f, "contract is already deployed"),
            Precondition::BotNotActive => write!(f, "bot is not active"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("connect a wallet first")]
    WalletRequired,
    #[error("{0} already in progress")]
    AlreadyInProgress(&'static str),
    #[error("precondition failed: {}", join_preconditions(.0))]
    PreconditionFailed(Vec<Precondition>),
    #[error("command failed: {0}")]
    CommandFailed(#[from] TransportError),
    /// Session state store has shut down
    #[error("session closed")]
    StoreClosed,
}

fn join_preconditions(failed: &[Precondition]) -> String {
    failed
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Rejected contract phase transition; the phase is left unchanged
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid contract transition: {event} while {from}")]
pub struct TransitionError {
    pub from: &'static str,
    pub event: &'static str,
}
