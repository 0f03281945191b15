//! Console State Machine
//!
//! States (contract lifecycle):
//! - NotDeployed: nothing on chain yet (or backend says so)
//! - Deploying: deploy request in flight, re-entry rejected
//! - Deployed: address + tx hash known, terminal for this session
//!
//! `ClientState` aggregates the wallet fact, contract phase, bot status and
//! opportunity snapshot. It is owned by the `StateStore` actor; everything
//! else sees immutable snapshots.
//!
//! Created: 2026-10-19

pub mod store;

pub use store::{StateHandle, StateStore};

use crate::error::{TransportError, TransportKind, TransitionError};
use crate::types::{BotStatus, ContractStatus, DeployReceipt, Opportunity};
use std::fmt;

/// Contract lifecycle. `Deployed` always carries its address and tx hash.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ContractPhase {
    #[default]
    NotDeployed,
    Deploying,
    Deployed { address: String, tx_hash: String },
}

/// Inputs to the contract transition table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractEvent {
    /// User asked to deploy; set before the request goes out
    BeginDeploy,
    DeployConfirmed(DeployReceipt),
    DeployFailed,
    /// Status read from the backend
    Observed(ContractPhase),
}

impl ContractEvent {
    fn name(&self) -> &'static str {
        match self {
            ContractEvent::BeginDeploy => "BeginDeploy",
            ContractEvent::DeployConfirmed(_) => "DeployConfirmed",
            ContractEvent::DeployFailed => "DeployFailed",
            ContractEvent::Observed(_) => "Observed",
        }
    }
}

impl ContractPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractPhase::NotDeployed => "NotDeployed",
            ContractPhase::Deploying => "Deploying",
            ContractPhase::Deployed { .. } => "Deployed",
        }
    }

    pub fn is_deployed(&self) -> bool {
        matches!(self, ContractPhase::Deployed { .. })
    }

    pub fn is_deploying(&self) -> bool {
        matches!(self, ContractPhase::Deploying)
    }

    pub fn address(&self) -> Option<&str> {
        match self {
            ContractPhase::Deployed { address, .. } => Some(address),
            _ => None,
        }
    }

    pub fn tx_hash(&self) -> Option<&str> {
        match self {
            ContractPhase::Deployed { tx_hash, .. } => Some(tx_hash),
            _ => None,
        }
    }

    /// Transition table. On `Err` the caller keeps the current phase.
    ///
    /// Observations never move a contract out of `Deploying` (the in-flight
    /// deploy owns that transition) or out of `Deployed` (no re-deploy path).
    pub fn apply(&self, event: ContractEvent) -> Result<ContractPhase, TransitionError> {
        let reject = |event: &ContractEvent| TransitionError {
            from: self.as_str(),
            event: event.name(),
        };

        match (self, event) {
            (ContractPhase::NotDeployed, ContractEvent::BeginDeploy) => Ok(ContractPhase::Deploying),
            (ContractPhase::Deploying, ContractEvent::DeployConfirmed(receipt)) => {
                Ok(ContractPhase::Deployed {
                    address: receipt.address,
                    tx_hash: receipt.tx_hash,
                })
            }
            (ContractPhase::Deploying, ContractEvent::DeployFailed) => Ok(ContractPhase::NotDeployed),
            (ContractPhase::NotDeployed, ContractEvent::Observed(observed)) => match observed {
                ContractPhase::Deploying => Ok(ContractPhase::NotDeployed),
                other => Ok(other),
            },
            (ContractPhase::Deploying, ContractEvent::Observed(_)) => Ok(ContractPhase::Deploying),
            (deployed @ ContractPhase::Deployed { .. }, ContractEvent::Observed(_)) => Ok(deployed.clone()),
            (_, event) => Err(reject(&event)),
        }
    }
}

impl fmt::Display for ContractPhase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<ContractStatus> for ContractPhase {
    type Error = TransportError;

    /// `deployed: true` without both address and tx hash is a malformed payload
    fn try_from(status: ContractStatus) -> Result<Self, Self::Error> {
        if !status.deployed {
            return Ok(ContractPhase::NotDeployed);
        }
        match (status.address, status.tx_hash) {
            (Some(address), Some(tx_hash)) if !address.is_empty() && !tx_hash.is_empty() => {
                Ok(ContractPhase::Deployed { address, tx_hash })
            }
            _ => Err(TransportError::new(
                "GET /contract/status",
                TransportKind::Malformed("deployed without address/txHash".to_string()),
            )),
        }
    }
}

/// Bot activity as last reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotActivity {
    Active,
    Inactive,
}

/// Whole-session lifecycle view derived from a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    Disconnected,
    Connected,
    Deploying,
    Deployed {
        address: String,
        tx_hash: String,
        bot: BotActivity,
    },
}

/// Single source of truth read by the view projector
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientState {
    pub wallet_connected: bool,
    pub contract: ContractPhase,
    pub bot: BotStatus,
    pub opportunities: Vec<Opportunity>,
    /// Bumped on every applied write
    pub revision: u64,
}

impl ClientState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bot_activity(&self) -> BotActivity {
        if self.bot.active {
            BotActivity::Active
        } else {
            BotActivity::Inactive
        }
    }

    pub fn phase(&self) -> SessionPhase {
        match &self.contract {
            ContractPhase::Deployed { address, tx_hash } => SessionPhase::Deployed {
                address: address.clone(),
                tx_hash: tx_hash.clone(),
                bot: self.bot_activity(),
            },
            ContractPhase::Deploying => SessionPhase::Deploying,
            ContractPhase::NotDeployed if self.wallet_connected => SessionPhase::Connected,
            ContractPhase::NotDeployed => SessionPhase::Disconnected,
        }
    }
}
