//! Wallet Connector
//!
//! Reduces a wallet provider's account authorization to one boolean fact,
//! `connected`. No address, balance or chain id is tracked, and there is no
//! disconnect path: once connected, the session stays connected.
//!
//! Created: 2026-10-19

pub mod rpc;

pub use rpc::RpcWallet;

use crate::error::WalletError;
use crate::state::StateHandle;
use alloy::primitives::Address;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Wallet provider boundary (`eth_requestAccounts`)
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Ask the wallet to authorize account access.
    /// An `Err` string is the provider's rejection reason.
    async fn request_accounts(&self) -> Result<Vec<Address>, String>;
}

/// Requests account access from an optional wallet provider
pub struct WalletConnector {
    /// None = no provider present (nothing injected / configured)
    provider: Option<Arc<dyn WalletProvider>>,
    store: StateHandle,
}

impl WalletConnector {
    pub fn new(provider: Option<Arc<dyn WalletProvider>>, store: StateHandle) -> Self {
        Self { provider, store }
    }

    /// Request account authorization.
    ///
    /// Already connected: returns `Ok(true)` without calling the provider.
    /// Rejection leaves `connected` at its prior value.
    pub async fn connect(&self) -> Result<bool, WalletError> {
        let provider = match &self.provider {
            Some(p) => p,
            None => {
                warn!("Wallet connect requested but no wallet provider is available");
                return Err(WalletError::ProviderUnavailable);
            }
        };

        if self.store.snapshot().wallet_connected {
            return Ok(true);
        }

        match provider.request_accounts().await {
            Ok(accounts) if !accounts.is_empty() => {
                info!("Wallet connected ({} account(s) authorized)", accounts.len());
                self.store.set_wallet_connected();
                // Return only once the fact is visible in snapshots
                let _ = self.store.flush().await;
                Ok(true)
            }
            Ok(_) => {
                warn!("Wallet returned no accounts - treating as rejection");
                Err(WalletError::ConnectionRejected("no accounts authorized".to_string()))
            }
            Err(reason) => {
                warn!("Wallet connection rejected: {}", reason);
                Err(WalletError::ConnectionRejected(reason))
            }
        }
    }
}
