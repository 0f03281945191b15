//! JSON-RPC wallet provider
//!
//! Talks to a wallet-capable JSON-RPC endpoint (a local signer such as Frame,
//! or a node with unlocked accounts) through an alloy provider and issues
//! `eth_requestAccounts`. Transport errors are reported as rejections.
//!
//! Created: 2026-10-19

use super::WalletProvider;
use alloy::primitives::Address;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};

/// Wallet provider backed by an alloy RPC connection
pub struct RpcWallet<P = DynProvider> {
    provider: P,
    endpoint: String,
}

impl RpcWallet<DynProvider> {
    /// Connect to `url` (http://, ws:// or an IPC path)
    pub async fn connect(url: &str) -> Result<Self> {
        let provider = ProviderBuilder::new()
            .connect(url)
            .await
            .with_context(|| format!("Failed to connect to wallet RPC: {}", url))?;
        info!("Wallet RPC provider ready: {}", url);

        Ok(Self {
            provider: provider.erased(),
            endpoint: url.to_string(),
        })
    }
}

impl<P> RpcWallet<P> {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl<P: Provider + Send + Sync> WalletProvider for RpcWallet<P> {
    async fn request_accounts(&self) -> std::result::Result<Vec<Address>, String> {
        debug!("eth_requestAccounts -> {}", self.endpoint);
        self.provider
            .raw_request::<(), Vec<Address>>("eth_requestAccounts".into(), ())
            .await
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::api::http::tests::closed_port;

    #[tokio::test]
    async fn test_unreachable_wallet_is_rejection() {
        // HTTP transports connect lazily, so the failure surfaces on request
        let url = format!("http://127.0.0.1:{}", closed_port());
        let wallet = RpcWallet::connect(&url).await.unwrap();
        assert_eq!(wallet.endpoint(), url);
        assert!(wallet.request_accounts().await.is_err());
    }
}
