//! Console session
//!
//! Wires the state store, wallet connector, command dispatcher and
//! reconciliation loop together and owns their lifetimes:
//! - `start()` runs the startup sync and starts the loop (once)
//! - `shutdown()` cancels the loop exactly once and stops the store
//!
//! Created: 2026-10-19

use crate::api::{BotApi, HttpBotApi};
use crate::config::ConsoleConfig;
use crate::dispatcher::CommandDispatcher;
use crate::error::{CommandError, TransportError, WalletError};
use crate::reconcile::{initial_sync, LoopHandle, ReconciliationLoop};
use crate::state::{ClientState, StateHandle, StateStore};
use crate::types::{ApiInfo, DeployReceipt, TokenPrice, Trade};
use crate::view::{project, ViewConfig, ViewModel};
use crate::wallet::{RpcWallet, WalletConnector, WalletProvider};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub struct Session {
    api: Arc<dyn BotApi>,
    store: StateHandle,
    store_task: JoinHandle<()>,
    wallet: WalletConnector,
    dispatcher: CommandDispatcher,
    view_config: ViewConfig,
    poll_interval: Duration,
    poller: Option<LoopHandle>,
}

impl Session {
    /// Build a session around explicit collaborators. Must run inside a tokio runtime.
    pub fn new(
        config: &ConsoleConfig,
        api: Arc<dyn BotApi>,
        wallet: Option<Arc<dyn WalletProvider>>,
    ) -> Self {
        let (store, store_task) = StateStore::spawn(ClientState::new());

        Self {
            wallet: WalletConnector::new(wallet, store.clone()),
            dispatcher: CommandDispatcher::new(Arc::clone(&api), store.clone()),
            api,
            store,
            store_task,
            view_config: ViewConfig::from(config),
            poll_interval: config.poll_interval(),
            poller: None,
        }
    }

    /// HTTP backend plus the configured wallet RPC, if any
    pub async fn from_config(config: &ConsoleConfig) -> Self {
        let api: Arc<dyn BotApi> = Arc::new(HttpBotApi::new(&config.api_base_url));

        let wallet: Option<Arc<dyn WalletProvider>> = match &config.wallet_rpc_url {
            Some(url) => match RpcWallet::connect(url).await {
                Ok(wallet) => Some(Arc::new(wallet)),
                Err(e) => {
                    warn!("Wallet provider unavailable: {:#}", e);
                    None
                }
            },
            None => {
                info!("No wallet RPC configured");
                None
            }
        };

        Self::new(config, api, wallet)
    }

    /// Startup sync, then start the reconciliation loop. A second call is a no-op.
    pub async fn start(&mut self) {
        if self.poller.is_some() {
            return;
        }
        initial_sync(self.api.as_ref(), &self.store).await;
        let _ = self.store.flush().await;

        let poller =
            ReconciliationLoop::new(Arc::clone(&self.api), self.store.clone(), self.poll_interval);
        self.poller = Some(poller.spawn());
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(|p| p.is_running())
    }

    pub async fn connect_wallet(&self) -> Result<bool, WalletError> {
        self.wallet.connect().await
    }

    pub async fn deploy_contract(&self) -> Result<DeployReceipt, CommandError> {
        self.dispatcher.deploy_contract().await
    }

    pub async fn start_bot(&self) -> Result<(), CommandError> {
        self.dispatcher.start_bot().await
    }

    pub async fn stop_bot(&self) -> Result<(), CommandError> {
        self.dispatcher.stop_bot().await
    }

    /// Backend greeting, used as a reachability check
    pub async fn health(&self) -> Result<ApiInfo, TransportError> {
        self.api.health().await
    }

    pub async fn trades(&self) -> Result<Vec<Trade>, TransportError> {
        self.api.trades().await
    }

    pub async fn token_price(&self, token: &str) -> Result<TokenPrice, TransportError> {
        self.api.token_price(token).await
    }

    /// Latest snapshot
    pub fn state(&self) -> Arc<ClientState> {
        self.store.snapshot()
    }

    pub fn view(&self) -> ViewModel {
        project(&self.store.snapshot(), &self.view_config)
    }

    pub fn view_config(&self) -> &ViewConfig {
        &self.view_config
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<ClientState>> {
        self.store.subscribe()
    }

    /// End the session. In-flight fetches are not cancelled; their results are dropped.
    pub async fn shutdown(mut self) {
        if let Some(poller) = self.poller.take() {
            poller.shutdown();
        }
        self.store.shutdown();
        if let Err(e) = (&mut self.store_task).await {
            warn!("State store task ended abnormally: {}", e);
        }
        info!("Session closed");
    }
}
