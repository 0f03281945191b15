//! Command Dispatcher
//!
//! Deploy, start and stop as single request/await/settle cycles.
//!
//! Deploy re-entry is guarded by the `Deploying` phase in the state store.
//! Start and stop share a dispatcher-local guard so only one bot command is
//! in flight at a time. Preconditions are checked against the latest
//! snapshot before any request goes out.
//!
//! Created: 2026-10-19

use crate::api::BotApi;
use crate::error::{CommandError, Precondition, TransportError, TransportKind};
use crate::reconcile::refresh_bot_status;
use crate::state::StateHandle;
use crate::types::DeployReceipt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

pub struct CommandDispatcher {
    api: Arc<dyn BotApi>,
    store: StateHandle,
    /// Held for the duration of a start/stop request
    bot_command: Mutex<()>,
}

impl CommandDispatcher {
    pub fn new(api: Arc<dyn BotApi>, store: StateHandle) -> Self {
        Self {
            api,
            store,
            bot_command: Mutex::new(()),
        }
    }

    /// Deploy the flash-loan contract.
    ///
    /// The store enters `Deploying` before the request is sent, and leaves it
    /// in one write on either outcome.
    pub async fn deploy_contract(&self) -> Result<DeployReceipt, CommandError> {
        if let Err(e) = self.store.begin_deploy().await {
            warn!("Deploy rejected: {}", e);
            return Err(e);
        }
        let mut pending = PendingDeploy::armed(&self.store);
        info!("Deploying contract...");

        let receipt = self.api.deploy_contract().await.and_then(|receipt| {
            if receipt.address.is_empty() || receipt.tx_hash.is_empty() {
                return Err(TransportError::new(
                    "POST /contract/deploy",
                    TransportKind::Malformed("missing address or txHash".to_string()),
                ));
            }
            Ok(receipt)
        });

        match receipt {
            Ok(receipt) => {
                info!("Contract deployed at {} (tx {})", receipt.address, receipt.tx_hash);
                pending.disarm();
                self.store.confirm_deploy(receipt.clone());
                let _ = self.store.flush().await;
                Ok(receipt)
            }
            Err(e) => {
                warn!("Contract deployment failed: {}", e);
                pending.disarm();
                self.store.fail_deploy();
                let _ = self.store.flush().await;
                Err(CommandError::CommandFailed(e))
            }
        }
    }

    /// Start the bot engine, then refresh status immediately
    pub async fn start_bot(&self) -> Result<(), CommandError> {
        let state = self.store.snapshot();
        let mut failed = Vec::new();
        if state.bot.active {
            failed.push(Precondition::BotAlreadyActive);
        }
        if !state.contract.is_deployed() {
            failed.push(Precondition::ContractNotDeployed);
        }
        if !failed.is_empty() {
            let err = CommandError::PreconditionFailed(failed);
            warn!("Start bot rejected: {}", err);
            return Err(err);
        }

        let _guard = self
            .bot_command
            .try_lock()
            .map_err(|_| CommandError::AlreadyInProgress("bot command"))?;

        if let Err(e) = self.api.start_bot().await {
            warn!("Start bot failed: {}", e);
            return Err(CommandError::CommandFailed(e));
        }
        info!("Bot started");

        self.refresh().await;
        Ok(())
    }

    /// Stop the bot engine, drop the opportunity snapshot, then refresh
    pub async fn stop_bot(&self) -> Result<(), CommandError> {
        if !self.store.snapshot().bot.active {
            let err = CommandError::PreconditionFailed(vec![Precondition::BotNotActive]);
            warn!("Stop bot rejected: {}", err);
            return Err(err);
        }

        let _guard = self
            .bot_command
            .try_lock()
            .map_err(|_| CommandError::AlreadyInProgress("bot command"))?;

        if let Err(e) = self.api.stop_bot().await {
            warn!("Stop bot failed: {}", e);
            return Err(CommandError::CommandFailed(e));
        }
        info!("Bot stopped");

        self.store.clear_opportunities();
        self.refresh().await;
        Ok(())
    }

    /// Out-of-band bot status refresh; failure keeps the stale status
    async fn refresh(&self) {
        refresh_bot_status(self.api.as_ref(), &self.store).await;
        let _ = self.store.flush().await;
    }
}

/// Leaves `Deploying` if the deploy future is dropped before it settles
struct PendingDeploy<'a> {
    store: &'a StateHandle,
    armed: bool,
}

impl<'a> PendingDeploy<'a> {
    fn armed(store: &'a StateHandle) -> Self {
        Self { store, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for PendingDeploy<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!("Deploy cancelled before the backend answered, leaving Deploying");
            self.store.fail_deploy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeApi;
    use crate::state::{BotActivity, ClientState, SessionPhase, StateStore};
    use crate::types::Opportunity;
    use rust_decimal_macros::dec;
    use tokio_test::{assert_err, assert_ok};

    fn connected_store() -> StateHandle {
        let (store, _task) = StateStore::spawn(ClientState::new());
        store.set_wallet_connected();
        store
    }

    async fn deployed(api: &Arc<FakeApi>) -> (CommandDispatcher, StateHandle) {
        let store = connected_store();
        let dispatcher = CommandDispatcher::new(api.clone(), store.clone());
        dispatcher.deploy_contract().await.unwrap();
        (dispatcher, store)
    }

    #[tokio::test]
    async fn test_deploy_requires_wallet() {
        let api = FakeApi::new();
        let (store, _task) = StateStore::spawn(ClientState::new());
        let dispatcher = CommandDispatcher::new(api.clone(), store.clone());

        assert_eq!(dispatcher.deploy_contract().await, Err(CommandError::WalletRequired));
        assert_eq!(api.calls("deploy_contract"), 0);
        assert_eq!(store.flush().await.unwrap().phase(), SessionPhase::Disconnected);
    }

    #[tokio::test]
    async fn test_concurrent_deploy_sends_one_request() {
        let api = FakeApi::new();
        let gate = api.gate_deploy();
        let store = connected_store();
        let dispatcher = CommandDispatcher::new(api.clone(), store.clone());

        let first = dispatcher.deploy_contract();
        let second = async {
            // Let the first call enter Deploying and reach the backend
            while !store.snapshot().contract.is_deploying() {
                tokio::task::yield_now().await;
            }
            let result = dispatcher.deploy_contract().await;
            gate.notify_one();
            result
        };
        let (first, second) = tokio::join!(first, second);

        assert_eq!(first.unwrap().address, "0xABC");
        assert_eq!(second, Err(CommandError::AlreadyInProgress("deploy")));
        assert_eq!(api.calls("deploy_contract"), 1);
    }

    #[tokio::test]
    async fn test_deploy_failure_is_retriable() {
        let api = FakeApi::new();
        api.fail("deploy_contract");
        let store = connected_store();
        let dispatcher = CommandDispatcher::new(api.clone(), store.clone());

        let err = assert_err!(dispatcher.deploy_contract().await);
        assert!(matches!(err, CommandError::CommandFailed(_)));
        let state = store.snapshot();
        assert_eq!(state.phase(), SessionPhase::Connected);

        api.recover("deploy_contract");
        assert!(dispatcher.deploy_contract().await.is_ok());
        assert!(store.snapshot().contract.is_deployed());
        assert_eq!(api.calls("deploy_contract"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_deploy_is_retriable() {
        let api = FakeApi::new();
        let gate = api.gate_deploy();
        let store = connected_store();
        let dispatcher = CommandDispatcher::new(api.clone(), store.clone());

        let timed_out = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            dispatcher.deploy_contract(),
        )
        .await;
        assert!(timed_out.is_err());
        assert_eq!(store.flush().await.unwrap().phase(), SessionPhase::Connected);

        gate.notify_one();
        let receipt = assert_ok!(dispatcher.deploy_contract().await);
        assert_eq!(receipt.tx_hash, "0x123");
        assert!(store.snapshot().contract.is_deployed());
        assert_eq!(api.calls("deploy_contract"), 2);
    }

    #[tokio::test]
    async fn test_second_deploy_after_success_rejected() {
        let api = FakeApi::new();
        let (dispatcher, _store) = deployed(&api).await;
        assert_eq!(
            dispatcher.deploy_contract().await,
            Err(CommandError::PreconditionFailed(vec![Precondition::ContractAlreadyDeployed]))
        );
        assert_eq!(api.calls("deploy_contract"), 1);
    }

    #[tokio::test]
    async fn test_start_without_contract_sends_nothing() {
        let api = FakeApi::new();
        let store = connected_store();
        let dispatcher = CommandDispatcher::new(api.clone(), store.clone());
        let before = store.flush().await.unwrap();

        assert_eq!(
            dispatcher.start_bot().await,
            Err(CommandError::PreconditionFailed(vec![Precondition::ContractNotDeployed]))
        );
        assert_eq!(api.calls("start_bot"), 0);
        assert_eq!(store.flush().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_start_lists_every_failed_precondition() {
        let api = FakeApi::new();
        let store = connected_store();
        store.set_bot_status(crate::types::BotStatus {
            active: true,
            ..Default::default()
        });
        store.flush().await.unwrap();
        let dispatcher = CommandDispatcher::new(api.clone(), store);

        assert_eq!(
            dispatcher.start_bot().await,
            Err(CommandError::PreconditionFailed(vec![
                Precondition::BotAlreadyActive,
                Precondition::ContractNotDeployed,
            ]))
        );
    }

    #[tokio::test]
    async fn test_stop_while_inactive_sends_nothing() {
        let api = FakeApi::new();
        let (dispatcher, _store) = deployed(&api).await;

        assert_eq!(
            dispatcher.stop_bot().await,
            Err(CommandError::PreconditionFailed(vec![Precondition::BotNotActive]))
        );
        assert_eq!(api.calls("stop_bot"), 0);
    }

    #[tokio::test]
    async fn test_start_refreshes_without_waiting_for_tick() {
        let api = FakeApi::new();
        let (dispatcher, store) = deployed(&api).await;

        dispatcher.start_bot().await.unwrap();
        assert_eq!(api.calls("bot_status"), 1);
        assert_eq!(
            store.snapshot().phase(),
            SessionPhase::Deployed {
                address: "0xABC".to_string(),
                tx_hash: "0x123".to_string(),
                bot: BotActivity::Active,
            }
        );
    }

    #[tokio::test]
    async fn test_failed_refresh_does_not_fail_command() {
        let api = FakeApi::new();
        let (dispatcher, store) = deployed(&api).await;
        api.fail("bot_status");

        assert_eq!(dispatcher.start_bot().await, Ok(()));
        // Stale status stays until the next successful read
        assert!(!store.snapshot().bot.active);
    }

    #[tokio::test]
    async fn test_stop_clears_opportunities() {
        let api = FakeApi::new();
        let (dispatcher, store) = deployed(&api).await;
        dispatcher.start_bot().await.unwrap();
        store.set_opportunities(vec![Opportunity {
            id: "opp-1".to_string(),
            token_pair: "WETH/USDC".to_string(),
            dex_from: "Uniswap V3".to_string(),
            dex_to: "SushiSwap".to_string(),
            profit_eth: dec!(0.02),
            profit_usd: dec!(50),
            timestamp: None,
        }]);
        assert_eq!(store.flush().await.unwrap().opportunities.len(), 1);

        dispatcher.stop_bot().await.unwrap();
        let state = store.snapshot();
        assert!(state.opportunities.is_empty());
        assert!(!state.bot.active);
    }

    #[tokio::test]
    async fn test_command_failure_keeps_prior_state() {
        let api = FakeApi::new();
        let (dispatcher, store) = deployed(&api).await;
        api.fail("start_bot");
        let before = store.flush().await.unwrap();

        let err = dispatcher.start_bot().await.unwrap_err();
        assert!(matches!(err, CommandError::CommandFailed(_)));
        assert_eq!(store.flush().await.unwrap(), before);

        // Guard released: the user can retry
        api.recover("start_bot");
        assert_ok!(dispatcher.start_bot().await);
    }
}
