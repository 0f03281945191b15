//! State Store - single owner of `ClientState`
//!
//! All writers (reconciliation ticks, wallet connector, command dispatcher)
//! send messages to one actor task, which applies them in arrival order and
//! publishes a fresh immutable snapshot after each one. Readers only ever see
//! whole snapshots, so a cross-field combination like "deploying and deployed"
//! can never be observed.
//!
//! Race policy with the poll loop: last write by arrival wins. Bot status and
//! opportunities are replaced wholesale; contract observations go through the
//! transition table and cannot interrupt an in-flight deploy.
//!
//! Created: 2026-10-19

use super::{ClientState, ContractEvent, ContractPhase};
use crate::error::{CommandError, Precondition};
use crate::types::{BotStatus, DeployReceipt, Opportunity};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Messages accepted by the store actor
#[derive(Debug)]
pub enum StoreMsg {
    BotStatus(BotStatus),
    Opportunities(Vec<Opportunity>),
    ContractObserved(ContractPhase),
    WalletConnected,
    /// Atomically check preconditions and enter `Deploying`
    BeginDeploy {
        reply: oneshot::Sender<Result<(), CommandError>>,
    },
    DeployConfirmed(DeployReceipt),
    DeployFailed,
    ClearOpportunities,
    /// Barrier: answered with the snapshot once earlier messages are applied
    Flush {
        reply: oneshot::Sender<Arc<ClientState>>,
    },
    Shutdown,
}

/// Actor owning the session state
pub struct StateStore {
    state: ClientState,
    rx: mpsc::UnboundedReceiver<StoreMsg>,
    snapshot_tx: watch::Sender<Arc<ClientState>>,
}

impl StateStore {
    /// Spawn the actor with `initial` state
    pub fn spawn(initial: ClientState) -> (StateHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(initial.clone()));

        let store = Self {
            state: initial,
            rx,
            snapshot_tx,
        };
        let task = tokio::spawn(store.run());

        (StateHandle { tx, snapshot_rx }, task)
    }

    async fn run(mut self) {
        debug!("State store started");
        while let Some(msg) = self.rx.recv().await {
            if matches!(msg, StoreMsg::Shutdown) {
                break;
            }
            if self.apply(msg) {
                self.state.revision += 1;
                self.snapshot_tx.send_replace(Arc::new(self.state.clone()));
            }
        }
        info!("State store stopped at revision {}", self.state.revision);
    }

    /// Apply one message. Returns true if the state changed.
    fn apply(&mut self, msg: StoreMsg) -> bool {
        match msg {
            StoreMsg::BotStatus(status) => {
                if self.state.bot == status {
                    return false;
                }
                self.state.bot = status;
                true
            }
            StoreMsg::Opportunities(opportunities) => {
                if self.state.opportunities == opportunities {
                    return false;
                }
                self.state.opportunities = opportunities;
                true
            }
            StoreMsg::ContractObserved(observed) => {
                self.transition(ContractEvent::Observed(observed))
            }
            StoreMsg::WalletConnected => {
                if self.state.wallet_connected {
                    return false;
                }
                self.state.wallet_connected = true;
                true
            }
            StoreMsg::BeginDeploy { reply } => {
                let result = self.begin_deploy();
                let changed = result.is_ok();
                if reply.send(result).is_err() {
                    // Caller vanished before the answer; undo so deploy stays retriable
                    if changed {
                        self.state.contract = ContractPhase::NotDeployed;
                    }
                    return false;
                }
                changed
            }
            StoreMsg::DeployConfirmed(receipt) => {
                self.transition(ContractEvent::DeployConfirmed(receipt))
            }
            StoreMsg::DeployFailed => self.transition(ContractEvent::DeployFailed),
            StoreMsg::ClearOpportunities => {
                if self.state.opportunities.is_empty() {
                    return false;
                }
                self.state.opportunities.clear();
                true
            }
            StoreMsg::Flush { reply } => {
                let _ = reply.send(self.snapshot_tx.borrow().clone());
                false
            }
            StoreMsg::Shutdown => false,
        }
    }

    fn begin_deploy(&mut self) -> Result<(), CommandError> {
        if !self.state.wallet_connected {
            return Err(CommandError::WalletRequired);
        }
        match self.state.contract {
            ContractPhase::Deploying => return Err(CommandError::AlreadyInProgress("deploy")),
            ContractPhase::Deployed { .. } => {
                return Err(CommandError::PreconditionFailed(vec![
                    Precondition::ContractAlreadyDeployed,
                ]))
            }
            ContractPhase::NotDeployed => {}
        }
        self.transition(ContractEvent::BeginDeploy);
        Ok(())
    }

    fn transition(&mut self, event: ContractEvent) -> bool {
        match self.state.contract.apply(event) {
            Ok(next) if next != self.state.contract => {
                debug!("Contract phase: {} -> {}", self.state.contract, next);
                self.state.contract = next;
                true
            }
            Ok(_) => false,
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    }
}

/// Cloneable handle for writing to and reading from the store
#[derive(Clone)]
pub struct StateHandle {
    tx: mpsc::UnboundedSender<StoreMsg>,
    snapshot_rx: watch::Receiver<Arc<ClientState>>,
}

impl StateHandle {
    /// Latest published snapshot
    pub fn snapshot(&self) -> Arc<ClientState> {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver notified on every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<Arc<ClientState>> {
        self.snapshot_rx.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Fire-and-forget write. Late results after shutdown are dropped.
    pub fn send(&self, msg: StoreMsg) -> bool {
        match self.tx.send(msg) {
            Ok(()) => true,
            Err(e) => {
                debug!("State store closed, dropping {:?}", e.0);
                false
            }
        }
    }

    pub fn set_bot_status(&self, status: BotStatus) -> bool {
        self.send(StoreMsg::BotStatus(status))
    }

    pub fn set_opportunities(&self, opportunities: Vec<Opportunity>) -> bool {
        self.send(StoreMsg::Opportunities(opportunities))
    }

    pub fn observe_contract(&self, phase: ContractPhase) -> bool {
        self.send(StoreMsg::ContractObserved(phase))
    }

    pub fn set_wallet_connected(&self) -> bool {
        self.send(StoreMsg::WalletConnected)
    }

    pub fn clear_opportunities(&self) -> bool {
        self.send(StoreMsg::ClearOpportunities)
    }

    pub fn confirm_deploy(&self, receipt: DeployReceipt) -> bool {
        self.send(StoreMsg::DeployConfirmed(receipt))
    }

    pub fn fail_deploy(&self) -> bool {
        self.send(StoreMsg::DeployFailed)
    }

    /// Ask the actor to enter `Deploying`, or explain why not
    pub async fn begin_deploy(&self) -> Result<(), CommandError> {
        let (reply, answer) = oneshot::channel();
        if !self.send(StoreMsg::BeginDeploy { reply }) {
            return Err(CommandError::StoreClosed);
        }
        answer.await.map_err(|_| CommandError::StoreClosed)?
    }

    /// Wait until every message sent so far has been applied
    pub async fn flush(&self) -> Result<Arc<ClientState>, CommandError> {
        let (reply, answer) = oneshot::channel();
        if !self.send(StoreMsg::Flush { reply }) {
            return Err(CommandError::StoreClosed);
        }
        answer.await.map_err(|_| CommandError::StoreClosed)
    }

    /// Stop the actor once earlier messages are applied; later writes are discarded
    pub fn shutdown(&self) {
        let _ = self.tx.send(StoreMsg::Shutdown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SessionPhase;
    use rust_decimal_macros::dec;

    fn opportunity(id: &str) -> Opportunity {
        Opportunity {
            id: id.to_string(),
            token_pair: "WETH/USDC".to_string(),
            dex_from: "Uniswap V3".to_string(),
            dex_to: "SushiSwap".to_string(),
            profit_eth: dec!(0.01),
            profit_usd: dec!(25.00),
            timestamp: None,
        }
    }

    #[tokio::test]
    async fn test_writes_apply_in_arrival_order() {
        let (store, _task) = StateStore::spawn(ClientState::new());

        store.set_opportunities(vec![opportunity("a"), opportunity("b")]);
        store.set_opportunities(vec![opportunity("c")]);
        let state = store.flush().await.unwrap();

        // Whole-snapshot replacement: "a" and "b" are simply gone
        let ids: Vec<_> = state.opportunities.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["c"]);
        assert_eq!(state.revision, 2);
    }

    #[tokio::test]
    async fn test_unchanged_write_does_not_publish() {
        let (store, _task) = StateStore::spawn(ClientState::new());
        store.set_bot_status(BotStatus::default());
        let state = store.flush().await.unwrap();
        assert_eq!(state.revision, 0);
    }

    #[tokio::test]
    async fn test_begin_deploy_requires_wallet() {
        let (store, _task) = StateStore::spawn(ClientState::new());
        assert_eq!(store.begin_deploy().await, Err(CommandError::WalletRequired));
        assert_eq!(store.snapshot().contract, ContractPhase::NotDeployed);
    }

    #[tokio::test]
    async fn test_second_begin_deploy_is_already_in_progress() {
        let (store, _task) = StateStore::spawn(ClientState::new());
        store.set_wallet_connected();

        let (first, second) = tokio::join!(store.begin_deploy(), store.begin_deploy());
        assert_eq!(first, Ok(()));
        assert_eq!(second, Err(CommandError::AlreadyInProgress("deploy")));
        assert_eq!(store.flush().await.unwrap().phase(), SessionPhase::Deploying);
    }

    #[tokio::test]
    async fn test_deploy_confirm_is_single_atomic_write() {
        let (store, _task) = StateStore::spawn(ClientState::new());
        let mut rx = store.subscribe();
        store.set_wallet_connected();
        store.begin_deploy().await.unwrap();
        store.confirm_deploy(DeployReceipt {
            address: "0xABC".to_string(),
            tx_hash: "0x123".to_string(),
        });
        store.flush().await.unwrap();

        // Every snapshot published along the way satisfies the invariant
        let state = rx.borrow_and_update().clone();
        assert!(state.contract.is_deployed());
        assert_eq!(state.contract.address(), Some("0xABC"));
        assert!(!state.contract.is_deploying());
    }

    #[tokio::test]
    async fn test_contract_observation_ignored_mid_deploy() {
        let (store, _task) = StateStore::spawn(ClientState::new());
        store.set_wallet_connected();
        store.begin_deploy().await.unwrap();

        store.observe_contract(ContractPhase::NotDeployed);
        let state = store.flush().await.unwrap();
        assert!(state.contract.is_deploying());
    }

    #[tokio::test]
    async fn test_late_writes_after_shutdown_are_dropped() {
        let (store, task) = StateStore::spawn(ClientState::new());
        store.set_bot_status(BotStatus {
            active: true,
            ..BotStatus::default()
        });
        store.shutdown();
        task.await.unwrap();

        assert!(!store.set_bot_status(BotStatus::default()));
        assert!(store.is_closed());
        assert_eq!(store.flush().await, Err(CommandError::StoreClosed));
        // Last published snapshot stays readable
        assert!(store.snapshot().bot.active);
    }
}
