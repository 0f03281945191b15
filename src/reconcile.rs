//! Reconciliation Loop
//!
//! Startup sync pulls bot status and contract status once. After that a
//! fixed-cadence timer re-pulls bot status and opportunities; the contract
//! status is never polled, only changed by deploy.
//!
//! Each tick spawns its two fetches as independent tasks. A failing fetch
//! keeps the previous snapshot (stale-but-valid) and never blocks the other
//! fetch or the timer. Cross-tick ordering is last-write-by-arrival.
//!
//! Created: 2026-10-19

use crate::api::BotApi;
use crate::state::{ContractPhase, StateHandle};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Fetch bot status and replace the snapshot. On error the old one stays.
pub async fn refresh_bot_status(api: &dyn BotApi, store: &StateHandle) -> bool {
    match api.bot_status().await {
        Ok(status) => {
            debug!(
                "Bot status: active={} opportunities={}",
                status.active, status.active_opportunities
            );
            store.set_bot_status(status)
        }
        Err(e) => {
            warn!("Bot status refresh failed, keeping last snapshot: {}", e);
            false
        }
    }
}

/// Fetch the opportunity list and replace it wholesale
pub async fn refresh_opportunities(api: &dyn BotApi, store: &StateHandle) -> bool {
    match api.opportunities().await {
        Ok(opportunities) => {
            debug!("Opportunities: {}", opportunities.len());
            store.set_opportunities(opportunities)
        }
        Err(e) => {
            warn!("Opportunities refresh failed, keeping last snapshot: {}", e);
            false
        }
    }
}

/// Fetch contract status. Malformed payloads count as transport errors.
pub async fn refresh_contract_status(api: &dyn BotApi, store: &StateHandle) -> bool {
    let phase = match api.contract_status().await.and_then(ContractPhase::try_from) {
        Ok(phase) => phase,
        Err(e) => {
            warn!("Contract status refresh failed, keeping last phase: {}", e);
            return false;
        }
    };
    debug!("Contract status: {}", phase);
    store.observe_contract(phase)
}

/// One-shot sync on session start (bot status + contract status)
pub async fn initial_sync(api: &dyn BotApi, store: &StateHandle) {
    let (bot, contract) = futures::join!(
        refresh_bot_status(api, store),
        refresh_contract_status(api, store)
    );
    info!(
        "Initial sync done (bot status: {}, contract status: {})",
        if bot { "ok" } else { "stale" },
        if contract { "ok" } else { "stale" }
    );
}

/// Periodic bot status + opportunities poller
pub struct ReconciliationLoop {
    api: Arc<dyn BotApi>,
    store: StateHandle,
    period: Duration,
}

impl ReconciliationLoop {
    pub fn new(api: Arc<dyn BotApi>, store: StateHandle, period: Duration) -> Self {
        Self { api, store, period }
    }

    /// Start ticking one period from now
    pub fn spawn(self) -> LoopHandle {
        info!("Reconciliation loop started ({:?} cadence)", self.period);
        let task = tokio::spawn(self.run());
        LoopHandle { task: Some(task) }
    }

    async fn run(self) {
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut tick: u64 = 0;

        loop {
            ticker.tick().await;
            if self.store.is_closed() {
                debug!("State store closed, reconciliation loop exiting");
                break;
            }
            tick += 1;
            debug!("Reconciliation tick #{}", tick);

            // In-flight fetches are detached; their late results are dropped by the store
            let (api, store) = (Arc::clone(&self.api), self.store.clone());
            tokio::spawn(async move {
                refresh_bot_status(api.as_ref(), &store).await;
            });
            let (api, store) = (Arc::clone(&self.api), self.store.clone());
            tokio::spawn(async move {
                refresh_opportunities(api.as_ref(), &store).await;
            });
        }
    }
}

/// Owner of the loop timer. Dropping it also stops the loop.
pub struct LoopHandle {
    task: Option<JoinHandle<()>>,
}

impl LoopHandle {
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Cancel the timer. Consumes the handle, so it happens once.
    pub fn shutdown(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            info!("Reconciliation loop stopped");
        }
    }
}

impl Drop for LoopHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
