//! Bot Engine REST API
//!
//! `BotApi` is the boundary to the external bot engine. Reads feed the
//! reconciliation loop; writes are issued by the command dispatcher.
//! No retries and no request timeouts live here: the loop cadence is the
//! retry mechanism, and a hung request is only superseded by the next tick.
//!
//! Created: 2026-10-19

pub mod http;

pub use http::HttpBotApi;

use crate::error::TransportError;
use crate::types::{ApiInfo, BotStatus, ContractStatus, DeployReceipt, Opportunity, TokenPrice, Trade};
use async_trait::async_trait;

#[async_trait]
pub trait BotApi: Send + Sync {
    /// `GET /bot/status`
    async fn bot_status(&self) -> Result<BotStatus, TransportError>;

    /// `GET /contract/status`
    async fn contract_status(&self) -> Result<ContractStatus, TransportError>;

    /// `GET /opportunities`
    async fn opportunities(&self) -> Result<Vec<Opportunity>, TransportError>;

    /// `POST /contract/deploy`
    async fn deploy_contract(&self) -> Result<DeployReceipt, TransportError>;

    /// `POST /bot/start`
    async fn start_bot(&self) -> Result<(), TransportError>;

    /// `POST /bot/stop`
    async fn stop_bot(&self) -> Result<(), TransportError>;

    /// `GET /trades`
    async fn trades(&self) -> Result<Vec<Trade>, TransportError>;

    /// `GET /prices/{token}`
    async fn token_price(&self, token: &str) -> Result<TokenPrice, TransportError>;

    /// `GET /`
    async fn health(&self) -> Result<ApiInfo, TransportError>;
}
