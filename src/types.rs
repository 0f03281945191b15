//! Wire and snapshot types for the bot backend
//!
//! Everything here is produced by the backend and consumed as-is:
//! profits and opportunity figures are already computed server-side.
//!
//! Created: 2026-10-19

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Bot engine status snapshot (`GET /bot/status`).
///
/// Always replaced as a whole on a successful fetch, never merged field by field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BotStatus {
    pub active: bool,
    pub total_profits: Decimal,
    pub successful_trades: u64,
    pub failed_trades: u64,
    pub active_opportunities: u64,
}

/// Contract status as reported by `GET /contract/status`.
///
/// The backend has no notion of `deploying`; that flag is local to the console.
/// Convert into [`crate::state::ContractPhase`] before use.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContractStatus {
    pub deployed: bool,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, rename = "txHash")]
    pub tx_hash: Option<String>,
}

/// Response of `POST /contract/deploy`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployReceipt {
    pub address: String,
    #[serde(rename = "txHash")]
    pub tx_hash: String,
}

/// A single arbitrage candidate between two DEXes.
///
/// Lists of these are atomic snapshots: an id present in one poll and absent
/// in the next is simply gone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: String,
    pub token_pair: String,
    pub dex_from: String,
    pub dex_to: String,
    pub profit_eth: Decimal,
    pub profit_usd: Decimal,
    /// When the engine reported it, UTC without offset (display only)
    #[serde(default)]
    pub timestamp: Option<NaiveDateTime>,
}

/// Acknowledgement body of `POST /bot/start` and `POST /bot/stop`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandAck {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// Executed trade record (`GET /trades`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub token_pair: String,
    pub profit_eth: Decimal,
    pub profit_usd: Decimal,
    pub gas_cost: Decimal,
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<NaiveDateTime>,
}

/// Indicative token price (`GET /prices/{token}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPrice {
    pub token: String,
    pub price: Decimal,
    pub change_24h: Decimal,
}

/// Greeting returned by `GET /`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiInfo {
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_bot_status_from_backend_json() {
        let json = r#"{
            "active": true,
            "total_profits": 0.042,
            "successful_trades": 7,
            "failed_trades": 2,
            "active_opportunities": 5
        }"#;

        let status: BotStatus = serde_json::from_str(json).unwrap();
        assert!(status.active);
        assert_eq!(status.total_profits, dec!(0.042));
        assert_eq!(status.successful_trades, 7);
        assert_eq!(status.active_opportunities, 5);
    }

    #[test]
    fn test_contract_status_camel_case_tx_hash() {
        let json = r#"{"deployed": true, "address": "0xABC", "txHash": "0x123"}"#;
        let status: ContractStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.tx_hash.as_deref(), Some("0x123"));

        // Undeployed contracts may omit both fields
        let status: ContractStatus = serde_json::from_str(r#"{"deployed": false}"#).unwrap();
        assert_eq!(status, ContractStatus::default());
    }

    #[test]
    fn test_opportunity_with_backend_timestamp() {
        let json = r#"{
            "id": "6f1c",
            "token_pair": "WETH/USDC",
            "profit_eth": 0.012345,
            "profit_usd": 30.86,
            "dex_from": "Uniswap V3",
            "dex_to": "SushiSwap",
            "timestamp": "2026-10-19T12:00:00.482113"
        }"#;

        let opp: Opportunity = serde_json::from_str(json).unwrap();
        assert_eq!(opp.profit_eth, dec!(0.012345));
        assert_eq!(opp.dex_to, "SushiSwap");
        assert!(opp.timestamp.is_some());
    }
}
