//! FlashLoan Arbitrage Console Library
//!
//! Client-side state reconciliation for monitoring and controlling an
//! external arbitrage bot engine and its flash-loan contract: status polling,
//! wallet connection, deploy/start/stop commands and a derived view model,
//! all funnelled through one state-owning actor.
//!
//! Created: 2026-10-19

pub mod api;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod reconcile;
pub mod session;
pub mod state;
pub mod types;
pub mod view;
pub mod wallet;

// Re-export commonly used types
pub use api::{BotApi, HttpBotApi};
pub use config::{load_config, ConsoleConfig};
pub use error::{CommandError, Precondition, TransportError, WalletError};
pub use session::Session;
pub use state::{ClientState, ContractPhase, SessionPhase};
pub use types::{BotStatus, ContractStatus, DeployReceipt, Opportunity};
pub use view::{project, ViewConfig, ViewModel};
pub use wallet::{RpcWallet, WalletProvider};
