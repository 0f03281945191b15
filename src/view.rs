//! View Projector
//!
//! Pure derivation from a `ClientState` snapshot to what the console shows:
//! which actions are available, the status badges, the profit metrics and the
//! opportunity table. No I/O.
//!
//! Created: 2026-10-19

use crate::config::ConsoleConfig;
use crate::state::{ClientState, ContractPhase};
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;

/// Display settings that do not come from the backend
#[derive(Debug, Clone)]
pub struct ViewConfig {
    /// Fixed ETH->USD factor
    pub usd_rate: Decimal,
    pub explorer_url: String,
    pub network_name: String,
}

impl From<&ConsoleConfig> for ViewConfig {
    fn from(config: &ConsoleConfig) -> Self {
        Self {
            usd_rate: config.usd_rate,
            explorer_url: config.explorer_url.trim_end_matches('/').to_string(),
            network_name: config.network_name.clone(),
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self::from(&ConsoleConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Control {
    pub visible: bool,
    pub enabled: bool,
}

impl Control {
    fn shown(enabled: bool) -> Self {
        Self { visible: true, enabled }
    }

    fn hidden() -> Self {
        Self { visible: false, enabled: false }
    }

    /// Visible and enabled
    pub fn is_available(&self) -> bool {
        self.visible && self.enabled
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Badge {
    pub label: &'static str,
    pub ok: bool,
}

impl Badge {
    fn new(ok: bool, yes: &'static str, no: &'static str) -> Self {
        Self {
            label: if ok { yes } else { no },
            ok,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metrics {
    /// ETH, 6 decimals
    pub total_profit_eth: String,
    /// USD at the configured rate, 2 decimals
    pub total_profit_usd: String,
    pub successful_trades: u64,
    pub failed_trades: u64,
    pub active_opportunities: u64,
    pub scanning: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractPanel {
    pub address: String,
    pub tx_hash: String,
    pub network: String,
    pub explorer_link: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpportunityRow {
    pub token_pair: String,
    pub route: String,
    pub profit_eth: String,
    pub profit_usd: String,
}

/// Everything the dashboard renders for one snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewModel {
    pub connect_wallet: Control,
    pub deploy_contract: Control,
    pub deploy_label: &'static str,
    pub start_bot: Control,
    pub stop_bot: Control,
    pub wallet_badge: Badge,
    pub contract_badge: Badge,
    pub bot_badge: Badge,
    pub metrics: Metrics,
    pub contract_panel: Option<ContractPanel>,
    pub deploy_warning: Option<&'static str>,
    pub opportunities: Vec<OpportunityRow>,
    pub empty_message: Option<&'static str>,
    pub empty_hint: Option<&'static str>,
    pub revision: u64,
}

pub const DEPLOY_WARNING: &str = "Deploy contract first to enable bot";
const EMPTY_MESSAGE: &str = "No opportunities found.";
const EMPTY_HINT: &str = "Deploy contract and start the bot to begin scanning.";
/// Shown when the USD product does not fit in a `Decimal`
pub const OVERFLOW: &str = "overflow";

/// Project a snapshot into a view model
pub fn project(state: &ClientState, config: &ViewConfig) -> ViewModel {
    let connected = state.wallet_connected;
    let deployed = state.contract.is_deployed();
    let deploying = state.contract.is_deploying();
    let active = state.bot.active;

    let contract_panel = match &state.contract {
        ContractPhase::Deployed { address, tx_hash } => Some(ContractPanel {
            address: address.clone(),
            tx_hash: tx_hash.clone(),
            network: config.network_name.clone(),
            explorer_link: format!("{}/tx/{}", config.explorer_url, tx_hash),
        }),
        _ => None,
    };

    let opportunities: Vec<OpportunityRow> = state
        .opportunities
        .iter()
        .map(|o| OpportunityRow {
            token_pair: o.token_pair.clone(),
            route: format!("{} -> {}", o.dex_from, o.dex_to),
            profit_eth: format!("+{} ETH", fixed(o.profit_eth, 6)),
            profit_usd: format!("${}", fixed(o.profit_usd, 2)),
        })
        .collect();

    let (empty_message, empty_hint) = if opportunities.is_empty() {
        (Some(EMPTY_MESSAGE), (!active).then_some(EMPTY_HINT))
    } else {
        (None, None)
    };

    ViewModel {
        connect_wallet: if connected { Control::hidden() } else { Control::shown(true) },
        deploy_contract: if connected && !deployed {
            Control::shown(!deploying)
        } else {
            Control::hidden()
        },
        deploy_label: if deploying { "Deploying..." } else { "Deploy Contract" },
        start_bot: Control::shown(!active && deployed),
        stop_bot: Control::shown(active),
        wallet_badge: Badge::new(connected, "Connected", "Not Connected"),
        contract_badge: Badge::new(deployed, "Contract Deployed", "Contract Not Deployed"),
        bot_badge: Badge::new(active, "Bot Active", "Bot Inactive"),
        metrics: Metrics {
            total_profit_eth: fixed(state.bot.total_profits, 6),
            total_profit_usd: match state.bot.total_profits.checked_mul(config.usd_rate) {
                Some(usd) => fixed(usd, 2),
                None => OVERFLOW.to_string(),
            },
            successful_trades: state.bot.successful_trades,
            failed_trades: state.bot.failed_trades,
            active_opportunities: state.bot.active_opportunities,
            scanning: if active { "Real-time scanning" } else { "Bot inactive" },
        },
        contract_panel,
        deploy_warning: (!deployed).then_some(DEPLOY_WARNING),
        opportunities,
        empty_message,
        empty_hint,
        revision: state.revision,
    }
}

/// Round half away from zero and pad to exactly `dp` places.
/// Pads the plain `Display` output; precision formatting overflows on 28-digit values.
fn fixed(value: Decimal, dp: u32) -> String {
    let rounded = value
        .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
        .to_string();
    let (int, frac) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));
    if dp == 0 {
        return int.to_string();
    }
    format!("{}.{:0<width$}", int, frac, width = dp as usize)
}

fn mark(control: &Control) -> &'static str {
    if control.enabled {
        "available"
    } else {
        "disabled"
    }
}

impl fmt::Display for ViewModel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "=== FlashLoan Arbitrage Console (rev {}) ===", self.revision)?;
        writeln!(
            f,
            "[{}] [{}] [{}]",
            self.wallet_badge.label, self.contract_badge.label, self.bot_badge.label
        )?;
        writeln!(f)?;
        writeln!(
            f,
            "Total Profit:         {} ETH (${})",
            self.metrics.total_profit_eth, self.metrics.total_profit_usd
        )?;
        writeln!(f, "Successful Trades:    {}", self.metrics.successful_trades)?;
        writeln!(f, "Failed Trades:        {}", self.metrics.failed_trades)?;
        writeln!(
            f,
            "Active Opportunities: {} ({})",
            self.metrics.active_opportunities, self.metrics.scanning
        )?;
        writeln!(f)?;

        if let Some(panel) = &self.contract_panel {
            writeln!(f, "Contract: {} on {}", panel.address, panel.network)?;
            writeln!(f, "Deploy tx: {}", panel.explorer_link)?;
        }
        if let Some(warning) = self.deploy_warning {
            writeln!(f, "! {}", warning)?;
        }

        writeln!(f, "Arbitrage Opportunities ({})", self.opportunities.len())?;
        for row in &self.opportunities {
            writeln!(
                f,
                "  {:<12} {:<28} {:>16} {:>10}",
                row.token_pair, row.route, row.profit_eth, row.profit_usd
            )?;
        }
        if let Some(message) = self.empty_message {
            writeln!(f, "  {}", message)?;
        }
        if let Some(hint) = self.empty_hint {
            writeln!(f, "  {}", hint)?;
        }
        writeln!(f)?;

        let mut actions = Vec::new();
        if self.connect_wallet.visible {
            actions.push(format!("connect ({})", mark(&self.connect_wallet)));
        }
        if self.deploy_contract.visible {
            actions.push(format!("deploy: {} ({})", self.deploy_label, mark(&self.deploy_contract)));
        }
        actions.push(format!("start ({})", mark(&self.start_bot)));
        actions.push(format!("stop ({})", mark(&self.stop_bot)));
        write!(f, "Actions: {}", actions.join(" | "))
    }
}
