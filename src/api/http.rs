//! HTTP implementation of the bot engine API
//!
//! Plain JSON over reqwest against a fixed base path. Every failure
//! (connect, non-2xx, undecodable body) becomes a `TransportError`
//! tagged with the endpoint so callers can log it and keep stale data.
//!
//! Created: 2026-10-19

use super::BotApi;
use crate::error::{TransportError, TransportKind};
use crate::types::{
    ApiInfo, BotStatus, CommandAck, ContractStatus, DeployReceipt, Opportunity, TokenPrice, Trade,
};
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

/// Bot engine REST client
#[derive(Debug, Clone)]
pub struct HttpBotApi {
    client: Client,
    base_url: String,
}

impl HttpBotApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and decode the JSON body
    async fn request<T: DeserializeOwned>(&self, method: Method, path: &str) -> Result<T, TransportError> {
        let endpoint = format!("{} {}", method, path);
        let response = self
            .client
            .request(method, self.endpoint_url(path))
            .send()
            .await
            .map_err(|e| TransportError::new(&endpoint, TransportKind::Network(e.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::new(&endpoint, TransportKind::Status(status.as_u16())));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::new(&endpoint, TransportKind::Network(e.to_string())))?;

        serde_json::from_slice(&body)
            .map_err(|e| TransportError::new(&endpoint, TransportKind::Decode(e.to_string())))
    }

    /// POST a bot command. The acknowledgement body is informational only.
    async fn command(&self, path: &str) -> Result<(), TransportError> {
        let ack: CommandAck = match self.request(Method::POST, path).await {
            Ok(ack) => ack,
            // 2xx with an unexpected body still counts as accepted
            Err(TransportError { kind: TransportKind::Decode(e), .. }) => {
                debug!("POST {} accepted with undecodable ack: {}", path, e);
                CommandAck::default()
            }
            Err(e) => return Err(e),
        };
        info!("POST {} -> {} {}", path, ack.status, ack.message);
        Ok(())
    }
}

#[async_trait]
impl BotApi for HttpBotApi {
    async fn bot_status(&self) -> Result<BotStatus, TransportError> {
        self.request(Method::GET, "/bot/status").await
    }

    async fn contract_status(&self) -> Result<ContractStatus, TransportError> {
        self.request(Method::GET, "/contract/status").await
    }

    async fn opportunities(&self) -> Result<Vec<Opportunity>, TransportError> {
        self.request(Method::GET, "/opportunities").await
    }

    async fn deploy_contract(&self) -> Result<DeployReceipt, TransportError> {
        self.request(Method::POST, "/contract/deploy").await
    }

    async fn start_bot(&self) -> Result<(), TransportError> {
        self.command("/bot/start").await
    }

    async fn stop_bot(&self) -> Result<(), TransportError> {
        self.command("/bot/stop").await
    }

    async fn trades(&self) -> Result<Vec<Trade>, TransportError> {
        self.request(Method::GET, "/trades").await
    }

    async fn token_price(&self, token: &str) -> Result<TokenPrice, TransportError> {
        let path = format!("/prices/{}", token.trim().to_uppercase());
        self.request(Method::GET, &path).await
    }

    async fn health(&self) -> Result<ApiInfo, TransportError> {
        self.request(Method::GET, "/").await
    }
}
