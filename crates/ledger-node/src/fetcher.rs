use std::time::Duration;

use ledger_core::{ChainFetcher, ChainSnapshot, PeerError};
use reqwest::Client;

use crate::constants::CHAIN_PATH;

/// Queries `http://<peer>/get_chain` on other nodes.
#[derive(Clone, Debug)]
pub struct HttpChainFetcher {
    client: Client,
}

impl HttpChainFetcher {
    /// `timeout` bounds each request end to end, on top of the reconciler's
    /// own per-peer limit.
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl ChainFetcher for HttpChainFetcher {
    async fn fetch_chain(&self, peer: &str) -> Result<ChainSnapshot, PeerError> {
        let url = format!("http://{peer}{CHAIN_PATH}");
        let res = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PeerError::Unavailable {
                peer: peer.to_string(),
                reason: e.to_string(),
            })?;

        let status = res.status();
        if !status.is_success() {
            return Err(PeerError::Status {
                peer: peer.to_string(),
                status: status.as_u16(),
            });
        }

        res.json::<ChainSnapshot>()
            .await
            .map_err(|e| PeerError::MalformedPayload {
                peer: peer.to_string(),
                reason: e.to_string(),
            })
    }
}
