//! alloy-backed source chain client
//!
//! Connects over WebSocket when the URL is `ws://`/`wss://` and streams heads
//! from `eth_subscribe("newHeads")`. Over HTTP the subscription is not
//! available and heads are polled with `eth_blockNumber` instead.

use std::time::Duration;

use alloy::primitives::{Address, B256};
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::rpc::types::{Filter, Log};
use alloy::transports::BoxTransport;
use async_trait::async_trait;
use eyre::{Result, WrapErr};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{RawLog, SourceChain};
use crate::error::{BridgeError, BridgeResult};

/// Head polling interval when the transport has no subscriptions
const POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct EthereumClient {
    provider: RootProvider<BoxTransport>,
    bridge_address: Address,
    mint_topic: B256,
}

impl EthereumClient {
    pub async fn connect(rpc_url: &str, bridge_address: Address, mint_topic: B256) -> Result<Self> {
        let provider = ProviderBuilder::new()
            .on_builtin(rpc_url)
            .await
            .wrap_err("Failed to connect to Ethereum RPC")?;

        Ok(Self {
            provider,
            bridge_address,
            mint_topic,
        })
    }

    /// Forward new head numbers into `sender` until the subscription ends
    ///
    /// Any failure is sent down the channel as the final item; the receiver
    /// treats it as fatal.
    pub fn spawn_head_pump(&self, sender: mpsc::Sender<BridgeResult<u64>>) -> JoinHandle<()> {
        let client = self.clone();
        tokio::spawn(async move {
            let failure = match client.provider.subscribe_blocks().await {
                Ok(subscription) => {
                    info!("Subscribed to new Ethereum heads");
                    let heads = subscription.into_stream().map(|header| header.number);
                    client.stream_heads(heads, &sender).await
                }
                Err(e) => {
                    warn!(error = %e, "Head subscription unavailable, polling eth_blockNumber");
                    client.poll_heads(&sender).await
                }
            };

            if let Some(err) = failure {
                let _ = sender.send(Err(err)).await;
            }
        })
    }

    async fn stream_heads<S>(
        &self,
        heads: S,
        sender: &mpsc::Sender<BridgeResult<u64>>,
    ) -> Option<BridgeError>
    where
        S: futures::Stream<Item = u64>,
    {
        tokio::pin!(heads);
        while let Some(number) = heads.next().await {
            debug!(block = number, "New Ethereum head");
            if sender.send(Ok(number)).await.is_err() {
                // Watcher is gone; nothing left to feed
                return None;
            }
        }
        Some(BridgeError::ChainRpcFailure(
            "Ethereum head subscription closed".to_string(),
        ))
    }

    async fn poll_heads(&self, sender: &mpsc::Sender<BridgeResult<u64>>) -> Option<BridgeError> {
        let mut interval = tokio::time::interval(POLL_INTERVAL);
        let mut last_seen = 0u64;

        loop {
            interval.tick().await;
            let number = match self.block_number().await {
                Ok(number) => number,
                Err(e) => return Some(e),
            };
            if number <= last_seen {
                continue;
            }
            last_seen = number;
            if sender.send(Ok(number)).await.is_err() {
                return None;
            }
        }
    }
}

fn to_raw_log(log: &Log) -> BridgeResult<RawLog> {
    let block_number = log.block_number.ok_or_else(|| {
        BridgeError::ChainRpcFailure("log is missing its block number".to_string())
    })?;
    let log_index = log
        .log_index
        .ok_or_else(|| BridgeError::ChainRpcFailure("log is missing its log index".to_string()))?;

    Ok(RawLog {
        topics: log.topics().to_vec(),
        data: log.data().data.clone(),
        block_number,
        log_index,
    })
}

/// Convert logs and put them in chain order, `(block_number, log_index)`
fn ordered_raw_logs(logs: &[Log]) -> BridgeResult<Vec<RawLog>> {
    let mut raw = logs.iter().map(to_raw_log).collect::<BridgeResult<Vec<_>>>()?;
    raw.sort_by_key(|log| (log.block_number, log.log_index));
    Ok(raw)
}

#[async_trait]
impl SourceChain for EthereumClient {
    async fn block_number(&self) -> BridgeResult<u64> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| BridgeError::ChainRpcFailure(format!("eth_blockNumber failed: {}", e)))
    }

    async fn deposit_logs(&self, from_block: u64, to_block: u64) -> BridgeResult<Vec<RawLog>> {
        let filter = Filter::new()
            .address(self.bridge_address)
            .event_signature(self.mint_topic)
            .from_block(from_block)
            .to_block(to_block);

        let logs = self
            .provider
            .get_logs(&filter)
            .await
            .map_err(|e| BridgeError::ChainRpcFailure(format!("eth_getLogs failed: {}", e)))?;

        ordered_raw_logs(&logs)
    }
}
