//! Ethereum (source chain) access
//!
//! The mint pipeline needs the current head, a stream of new heads, and the
//! bridge contract's `Mint` logs over a block range. The log query sits behind
//! [`SourceChain`] so the processor can be driven by canned logs in tests.

use alloy::primitives::{Bytes, B256};
use async_trait::async_trait;

use crate::error::BridgeResult;

pub mod client;
pub mod events;

pub use client::EthereumClient;
pub use events::{decode_mint_log, token_topic_position, MINT_TOKEN_INDEX, MINT_TOPIC};

/// A log as returned by `eth_getLogs`, reduced to the fields the relay reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLog {
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub block_number: u64,
    pub log_index: u64,
}

#[async_trait]
pub trait SourceChain: Send + Sync {
    /// Latest block number
    async fn block_number(&self) -> BridgeResult<u64>;

    /// `Mint` logs emitted by the bridge contract in `[from_block, to_block]`,
    /// ordered by block then log index
    async fn deposit_logs(&self, from_block: u64, to_block: u64) -> BridgeResult<Vec<RawLog>>;
}
