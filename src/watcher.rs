//! Confirmation-aware chain watcher
//!
//! Owns the watermark: the next Ethereum block the mint pipeline has not yet
//! scanned. Every block below it has been processed exactly once. Heads are
//! consumed one at a time from a channel, so ranges never overlap or skip.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::error::{BridgeError, BridgeResult};
use crate::metrics;
use crate::processor::MintProcessor;

/// Read-only view of the watcher's watermark for other tasks
#[derive(Debug, Clone, Default)]
pub struct WatermarkHandle(Arc<AtomicU64>);

impl WatermarkHandle {
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    fn set(&self, block: u64) {
        self.0.store(block, Ordering::Release);
    }
}

pub struct ChainWatcher {
    processor: MintProcessor,
    confirmations: u64,
    watermark: u64,
    handle: WatermarkHandle,
}

impl ChainWatcher {
    /// Start watching from `current_head - confirmations`
    pub fn new(processor: MintProcessor, confirmations: u64, current_head: u64) -> Self {
        let watermark = current_head.saturating_sub(confirmations);
        let handle = WatermarkHandle::default();
        handle.set(watermark);
        metrics::set_watermark(watermark);

        Self {
            processor,
            confirmations,
            watermark,
            handle,
        }
    }

    pub fn watermark(&self) -> u64 {
        self.watermark
    }

    pub fn watermark_handle(&self) -> WatermarkHandle {
        self.handle.clone()
    }

    /// Inclusive block range that becomes confirmed at `head`, if any
    pub fn confirmed_range(&self, head: u64) -> Option<(u64, u64)> {
        let confirmed = head.checked_sub(self.confirmations)?;
        if confirmed < self.watermark {
            return None;
        }
        Some((self.watermark, confirmed))
    }

    /// Scan the newly confirmed range and advance the watermark past it
    ///
    /// On error the watermark is left where it was.
    pub async fn handle_head(&mut self, head: u64) -> BridgeResult<()> {
        let Some((from_block, to_block)) = self.confirmed_range(head) else {
            debug!(head, watermark = self.watermark, "No newly confirmed blocks");
            return Ok(());
        };

        let minted = self.processor.process_range(from_block, to_block).await?;

        self.watermark = to_block + 1;
        self.handle.set(self.watermark);
        metrics::record_blocks_processed(to_block - from_block + 1, self.watermark);

        info!(head, from_block, to_block, minted, "Processed Ethereum blocks");
        Ok(())
    }

    /// Consume heads until the channel fails
    ///
    /// Only returns on error: a head subscription failure, the channel
    /// closing, or a failed range.
    pub async fn run(&mut self, mut heads: mpsc::Receiver<BridgeResult<u64>>) -> BridgeResult<()> {
        info!(
            watermark = self.watermark,
            confirmations = self.confirmations,
            "Chain watcher started"
        );

        loop {
            let head = match heads.recv().await {
                Some(Ok(head)) => head,
                Some(Err(e)) => {
                    error!(error = %e, "Head subscription failed");
                    return Err(e);
                }
                None => {
                    return Err(BridgeError::ChainRpcFailure(
                        "head channel closed".to_string(),
                    ))
                }
            };

            if let Err(e) = self.handle_head(head).await {
                error!(
                    head,
                    watermark = self.watermark,
                    error = %e,
                    "Failed to process confirmed blocks"
                );
                return Err(e);
            }
        }
    }
}
