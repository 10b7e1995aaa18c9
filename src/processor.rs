//! Mint processor
//!
//! Turns `Mint` deposits from a confirmed Ethereum block range into
//! `Bridge.mint` transactions on Ellipticoin.

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use tracing::{debug, info};

use crate::decimals::{scale_down, TokenRegistry};
use crate::ellipticoin::{
    Argument, DestinationChain, TransactionRequest, BRIDGE_CONTRACT, MINT_FUNCTION,
};
use crate::error::BridgeResult;
use crate::ethereum::{decode_mint_log, SourceChain};
use crate::metrics;

/// A decoded `Mint` log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositEvent {
    pub token: Address,
    /// Ellipticoin account (ed25519 public key)
    pub destination: [u8; 32],
    /// Amount in the token's own precision
    pub amount: U256,
    pub block_number: u64,
    pub log_index: u64,
}

/// A deposit rescaled to Ellipticoin's 6 decimals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintRequest {
    pub token: Address,
    pub destination: [u8; 32],
    pub amount: u64,
}

impl MintRequest {
    /// `Bridge.mint(token, destination, amount)` sent from `sender`
    pub fn to_transaction(&self, sender: [u8; 32]) -> TransactionRequest {
        TransactionRequest {
            contract: BRIDGE_CONTRACT.to_string(),
            sender,
            function: MINT_FUNCTION.to_string(),
            arguments: vec![
                Argument::Bytes(self.token.to_vec()),
                Argument::Bytes(self.destination.to_vec()),
                Argument::Unsigned(self.amount),
            ],
        }
    }
}

pub struct MintProcessor {
    source: Arc<dyn SourceChain>,
    destination: Arc<dyn DestinationChain>,
    registry: Arc<TokenRegistry>,
}

impl MintProcessor {
    pub fn new(
        source: Arc<dyn SourceChain>,
        destination: Arc<dyn DestinationChain>,
        registry: Arc<TokenRegistry>,
    ) -> Self {
        Self {
            source,
            destination,
            registry,
        }
    }

    /// Rescale a deposit for Ellipticoin
    pub fn mint_request(&self, deposit: &DepositEvent) -> BridgeResult<MintRequest> {
        let precision = self.registry.precision(&deposit.token);
        Ok(MintRequest {
            token: deposit.token,
            destination: deposit.destination,
            amount: scale_down(deposit.amount, precision)?,
        })
    }

    /// Submit a mint for every deposit in `[from_block, to_block]`
    ///
    /// Stops at the first failure; mints already submitted in this range are
    /// not rolled back. Returns the number of mints submitted.
    pub async fn process_range(&self, from_block: u64, to_block: u64) -> BridgeResult<usize> {
        let logs = self.source.deposit_logs(from_block, to_block).await?;
        debug!(from_block, to_block, logs = logs.len(), "Fetched deposit logs");

        let sender = self.destination.account();
        let mut submitted = 0;

        for log in &logs {
            let deposit = decode_mint_log(log)?;
            let mint = self.mint_request(&deposit)?;

            self.destination
                .post_transaction(mint.to_transaction(sender))
                .await?;
            metrics::record_mint_submitted();
            submitted += 1;

            info!(
                block = deposit.block_number,
                log_index = deposit.log_index,
                token = %deposit.token,
                destination = %hex::encode(deposit.destination),
                raw_amount = %deposit.amount,
                amount = mint.amount,
                "Submitted Ellipticoin mint"
            );
        }

        Ok(submitted)
    }
}
