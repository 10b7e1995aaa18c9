//! Error taxonomy for the relay engine
//!
//! Request-scoped variants (`TransactionNotFound`, `TransactionNotSuccessful`,
//! `InvalidArguments`, and the scaling errors) are turned into HTTP statuses by
//! the server. Background variants (`ChainRpcFailure`, `MalformedLog`,
//! `SubmissionFailure`) stop the watcher task.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Unsupported token precision: {precision} decimals")]
    UnsupportedPrecision { precision: u8 },

    #[error("Amount overflow: {reason}")]
    AmountOverflow { reason: String },

    #[error("Transaction not found: {transaction_id}")]
    TransactionNotFound { transaction_id: u32 },

    #[error("Transaction {transaction_id} did not succeed")]
    TransactionNotSuccessful { transaction_id: u32 },

    #[error("Invalid transaction arguments: {reason}")]
    InvalidArguments { reason: String },

    #[error("Malformed deposit log at block {block_number} index {log_index}: {reason}")]
    MalformedLog {
        block_number: u64,
        log_index: u64,
        reason: String,
    },

    #[error("Chain RPC failure: {0}")]
    ChainRpcFailure(String),

    #[error("Transaction submission failed: {0}")]
    SubmissionFailure(String),

    #[error("Signing failed: {0}")]
    Signing(String),
}

impl BridgeError {
    /// True for errors caused by the caller's input rather than by the relay
    pub fn is_request_scoped(&self) -> bool {
        matches!(
            self,
            BridgeError::UnsupportedPrecision { .. }
                | BridgeError::AmountOverflow { .. }
                | BridgeError::TransactionNotFound { .. }
                | BridgeError::TransactionNotSuccessful { .. }
                | BridgeError::InvalidArguments { .. }
        )
    }

    pub(crate) fn invalid_arguments(reason: impl Into<String>) -> Self {
        BridgeError::InvalidArguments {
            reason: reason.into(),
        }
    }
}

pub type BridgeResult<T> = std::result::Result<T, BridgeError>;
