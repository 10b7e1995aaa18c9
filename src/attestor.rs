//! Release attestation
//!
//! Given an Ellipticoin transaction id, prove the burn/release transaction
//! succeeded and sign the claim the Ethereum bridge checks before unlocking
//! funds. The transaction id is part of the signed hash, so a signature cannot
//! be replayed for a different release.

use std::sync::Arc;

use alloy::primitives::Address;
use tracing::{info, warn};

use crate::decimals::{scale_up, TokenRegistry};
use crate::ellipticoin::codec::{decode_arguments, is_success_marker};
use crate::ellipticoin::{Argument, DestinationChain};
use crate::error::{BridgeError, BridgeResult};
use crate::hash::{bytes32_to_hex, ReleaseClaim};
use crate::metrics::{self, ReleaseResult};
use crate::signer::{ReleaseSignature, ReleaseSigner};

/// Positional arguments of an Ellipticoin release: `[token, recipient, amount]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseArguments {
    pub token: Address,
    pub recipient: Address,
    /// Amount in Ellipticoin's 6 decimals
    pub amount: u64,
}

fn address_argument(argument: &Argument, name: &str) -> BridgeResult<Address> {
    match argument {
        Argument::Bytes(bytes) if bytes.len() == 20 => Ok(Address::from_slice(bytes)),
        Argument::Bytes(bytes) => Err(BridgeError::invalid_arguments(format!(
            "{} must be 20 bytes, got {}",
            name,
            bytes.len()
        ))),
        Argument::Unsigned(_) => Err(BridgeError::invalid_arguments(format!(
            "{} must be a byte string",
            name
        ))),
    }
}

impl ReleaseArguments {
    pub fn from_arguments(arguments: &[Argument]) -> BridgeResult<Self> {
        let [token, recipient, amount] = arguments else {
            return Err(BridgeError::invalid_arguments(format!(
                "expected 3 arguments, got {}",
                arguments.len()
            )));
        };

        let amount = match amount {
            Argument::Unsigned(amount) => *amount,
            Argument::Bytes(_) => {
                return Err(BridgeError::invalid_arguments(
                    "amount must be an unsigned integer",
                ))
            }
        };

        Ok(Self {
            token: address_argument(token, "token")?,
            recipient: address_argument(recipient, "recipient")?,
            amount,
        })
    }
}

pub struct ReleaseAttestor {
    destination: Arc<dyn DestinationChain>,
    registry: Arc<TokenRegistry>,
    signer: Arc<ReleaseSigner>,
    bridge_address: Address,
}

impl ReleaseAttestor {
    pub fn new(
        destination: Arc<dyn DestinationChain>,
        registry: Arc<TokenRegistry>,
        signer: Arc<ReleaseSigner>,
        bridge_address: Address,
    ) -> Self {
        Self {
            destination,
            registry,
            signer,
            bridge_address,
        }
    }

    /// Build the release claim for a finished Ellipticoin transaction
    pub async fn release_claim(&self, transaction_id: u32) -> BridgeResult<ReleaseClaim> {
        let transaction = self
            .destination
            .get_transaction(transaction_id)
            .await?
            .ok_or(BridgeError::TransactionNotFound { transaction_id })?;

        if !is_success_marker(&transaction.return_value) {
            return Err(BridgeError::TransactionNotSuccessful { transaction_id });
        }

        let arguments = ReleaseArguments::from_arguments(&decode_arguments(&transaction.arguments)?)?;
        let precision = self.registry.precision(&arguments.token);

        Ok(ReleaseClaim {
            token: arguments.token,
            recipient: arguments.recipient,
            amount: scale_up(arguments.amount, precision)?,
            foreign_transaction_id: transaction_id,
            bridge_address: self.bridge_address,
        })
    }

    /// Sign the release for `transaction_id`
    ///
    /// Deterministic: the same transaction and key always give the same bytes.
    pub async fn attest(&self, transaction_id: u32) -> BridgeResult<ReleaseSignature> {
        let result = self.sign_release(transaction_id).await;

        match &result {
            Ok(_) => metrics::record_release(ReleaseResult::Signed),
            Err(e) if e.is_request_scoped() => {
                warn!(transaction_id, error = %e, "Release request rejected");
                metrics::record_release(ReleaseResult::Rejected);
            }
            Err(e) => {
                warn!(transaction_id, error = %e, "Release attestation failed");
                metrics::record_release(ReleaseResult::Failed);
            }
        }

        result
    }

    async fn sign_release(&self, transaction_id: u32) -> BridgeResult<ReleaseSignature> {
        let claim = self.release_claim(transaction_id).await?;
        let hash = claim.message_hash();
        let signature = self.signer.sign_hash(&hash)?;

        info!(
            transaction_id,
            token = %claim.token,
            recipient = %claim.recipient,
            amount = %claim.amount,
            hash = %bytes32_to_hex(&hash),
            "Signed release"
        );

        Ok(signature)
    }
}
