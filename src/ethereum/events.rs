//! Bridge contract `Mint` event
//!
//! Indexed topics:
//! - topics[0] = event signature
//! - topics[1] = token (address, left-padded)
//!
//! Non-indexed data (abi encoded):
//! - ellipticoinAddress (bytes32)
//! - amount (uint256)

use alloy::primitives::{b256, Address, B256, U256};
use alloy::sol;

use super::RawLog;
use crate::error::{BridgeError, BridgeResult};
use crate::processor::DepositEvent;

sol! {
    /// Emitted by the Ethereum bridge when a token is locked for Ellipticoin
    event Mint(address indexed token, bytes32 ellipticoinAddress, uint256 amount);
}

/// keccak256("Mint(address,bytes32,uint256)")
pub const MINT_TOPIC: B256 =
    b256!("103a2d32aec953695f3b9ec5ed6c1c6cb822debe92cf1fcf0832cb2c262c7eec");

/// Position of `token` among the event's indexed parameters
pub const MINT_TOKEN_INDEX: usize = 0;

/// Topic slot holding the indexed parameter at `index`
///
/// Slot 0 is the event signature, so indexed parameters start at 1.
pub const fn token_topic_position(index: usize) -> usize {
    1 + index
}

/// Decode a `Mint` log into a deposit
///
/// The caller's log filter guarantees topics[0]; it is not checked here.
pub fn decode_mint_log(log: &RawLog) -> BridgeResult<DepositEvent> {
    let malformed = |reason: String| BridgeError::MalformedLog {
        block_number: log.block_number,
        log_index: log.log_index,
        reason,
    };

    let position = token_topic_position(MINT_TOKEN_INDEX);
    let token_topic = log.topics.get(position).ok_or_else(|| {
        malformed(format!(
            "expected token in topic {}, log has {} topics",
            position,
            log.topics.len()
        ))
    })?;

    let data = log.data.as_ref();
    if data.len() < 64 {
        return Err(malformed(format!(
            "expected 64 bytes of data, got {}",
            data.len()
        )));
    }

    // Address is right-aligned in the 32-byte topic
    let token = Address::from_slice(&token_topic[12..]);

    let mut destination = [0u8; 32];
    destination.copy_from_slice(&data[0..32]);
    let amount = U256::from_be_slice(&data[32..64]);

    Ok(DepositEvent {
        token,
        destination,
        amount,
        block_number: log.block_number,
        log_index: log.log_index,
    })
}
