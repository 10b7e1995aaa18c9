//! Hash computation for release claims
//!
//! The release message hash must match the Ethereum bridge contract's
//! `release` verifier byte-for-byte:
//!
//! keccak256(token ‖ recipient ‖ leftPad32(amount) ‖ be32(foreignTransactionId) ‖ bridge)
//!
//! Addresses are the raw 20 bytes (packed, not ABI-padded), so the preimage is
//! 20 + 20 + 32 + 4 + 20 = 96 bytes.

use alloy::primitives::{Address, U256};
use tiny_keccak::{Hasher, Keccak};

/// Length of the packed release preimage
pub const RELEASE_PREIMAGE_LEN: usize = 96;

/// Compute keccak256 hash of data
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

/// Left-pad a big-endian amount to a 32-byte word
pub fn left_pad32(amount: U256) -> [u8; 32] {
    amount.to_be_bytes::<32>()
}

/// A release claim: everything the Ethereum bridge needs to unlock funds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseClaim {
    pub token: Address,
    pub recipient: Address,
    /// Amount in the token's own precision
    pub amount: U256,
    /// Ellipticoin transaction id; binds the signature so it cannot be replayed
    pub foreign_transaction_id: u32,
    /// Ethereum bridge contract that will verify the signature
    pub bridge_address: Address,
}

impl ReleaseClaim {
    /// Packed preimage in contract field order
    pub fn preimage(&self) -> [u8; RELEASE_PREIMAGE_LEN] {
        let mut data = [0u8; RELEASE_PREIMAGE_LEN];
        data[0..20].copy_from_slice(self.token.as_slice());
        data[20..40].copy_from_slice(self.recipient.as_slice());
        data[40..72].copy_from_slice(&left_pad32(self.amount));
        data[72..76].copy_from_slice(&self.foreign_transaction_id.to_be_bytes());
        data[76..96].copy_from_slice(self.bridge_address.as_slice());
        data
    }

    /// Message hash signed by the relay
    pub fn message_hash(&self) -> [u8; 32] {
        keccak256(&self.preimage())
    }
}

/// Convert bytes to hex string with 0x prefix
pub fn bytes32_to_hex(bytes: &[u8; 32]) -> String {
    format!("0x{}", hex::encode(bytes))
}
