//! Release signing key holder
//!
//! Wraps the relay's secp256k1 key. The key never leaves this type: callers get
//! signatures and the derived Ethereum address, nothing else. `SigningKey`
//! zeroizes its scalar on drop.

use std::fmt;

use alloy::primitives::Address;
use k256::ecdsa::SigningKey;

use crate::error::{BridgeError, BridgeResult};
use crate::hash::keccak256;

/// Offset added to the raw recovery id (Ethereum legacy `v` encoding)
pub const RECOVERY_ID_OFFSET: u8 = 27;

/// 65-byte `r || s || v` signature with `v = recid + 27`
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ReleaseSignature(pub [u8; 65]);

impl ReleaseSignature {
    pub fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }

    /// The `v` byte
    pub fn v(&self) -> u8 {
        self.0[64]
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for ReleaseSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReleaseSignature").field(&self.to_hex()).finish()
    }
}

pub struct ReleaseSigner {
    key: SigningKey,
    address: Address,
}

/// Redacts the key; only the address is printed
impl fmt::Debug for ReleaseSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseSigner")
            .field("address", &self.address)
            .field("key", &"<redacted>")
            .finish()
    }
}

impl ReleaseSigner {
    /// Parse a hex private key, with or without 0x prefix
    pub fn from_hex(private_key: &str) -> BridgeResult<Self> {
        let hex_str = private_key.trim().trim_start_matches("0x");
        let bytes = hex::decode(hex_str)
            .map_err(|e| BridgeError::Signing(format!("Invalid private key hex: {}", e)))?;
        let key = SigningKey::from_slice(&bytes)
            .map_err(|e| BridgeError::Signing(format!("Invalid secp256k1 key: {}", e)))?;
        Ok(Self::new(key))
    }

    pub fn new(key: SigningKey) -> Self {
        let address = ethereum_address(&key);
        Self { key, address }
    }

    /// Ethereum address of the signing key
    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a 32-byte message hash (no EIP-191 prefix)
    ///
    /// RFC 6979 nonces make this deterministic for a given key and hash.
    pub fn sign_hash(&self, hash: &[u8; 32]) -> BridgeResult<ReleaseSignature> {
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(hash)
            .map_err(|e| BridgeError::Signing(e.to_string()))?;

        let mut bytes = [0u8; 65];
        bytes[..64].copy_from_slice(&signature.to_bytes());
        bytes[64] = recovery_id.to_byte() + RECOVERY_ID_OFFSET;
        Ok(ReleaseSignature(bytes))
    }
}

/// keccak256(uncompressed_pubkey[1..])[12..]
fn ethereum_address(key: &SigningKey) -> Address {
    let point = key.verifying_key().to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}
