//! Ellipticoin (destination chain) access
//!
//! The relay needs two things from Ellipticoin: post a signed `Bridge.mint`
//! transaction, and look up a finished transaction by id. Both sit behind
//! [`DestinationChain`] so the relay engine can run against an in-memory chain
//! in tests.

use async_trait::async_trait;
use ciborium::Value;

use crate::error::BridgeResult;

pub mod client;
pub mod codec;

pub use client::EllipticoinClient;
pub use codec::Argument;

/// Contract that holds the bridged token balances on Ellipticoin
pub const BRIDGE_CONTRACT: &str = "Bridge";

/// Function the relay calls to credit a deposit
pub const MINT_FUNCTION: &str = "mint";

/// A transaction as reported by the Ellipticoin transaction lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// base64(CBOR(result)), `{"Ok": null}` on success
    pub return_value: String,
    /// base64(CBOR([args...]))
    pub arguments: String,
}

/// Unsigned transaction body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub contract: String,
    /// ed25519 public key of the submitting account; encoded as an array of
    /// 32 unsigned integers, not a byte string
    pub sender: [u8; 32],
    pub function: String,
    pub arguments: Vec<Argument>,
}

impl TransactionRequest {
    pub fn to_value(&self) -> Value {
        Value::Map(vec![
            (
                Value::Text("contract".into()),
                Value::Text(self.contract.clone()),
            ),
            (
                Value::Text("sender".into()),
                Value::Array(
                    self.sender
                        .iter()
                        .map(|byte| Value::Integer((*byte).into()))
                        .collect(),
                ),
            ),
            (
                Value::Text("function".into()),
                Value::Text(self.function.clone()),
            ),
            (
                Value::Text("arguments".into()),
                Value::Array(self.arguments.iter().map(Argument::to_value).collect()),
            ),
        ])
    }
}

#[async_trait]
pub trait DestinationChain: Send + Sync {
    /// ed25519 public key the relay submits transactions from
    fn account(&self) -> [u8; 32];

    /// Look up a transaction; `Ok(None)` when the id is unknown
    async fn get_transaction(&self, transaction_id: u32) -> BridgeResult<Option<Transaction>>;

    /// Sign and submit a transaction. Fire-and-forget: no receipt is awaited.
    async fn post_transaction(&self, request: TransactionRequest) -> BridgeResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_request_value_layout() {
        let request = TransactionRequest {
            contract: BRIDGE_CONTRACT.to_string(),
            sender: [7u8; 32],
            function: MINT_FUNCTION.to_string(),
            arguments: vec![Argument::Bytes(vec![1, 2]), Argument::Unsigned(5)],
        };

        let Value::Map(entries) = request.to_value() else {
            panic!("expected map");
        };
        let keys: Vec<_> = entries
            .iter()
            .map(|(k, _)| k.as_text().unwrap().to_string())
            .collect();
        assert_eq!(keys, vec!["contract", "sender", "function", "arguments"]);
        assert_eq!(
            entries[1].1,
            Value::Array(vec![Value::Integer(7.into()); 32])
        );
        assert_eq!(
            entries[3].1,
            Value::Array(vec![Value::Bytes(vec![1, 2]), Value::Integer(5.into())])
        );
    }

    #[test]
    fn test_sender_is_encoded_as_integer_array() {
        let request = TransactionRequest {
            contract: BRIDGE_CONTRACT.to_string(),
            sender: [0xab; 32],
            function: MINT_FUNCTION.to_string(),
            arguments: vec![],
        };
        let bytes = codec::to_cbor(&request.to_value()).unwrap();

        // text(6) "sender"
        let key = [0x66, b's', b'e', b'n', b'd', b'e', b'r'];
        let start = bytes
            .windows(key.len())
            .position(|window| window == &key[..])
            .unwrap()
            + key.len();

        // array(32), then uint8 0xab per element
        assert_eq!(&bytes[start..start + 2], &[0x98, 0x20]);
        assert_eq!(&bytes[start + 2..start + 4], &[0x18, 0xab]);
    }
}
