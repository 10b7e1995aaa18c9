//! Ellipticoin HTTP client
//!
//! - `GET  {url}/transactions/{id}` returns a CBOR map with `return_value`
//!   and `arguments` text fields, or 404
//! - `POST {url}/transactions` takes CBOR `{transaction, signature}` where the
//!   signature is ed25519 over the CBOR encoding of `transaction`

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ciborium::Value;
use ed25519_dalek::{Signer, SigningKey};
use eyre::{eyre, Result, WrapErr};
use reqwest::{Client, StatusCode};
use tracing::debug;

use super::codec::to_cbor;
use super::{DestinationChain, Transaction, TransactionRequest};
use crate::error::{BridgeError, BridgeResult};

const CBOR_CONTENT_TYPE: &str = "application/cbor";

pub struct EllipticoinClient {
    base_url: String,
    client: Client,
    signing_key: SigningKey,
}

impl fmt::Debug for EllipticoinClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EllipticoinClient")
            .field("base_url", &self.base_url)
            .field("account", &STANDARD.encode(self.account()))
            .field("signing_key", &"<redacted>")
            .finish()
    }
}

impl EllipticoinClient {
    pub fn new(base_url: &str, signing_key: SigningKey) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .wrap_err("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            signing_key,
        })
    }

    /// Build from a base64 key: a 32-byte seed or a 64-byte seed||public keypair
    pub fn from_base64_key(base_url: &str, private_key: &str) -> Result<Self> {
        Self::new(base_url, parse_signing_key(private_key)?)
    }

    /// Wire body for a submission: `{transaction, signature}`
    pub fn signed_body(&self, request: &TransactionRequest) -> BridgeResult<Vec<u8>> {
        let transaction = request.to_value();
        let signature = self.signing_key.sign(&to_cbor(&transaction)?);

        to_cbor(&Value::Map(vec![
            (Value::Text("transaction".into()), transaction),
            (
                Value::Text("signature".into()),
                Value::Bytes(signature.to_bytes().to_vec()),
            ),
        ]))
    }
}

pub fn parse_signing_key(private_key: &str) -> Result<SigningKey> {
    let bytes = STANDARD
        .decode(private_key.trim())
        .wrap_err("PRIVATE_KEY must be base64")?;

    match bytes.len() {
        32 => {
            let mut seed = [0u8; 32];
            seed.copy_from_slice(&bytes);
            Ok(SigningKey::from_bytes(&seed))
        }
        64 => {
            let mut keypair = [0u8; 64];
            keypair.copy_from_slice(&bytes);
            SigningKey::from_keypair_bytes(&keypair)
                .map_err(|e| eyre!("PRIVATE_KEY keypair is inconsistent: {}", e))
        }
        n => Err(eyre!("PRIVATE_KEY must decode to 32 or 64 bytes, got {}", n)),
    }
}

fn text_field(entries: &[(Value, Value)], name: &str) -> BridgeResult<String> {
    entries
        .iter()
        .find(|(key, _)| key.as_text() == Some(name))
        .and_then(|(_, value)| value.as_text())
        .map(str::to_string)
        .ok_or_else(|| BridgeError::ChainRpcFailure(format!("transaction is missing `{}`", name)))
}

/// Parse a CBOR transaction lookup response
pub fn parse_transaction(body: &[u8]) -> BridgeResult<Transaction> {
    let value: Value = ciborium::from_reader(body)
        .map_err(|e| BridgeError::ChainRpcFailure(format!("invalid transaction CBOR: {}", e)))?;

    let Value::Map(entries) = value else {
        return Err(BridgeError::ChainRpcFailure(
            "transaction response is not a map".to_string(),
        ));
    };

    Ok(Transaction {
        return_value: text_field(&entries, "return_value")?,
        arguments: text_field(&entries, "arguments")?,
    })
}

#[async_trait]
impl DestinationChain for EllipticoinClient {
    fn account(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    async fn get_transaction(&self, transaction_id: u32) -> BridgeResult<Option<Transaction>> {
        let url = format!("{}/transactions/{}", self.base_url, transaction_id);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, CBOR_CONTENT_TYPE)
            .send()
            .await
            .map_err(|e| BridgeError::ChainRpcFailure(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(BridgeError::ChainRpcFailure(format!(
                "transaction lookup returned {}",
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| BridgeError::ChainRpcFailure(e.to_string()))?;
        parse_transaction(&body).map(Some)
    }

    async fn post_transaction(&self, request: TransactionRequest) -> BridgeResult<()> {
        let body = self.signed_body(&request)?;
        let url = format!("{}/transactions", self.base_url);

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, CBOR_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| BridgeError::SubmissionFailure(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(BridgeError::SubmissionFailure(format!(
                "Ellipticoin rejected {}.{}: {} {}",
                request.contract, request.function, status, text
            )));
        }

        debug!(
            contract = %request.contract,
            function = %request.function,
            "Posted Ellipticoin transaction"
        );
        Ok(())
    }
}
