//! Decimal rescaling between Ethereum token precision and Ellipticoin's
//! fixed 6-decimal representation.
//!
//! Scaling up (Ellipticoin -> Ethereum) is exact. Scaling down
//! (Ethereum -> Ellipticoin) truncates the remainder; no rounding.

use std::collections::HashMap;

use alloy::primitives::{address, Address, U256};

use crate::error::{BridgeError, BridgeResult};

/// Ellipticoin amounts are always denominated with 6 decimals
pub const NATIVE_DECIMALS: u8 = 6;

/// Precision assumed for tokens without a registry entry
pub const DEFAULT_DECIMALS: u8 = 18;

/// renBTC on Ethereum mainnet
pub const REN_BTC: Address = address!("eb4c2781e4eba804ce9a9803c67d0893436bb27d");

/// Static mapping from token address to decimal precision
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    decimals: HashMap<Address, u8>,
}

impl Default for TokenRegistry {
    fn default() -> Self {
        let mut decimals = HashMap::new();
        decimals.insert(REN_BTC, 8);
        Self { decimals }
    }
}

impl TokenRegistry {
    /// Registry with the built-in entries plus `overrides`
    pub fn with_overrides(overrides: impl IntoIterator<Item = (Address, u8)>) -> Self {
        let mut registry = Self::default();
        registry.decimals.extend(overrides);
        registry
    }

    /// Decimal precision of `token`, 18 when unregistered
    pub fn precision(&self, token: &Address) -> u8 {
        self.decimals
            .get(token)
            .copied()
            .unwrap_or(DEFAULT_DECIMALS)
    }
}

/// 10^(precision - 6)
fn scale_factor(precision: u8) -> BridgeResult<U256> {
    let exponent = precision
        .checked_sub(NATIVE_DECIMALS)
        .ok_or(BridgeError::UnsupportedPrecision { precision })?;

    U256::from(10u64)
        .checked_pow(U256::from(exponent))
        .ok_or(BridgeError::UnsupportedPrecision { precision })
}

/// Convert a 6-decimal Ellipticoin amount up to the token's precision
pub fn scale_up(native_amount: u64, precision: u8) -> BridgeResult<U256> {
    let factor = scale_factor(precision)?;
    U256::from(native_amount)
        .checked_mul(factor)
        .ok_or_else(|| BridgeError::AmountOverflow {
            reason: format!("{} * 10^{} exceeds 256 bits", native_amount, precision - NATIVE_DECIMALS),
        })
}

/// Convert a raw token amount down to 6 decimals, truncating the remainder
pub fn scale_down(raw_amount: U256, precision: u8) -> BridgeResult<u64> {
    let factor = scale_factor(precision)?;
    let scaled = raw_amount / factor;
    u64::try_from(scaled).map_err(|_| BridgeError::AmountOverflow {
        reason: format!("scaled amount {} does not fit in u64", scaled),
    })
}
