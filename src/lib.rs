//! Ellipticoin bridge relayer
//!
//! Two independent paths share this crate:
//!
//! - Mint: watch the Ethereum bridge for confirmed `Mint` deposits and submit
//!   matching `Bridge.mint` transactions on Ellipticoin ([`watcher`],
//!   [`processor`]).
//! - Release: on request, verify an Ellipticoin release transaction succeeded
//!   and sign the claim the Ethereum bridge needs to unlock funds
//!   ([`attestor`], [`server`]).

pub mod attestor;
pub mod config;
pub mod decimals;
pub mod ellipticoin;
pub mod error;
pub mod ethereum;
pub mod hash;
pub mod metrics;
pub mod processor;
pub mod server;
pub mod signer;
pub mod watcher;

pub use error::{BridgeError, BridgeResult};
