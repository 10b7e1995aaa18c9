use alloy::primitives::{Address, B256};
use eyre::{eyre, Result, WrapErr};
use std::env;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::decimals::NATIVE_DECIMALS;
use crate::ethereum::MINT_TOPIC;

/// Default Ellipticoin node
pub const DEFAULT_ELLIPTICOIN_URL: &str = "https://davenport.ellipticoin.org";

fn default_confirmations_required() -> u64 {
    1
}

/// Relayer configuration, loaded from the environment (and `.env` if present)
#[derive(Clone)]
pub struct Config {
    /// HTTP port for the release endpoint
    pub port: u16,
    /// Ethereum JSON-RPC endpoint (ws/wss for head subscriptions, http/https polls)
    pub eth_rpc_url: String,
    /// secp256k1 key (hex) that signs releases
    pub eth_private_key: String,
    /// Ethereum bridge contract: emits `Mint`, verifies release signatures
    pub eth_bridge_address: Address,
    /// ed25519 key (base64) that submits Ellipticoin transactions
    pub ellipticoin_private_key: String,
    pub ellipticoin_url: String,
    pub confirmations_required: u64,
    pub mint_topic: B256,
    /// Extra token precisions on top of the built-in registry
    pub token_decimals: Vec<(Address, u8)>,
}

/// Custom Debug that redacts both private keys and the RPC URL (Infura URLs
/// embed the project id).
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("eth_rpc_url", &"<redacted>")
            .field("eth_private_key", &"<redacted>")
            .field("eth_bridge_address", &self.eth_bridge_address)
            .field("ellipticoin_private_key", &"<redacted>")
            .field("ellipticoin_url", &self.ellipticoin_url)
            .field("confirmations_required", &self.confirmations_required)
            .field("mint_topic", &self.mint_topic)
            .field("token_decimals", &self.token_decimals)
            .finish()
    }
}

/// `wss://{network}.infura.io/ws/v3/{project_id}`
pub fn infura_url(network: &str, project_id: &str) -> String {
    format!("wss://{}.infura.io/ws/v3/{}", network, project_id)
}

/// Parse `0xToken:decimals,0xToken:decimals`
pub fn parse_token_decimals(raw: &str) -> Result<Vec<(Address, u8)>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (token, decimals) = entry
                .split_once(':')
                .ok_or_else(|| eyre!("TOKEN_DECIMALS entry '{}' must be address:decimals", entry))?;
            let token = Address::from_str(token.trim())
                .wrap_err_with(|| format!("Invalid token address in TOKEN_DECIMALS: {}", token))?;
            let decimals = decimals
                .trim()
                .parse::<u8>()
                .wrap_err_with(|| format!("Invalid decimals in TOKEN_DECIMALS: {}", decimals))?;
            Ok((token, decimals))
        })
        .collect()
}

fn required(name: &str) -> Result<String> {
    env::var(name).map_err(|_| eyre!("{} environment variable is required", name))
}

impl Config {
    /// Load configuration from `.env` (if present) and the environment
    pub fn load() -> Result<Self> {
        Self::load_from_file(".env")
    }

    pub fn load_from_file(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            dotenvy::from_filename(path)
                .wrap_err_with(|| format!("Failed to load .env file from {}", path))?;
        }
        let config = Self::load_from_env()?;
        config.validate()?;
        Ok(config)
    }

    fn load_from_env() -> Result<Self> {
        let eth_rpc_url = match env::var("ETH_RPC_URL") {
            Ok(url) => url,
            Err(_) => infura_url(
                &required("INFURA_NETWORK")
                    .wrap_err("Set ETH_RPC_URL or INFURA_NETWORK and INFURA_PROJECT_ID")?,
                &required("INFURA_PROJECT_ID")
                    .wrap_err("Set ETH_RPC_URL or INFURA_NETWORK and INFURA_PROJECT_ID")?,
            ),
        };

        let eth_bridge_address = Address::from_str(required("ETH_BRIDGE_ADDRESS")?.trim())
            .wrap_err("ETH_BRIDGE_ADDRESS must be a valid hex address")?;

        let mint_topic = match env::var("MINT_TOPIC") {
            Ok(topic) => B256::from_str(topic.trim()).wrap_err("MINT_TOPIC must be 32 bytes of hex")?,
            Err(_) => MINT_TOPIC,
        };

        let confirmations_required = match env::var("CONFIRMATIONS_REQUIRED") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .wrap_err("CONFIRMATIONS_REQUIRED must be a valid u64")?,
            Err(_) => default_confirmations_required(),
        };

        let token_decimals = match env::var("TOKEN_DECIMALS") {
            Ok(raw) => parse_token_decimals(&raw)?,
            Err(_) => Vec::new(),
        };

        Ok(Self {
            port: required("PORT")?
                .parse()
                .wrap_err("PORT must be a valid u16")?,
            eth_rpc_url,
            eth_private_key: required("ETH_PRIVATE_KEY")?,
            eth_bridge_address,
            ellipticoin_private_key: required("PRIVATE_KEY")?,
            ellipticoin_url: env::var("ELLIPTICOIN_URL")
                .unwrap_or_else(|_| DEFAULT_ELLIPTICOIN_URL.to_string()),
            confirmations_required,
            mint_topic,
            token_decimals,
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let scheme_ok = ["ws://", "wss://", "http://", "https://"]
            .iter()
            .any(|scheme| self.eth_rpc_url.starts_with(scheme));
        if !scheme_ok {
            return Err(eyre!("ETH_RPC_URL must be a ws, wss, http or https URL"));
        }

        let key = self.eth_private_key.trim().trim_start_matches("0x");
        if key.len() != 64 || !key.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(eyre!("ETH_PRIVATE_KEY must be 64 hex chars (optionally 0x-prefixed)"));
        }

        if self.eth_bridge_address == Address::ZERO {
            return Err(eyre!("ETH_BRIDGE_ADDRESS cannot be the zero address"));
        }

        if self.ellipticoin_private_key.trim().is_empty() {
            return Err(eyre!("PRIVATE_KEY cannot be empty"));
        }

        if !self.ellipticoin_url.starts_with("http://") && !self.ellipticoin_url.starts_with("https://") {
            return Err(eyre!("ELLIPTICOIN_URL must be an http or https URL"));
        }

        // Below the native precision there is nothing to scale into
        if let Some((token, decimals)) = self
            .token_decimals
            .iter()
            .find(|(_, decimals)| *decimals < NATIVE_DECIMALS)
        {
            return Err(eyre!(
                "TOKEN_DECIMALS: {} has {} decimals, minimum is {}",
                token,
                decimals,
                NATIVE_DECIMALS
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "PORT",
        "ETH_RPC_URL",
        "INFURA_NETWORK",
        "INFURA_PROJECT_ID",
        "ETH_PRIVATE_KEY",
        "ETH_BRIDGE_ADDRESS",
        "PRIVATE_KEY",
        "ELLIPTICOIN_URL",
        "CONFIRMATIONS_REQUIRED",
        "MINT_TOPIC",
        "TOKEN_DECIMALS",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    fn set_required_env() {
        env::set_var("PORT", "8080");
        env::set_var("INFURA_NETWORK", "mainnet");
        env::set_var("INFURA_PROJECT_ID", "abc123");
        env::set_var(
            "ETH_PRIVATE_KEY",
            "0x0000000000000000000000000000000000000000000000000000000000000001",
        );
        env::set_var("ETH_BRIDGE_ADDRESS", "0x2222222222222222222222222222222222222222");
        env::set_var("PRIVATE_KEY", "CQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQk=");
    }

    fn valid_config() -> Config {
        Config {
            port: 8080,
            eth_rpc_url: "wss://mainnet.infura.io/ws/v3/abc123".to_string(),
            eth_private_key: "0x0000000000000000000000000000000000000000000000000000000000000001"
                .to_string(),
            eth_bridge_address: address!("2222222222222222222222222222222222222222"),
            ellipticoin_private_key: "CQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQk=".to_string(),
            ellipticoin_url: DEFAULT_ELLIPTICOIN_URL.to_string(),
            confirmations_required: 1,
            mint_topic: MINT_TOPIC,
            token_decimals: vec![],
        }
    }

    #[test]
    fn test_default_confirmations_required() {
        assert_eq!(default_confirmations_required(), 1);
    }

    #[test]
    fn test_infura_url() {
        assert_eq!(
            infura_url("ropsten", "p1"),
            "wss://ropsten.infura.io/ws/v3/p1"
        );
    }

    #[test]
    #[serial]
    fn test_load_from_env_with_defaults() {
        clear_env();
        set_required_env();

        let config = Config::load_from_env().unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.port, 8080);
        assert_eq!(config.eth_rpc_url, "wss://mainnet.infura.io/ws/v3/abc123");
        assert_eq!(config.ellipticoin_url, DEFAULT_ELLIPTICOIN_URL);
        assert_eq!(config.confirmations_required, 1);
        assert_eq!(config.mint_topic, MINT_TOPIC);
        assert!(config.token_decimals.is_empty());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_load_from_env_overrides() {
        clear_env();
        set_required_env();
        env::set_var("ETH_RPC_URL", "http://localhost:8545");
        env::set_var("CONFIRMATIONS_REQUIRED", "12");
        env::set_var(
            "TOKEN_DECIMALS",
            "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48:6, 0x2260fac5e5542a773aa44fbcfedf7c193bc2c599:8",
        );

        let config = Config::load_from_env().unwrap();
        assert_eq!(config.eth_rpc_url, "http://localhost:8545");
        assert_eq!(config.confirmations_required, 12);
        assert_eq!(config.token_decimals.len(), 2);
        assert_eq!(config.token_decimals[1].1, 8);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_missing_required_var() {
        clear_env();
        set_required_env();
        env::remove_var("PORT");

        let err = Config::load_from_env().unwrap_err();
        assert!(err.to_string().contains("PORT"));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_confirmations_rejected() {
        clear_env();
        set_required_env();
        env::set_var("CONFIRMATIONS_REQUIRED", "six");

        let err = Config::load_from_env().unwrap_err();
        assert!(err.to_string().contains("CONFIRMATIONS_REQUIRED"));

        env::set_var("CONFIRMATIONS_REQUIRED", "-1");
        assert!(Config::load_from_env().is_err());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_missing_rpc_url() {
        clear_env();
        set_required_env();
        env::remove_var("INFURA_PROJECT_ID");

        assert!(Config::load_from_env().is_err());

        clear_env();
    }

    #[test]
    fn test_validation() {
        let mut config = valid_config();
        assert!(config.validate().is_ok());

        config.eth_private_key = "0x123".to_string();
        assert!(config.validate().is_err());

        config = valid_config();
        config.eth_rpc_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());

        config = valid_config();
        config.eth_bridge_address = Address::ZERO;
        assert!(config.validate().is_err());

        config = valid_config();
        config.token_decimals = vec![(Address::repeat_byte(1), 2)];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_token_decimals_rejects_garbage() {
        assert!(parse_token_decimals("0x1234").is_err());
        assert!(parse_token_decimals("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48:x").is_err());
        assert!(parse_token_decimals("").unwrap().is_empty());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug = format!("{:?}", valid_config());
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("abc123"));
        assert!(!debug.contains("CQkJ"));
    }
}
