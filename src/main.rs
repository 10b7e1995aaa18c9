use std::net::SocketAddr;
use std::sync::Arc;

use eyre::WrapErr;
use tokio::sync::mpsc;

use ellipticoin_bridge::attestor::ReleaseAttestor;
use ellipticoin_bridge::config::Config;
use ellipticoin_bridge::decimals::TokenRegistry;
use ellipticoin_bridge::ellipticoin::{DestinationChain, EllipticoinClient};
use ellipticoin_bridge::ethereum::{EthereumClient, SourceChain};
use ellipticoin_bridge::processor::MintProcessor;
use ellipticoin_bridge::server::{self, AppState};
use ellipticoin_bridge::signer::ReleaseSigner;
use ellipticoin_bridge::watcher::ChainWatcher;

/// Buffered heads between the subscription and the watcher
const HEAD_CHANNEL_CAPACITY: usize = 64;

fn main() -> eyre::Result<()> {
    // Install color-eyre for better error reporting
    color_eyre::install()?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main())
}

async fn async_main() -> eyre::Result<()> {
    init_logging();

    tracing::info!("Starting Ellipticoin bridge relayer");

    let config = Config::load()?;
    tracing::info!(
        port = config.port,
        bridge = %config.eth_bridge_address,
        confirmations = config.confirmations_required,
        ellipticoin_url = %config.ellipticoin_url,
        "Configuration loaded"
    );

    let signer = Arc::new(
        ReleaseSigner::from_hex(&config.eth_private_key).wrap_err("Invalid ETH_PRIVATE_KEY")?,
    );
    tracing::info!(signer = %signer.address(), "Release signer loaded");

    let registry = Arc::new(TokenRegistry::with_overrides(
        config.token_decimals.iter().copied(),
    ));

    let ellipticoin: Arc<dyn DestinationChain> = Arc::new(
        EllipticoinClient::from_base64_key(&config.ellipticoin_url, &config.ellipticoin_private_key)
            .wrap_err("Invalid PRIVATE_KEY")?,
    );
    tracing::info!(
        account = %hex::encode(ellipticoin.account()),
        "Ellipticoin account loaded"
    );

    let ethereum = EthereumClient::connect(
        &config.eth_rpc_url,
        config.eth_bridge_address,
        config.mint_topic,
    )
    .await?;
    let current_head = ethereum
        .block_number()
        .await
        .wrap_err("Failed to read current Ethereum block")?;
    tracing::info!(current_head, "Connected to Ethereum");

    // Subscribe before the watcher starts so no head is missed
    let (head_tx, head_rx) = mpsc::channel(HEAD_CHANNEL_CAPACITY);
    let pump = ethereum.spawn_head_pump(head_tx);

    let processor = MintProcessor::new(
        Arc::new(ethereum),
        ellipticoin.clone(),
        registry.clone(),
    );
    let mut watcher = ChainWatcher::new(processor, config.confirmations_required, current_head);

    let state = AppState {
        attestor: Arc::new(ReleaseAttestor::new(
            ellipticoin,
            registry,
            signer,
            config.eth_bridge_address,
        )),
        watermark: watcher.watermark_handle(),
    };
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    let outcome = tokio::select! {
        // run only returns on failure, already logged with the watermark
        result = watcher.run(head_rx) => result.err().map(eyre::Report::from),
        result = server::start_server(addr, state) => {
            result.err().map(|e| {
                tracing::error!(error = %e, "HTTP server error");
                e
            })
        }
        _ = wait_for_shutdown_signal() => None,
    };

    pump.abort();
    tracing::info!("Ellipticoin bridge relayer stopped");

    match outcome {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Initialize tracing/logging with structured output
fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,ellipticoin_bridge=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(filter)
        .init();
}

/// Wait for shutdown signals (SIGINT/SIGTERM)
async fn wait_for_shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
