//! SWAPSCAN: supervised swap-venue scanner
//!
//! Entry point. Loads configuration, initialises structured logging,
//! wires the venue adapters, endpoint pool and strategies together and
//! runs the supervisor loop until Ctrl+C.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use swapscan::api::{self, ApiState, StatusBoard};
use swapscan::config::AppConfig;
use swapscan::engine::{Executor, Supervisor, SupervisorConfig};
use swapscan::rpc::{EndpointPool, JsonRpcHealthCheck};
use swapscan::strategy::{LossGuard, PlanPricer, StableDelta, Strategy, StrategySet, TwoLegSpread};
use swapscan::venue::discovery::TokenListDiscovery;
use swapscan::venue::jito::JitoRelay;
use swapscan::venue::jupiter::JupiterClient;
use swapscan::venue::submitter::LiveSubmitter;
use swapscan::venue::wallet::Wallet;
use swapscan::venue::Discovery;

const BANNER: &str = r#"
 ____                     ____
/ ___|_      ____ _ _ __ / ___|  ___ __ _ _ __
\___ \ \ /\ / / _` | '_ \\___ \ / __/ _` | '_ \
 ___) \ V  V / (_| | |_) |___) | (_| (_| | | | |
|____/ \_/\_/ \__,_| .__/|____/ \___\__,_|_| |_|
                   |_|
  scan -> rank -> risk-gate -> execute
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = std::env::var("SWAPSCAN_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let mut cfg = AppConfig::load(&config_path)?;

    init_logging();

    println!("{BANNER}");
    info!(
        agent_name = %cfg.agent.name,
        scan_interval_ms = cfg.agent.scan_interval_ms,
        endpoints = cfg.rpc.endpoints.len(),
        dry_run = cfg.trading.dry_run,
        paper_trade = cfg.trading.paper_trade,
        "SWAPSCAN starting up"
    );

    // -- Wallet ----------------------------------------------------------

    let wallet = match AppConfig::resolve_secret(&cfg.wallet.keypair_env) {
        Some(secret) => Some(
            Wallet::from_base58(&secret)
                .with_context(|| format!("Invalid keypair in {}", cfg.wallet.keypair_env))?,
        ),
        None => None,
    };

    match &wallet {
        Some(w) => info!(pubkey = %w.pubkey(), "Wallet loaded"),
        None if !cfg.is_simulated() => {
            warn!(
                env = %cfg.wallet.keypair_env,
                "Live mode requested but no keypair available, forcing dry-run"
            );
            cfg.trading.dry_run = true;
        }
        None => info!("No wallet keypair, running in simulation mode"),
    }

    // -- Endpoint pool ---------------------------------------------------

    let pool = Arc::new(EndpointPool::new(
        &cfg.rpc.endpoints,
        Arc::new(JsonRpcHealthCheck::new()?),
        Duration::from_millis(cfg.rpc.probe_timeout_ms),
        cfg.rpc.probe_probability,
    )?);
    pool.probe().await;

    // -- Venue -----------------------------------------------------------

    let quoter = Arc::new(JupiterClient::new(&cfg.venue.quote_api_url)?);

    let discovery = Arc::new(TokenListDiscovery::new(&cfg.venue.tokens_url, cfg.venue.max_pairs)?);
    if let Err(e) = discovery.refresh().await {
        warn!(error = %e, "Initial discovery failed, continuing with fixed pairs only");
    }
    spawn_discovery_refresher(
        Arc::clone(&discovery),
        Duration::from_secs(cfg.venue.discovery_refresh_secs),
    );

    // -- Strategies ------------------------------------------------------

    let pricer = PlanPricer::from_config(quoter, &cfg);
    let strategies: Vec<Arc<dyn Strategy>> = vec![
        Arc::new(TwoLegSpread::new(pricer.clone())),
        Arc::new(StableDelta::new(discovery, pricer)),
    ];

    // -- Executor --------------------------------------------------------

    let mut executor = Executor::new(
        Arc::clone(&pool),
        cfg.is_simulated(),
        cfg.trading.priority_fee_lamports,
    );
    if let Some(wallet) = wallet {
        let submitter = LiveSubmitter::new(JupiterClient::new(&cfg.venue.quote_api_url)?, wallet)?;
        executor = executor.with_submitter(Arc::new(submitter));
    }
    if cfg.relay.enabled {
        let auth = cfg
            .relay
            .auth_env
            .as_deref()
            .and_then(AppConfig::resolve_secret);
        info!(url = %cfg.relay.url, authenticated = auth.is_some(), "Bundle relay enabled");
        executor = executor.with_relay(Arc::new(JitoRelay::new(&cfg.relay.url, auth)?));
    }

    // -- Status API ------------------------------------------------------

    let board = Arc::new(StatusBoard::new(
        &cfg.agent.name,
        cfg.trading.dry_run,
        cfg.trading.paper_trade,
    ));
    if cfg.api.enabled {
        let state = Arc::new(ApiState {
            board: Arc::clone(&board),
            pool: Arc::clone(&pool),
        });
        api::spawn_api(state, cfg.api.port).await?;
    }

    // -- Main loop -------------------------------------------------------

    let mut supervisor = Supervisor::new(
        SupervisorConfig::from_config(&cfg),
        StrategySet::new(strategies),
        Arc::new(executor),
        LossGuard::new(cfg.risk.daily_loss_limit_usd),
    )
    .with_status(board);

    info!("Entering main loop. Press Ctrl+C to stop.");

    supervisor
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for Ctrl+C, running until killed");
                std::future::pending::<()>().await;
            }
            info!("Shutdown signal received.");
        })
        .await;

    info!(
        cycles = supervisor.cycle(),
        pnl = %supervisor.guard().accumulated_pnl_usd(),
        "SWAPSCAN shut down cleanly."
    );

    Ok(())
}

/// Refresh the pair universe in the background. The first refresh already
/// happened at startup.
fn spawn_discovery_refresher(discovery: Arc<TokenListDiscovery>, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.tick().await;
        loop {
            interval.tick().await;
            if let Err(e) = discovery.refresh().await {
                warn!(error = %e, "Discovery refresh failed, keeping previous pairs");
            }
        }
    });
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("swapscan=info"));

    let json_logging = std::env::var("SWAPSCAN_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
