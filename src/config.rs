//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (wallet keypair, relay credential) are referenced by env-var
//! name in the config and resolved at runtime via `std::env::var`.
//! The resulting `AppConfig` is built once at startup and handed to each
//! component's constructor.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use std::time::Duration;

use crate::types::BotError;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub agent: AgentConfig,
    pub rpc: RpcConfig,
    pub risk: RiskConfig,
    pub trading: TradingConfig,
    pub wallet: WalletConfig,
    #[serde(default)]
    pub relay: RelayConfig,
    pub venue: VenueConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AgentConfig {
    pub name: String,
    /// Target wall time of one cycle.
    pub scan_interval_ms: u64,
    /// Minimum sleep between cycles, even when a cycle overruns.
    #[serde(default = "default_floor_sleep_ms")]
    pub floor_sleep_ms: u64,
    /// Consecutive cycle failures before the recovery pause.
    pub pause_after_fails: u32,
    #[serde(default = "default_recovery_delay_secs")]
    pub recovery_delay_secs: u64,
    /// Sleep while the daily loss guard is tripped.
    #[serde(default = "default_guard_cooldown_secs")]
    pub guard_cooldown_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RpcConfig {
    pub endpoints: Vec<String>,
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    /// Chance that `best()` refreshes health before answering.
    #[serde(default = "default_probe_probability")]
    pub probe_probability: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RiskConfig {
    pub min_profit_usd: Decimal,
    pub max_notional_usd: Decimal,
    pub daily_loss_limit_usd: Decimal,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TradingConfig {
    /// Fixed notional each strategy quotes.
    pub spread_notional_usd: Decimal,
    pub slippage_bps_per_leg: u16,
    pub max_route_slippage_bps: u16,
    pub taker_fee_bps: u32,
    pub priority_fee_lamports: u64,
    /// Reference USD price of the native asset (fee and benchmark valuation).
    pub native_usd_price: Decimal,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub paper_trade: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WalletConfig {
    pub keypair_env: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RelayConfig {
    pub enabled: bool,
    pub url: String,
    pub auth_env: Option<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: "https://mainnet.block-engine.jito.wtf/api/v1/bundles".to_string(),
            auth_env: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct VenueConfig {
    pub quote_api_url: String,
    pub tokens_url: String,
    #[serde(default = "default_discovery_refresh_secs")]
    pub discovery_refresh_secs: u64,
    #[serde(default = "default_max_pairs")]
    pub max_pairs: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 8080,
        }
    }
}

fn default_floor_sleep_ms() -> u64 {
    50
}

fn default_recovery_delay_secs() -> u64 {
    5
}

fn default_guard_cooldown_secs() -> u64 {
    60
}

fn default_probe_timeout_ms() -> u64 {
    2_000
}

fn default_probe_probability() -> f64 {
    0.1
}

fn default_discovery_refresh_secs() -> u64 {
    600
}

fn default_max_pairs() -> usize {
    120
}

impl AppConfig {
    /// Load configuration from a TOML file, apply env overrides and validate.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let mut config = Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Environment beats file: `RPC_URLS`, `DRY_RUN`, `PAPER_TRADE`.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(urls) = std::env::var("RPC_URLS") {
            let endpoints = parse_url_list(&urls);
            if !endpoints.is_empty() {
                self.rpc.endpoints = endpoints;
            }
        }
        if let Some(flag) = env_flag("DRY_RUN") {
            self.trading.dry_run = flag;
        }
        if let Some(flag) = env_flag("PAPER_TRADE") {
            self.trading.paper_trade = flag;
        }
    }

    /// Reject configurations the supervisor cannot run with.
    pub fn validate(&self) -> Result<(), BotError> {
        if self.rpc.endpoints.is_empty() {
            return Err(BotError::Config("rpc.endpoints must not be empty".into()));
        }
        if !(0.0..=1.0).contains(&self.rpc.probe_probability) {
            return Err(BotError::Config(format!(
                "rpc.probe_probability must be within [0, 1], got {}",
                self.rpc.probe_probability
            )));
        }
        if self.agent.scan_interval_ms == 0 {
            return Err(BotError::Config("agent.scan_interval_ms must be > 0".into()));
        }
        if self.agent.guard_cooldown_secs.saturating_mul(1_000) <= self.agent.scan_interval_ms {
            return Err(BotError::Config(format!(
                "agent.guard_cooldown_secs ({}s) must be longer than agent.scan_interval_ms ({}ms)",
                self.agent.guard_cooldown_secs, self.agent.scan_interval_ms
            )));
        }
        if self.venue.discovery_refresh_secs == 0 {
            return Err(BotError::Config("venue.discovery_refresh_secs must be > 0".into()));
        }
        if self.agent.pause_after_fails == 0 {
            return Err(BotError::Config("agent.pause_after_fails must be > 0".into()));
        }
        if self.risk.max_notional_usd <= Decimal::ZERO {
            return Err(BotError::Config("risk.max_notional_usd must be > 0".into()));
        }
        if self.trading.max_route_slippage_bps > self.plan_slippage_bps() {
            return Err(BotError::Config(format!(
                "trading.max_route_slippage_bps ({}) exceeds two legs of slippage ({})",
                self.trading.max_route_slippage_bps,
                self.plan_slippage_bps()
            )));
        }
        Ok(())
    }

    /// Notional each strategy quotes, capped by the risk limit.
    pub fn effective_notional_usd(&self) -> Decimal {
        self.trading
            .spread_notional_usd
            .min(self.risk.max_notional_usd)
    }

    /// Slippage tolerance carried by a plan: both legs' allowance.
    pub fn plan_slippage_bps(&self) -> u16 {
        self.trading.slippage_bps_per_leg.saturating_mul(2)
    }

    /// Either simulation flag disables live sends.
    pub fn is_simulated(&self) -> bool {
        self.trading.dry_run || self.trading.paper_trade
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.agent.scan_interval_ms)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    /// Resolve a secret env var; empty values count as unset.
    pub fn resolve_secret(env_name: &str) -> Option<SecretString> {
        Self::resolve_env(env_name)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(SecretString::new)
    }
}

fn parse_url_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn env_flag(name: &str) -> Option<bool> {
    let value = std::env::var(name).ok()?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) const SAMPLE_CONFIG: &str = r#"
[agent]
name = "SWAPSCAN-TEST"
scan_interval_ms = 1500
pause_after_fails = 5

[rpc]
endpoints = ["https://rpc-a.example.com", "https://rpc-b.example.com"]

[risk]
min_profit_usd = 0.50
max_notional_usd = 50.0
daily_loss_limit_usd = 25.0

[trading]
spread_notional_usd = 50.0
slippage_bps_per_leg = 30
max_route_slippage_bps = 50
taker_fee_bps = 30
priority_fee_lamports = 10000
native_usd_price = 150.0
dry_run = true

[wallet]
keypair_env = "USER_KEYPAIR"

[venue]
quote_api_url = "https://quote-api.jup.ag/v6"
tokens_url = "https://tokens.jup.ag/tokens?filter=verified"
"#;
