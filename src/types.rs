//! Shared types for the SWAPSCAN agent.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that venue, strategy,
//! and engine modules can depend on them without circular references.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Assets
// ---------------------------------------------------------------------------

/// A statically known asset the strategies can value in fiat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Asset {
    pub symbol: &'static str,
    pub mint: &'static str,
    pub decimals: u8,
    /// Pegged 1:1 to USD.
    pub stable: bool,
}

pub const USDC: Asset = Asset {
    symbol: "USDC",
    mint: "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
    decimals: 6,
    stable: true,
};

pub const USDT: Asset = Asset {
    symbol: "USDT",
    mint: "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB",
    decimals: 6,
    stable: true,
};

/// Wrapped SOL, the benchmark (native) asset.
pub const SOL: Asset = Asset {
    symbol: "SOL",
    mint: "So11111111111111111111111111111111111111112",
    decimals: 9,
    stable: false,
};

pub const KNOWN_ASSETS: [Asset; 3] = [USDC, USDT, SOL];

impl Asset {
    /// Look up a known asset by mint address.
    pub fn by_mint(mint: &str) -> Option<Asset> {
        KNOWN_ASSETS.iter().copied().find(|a| a.mint == mint)
    }

    /// Convert a human amount (e.g. 50.0 USDC) to raw base units.
    pub fn to_base_units(&self, amount: Decimal) -> Option<u64> {
        use rust_decimal::prelude::ToPrimitive;
        let scale = Decimal::from(10u64.pow(u32::from(self.decimals)));
        (amount * scale).trunc().to_u64()
    }

    /// Convert raw base units to a human amount.
    pub fn from_base_units(&self, raw: u64) -> Decimal {
        Decimal::from_i128_with_scale(i128::from(raw), u32::from(self.decimals))
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

/// A token entry as served by the discovery token list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub symbol: String,
    pub mint: String,
    pub decimals: u8,
}

/// An unordered tradable pair from discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub asset_a: TokenInfo,
    pub asset_b: TokenInfo,
}

impl fmt::Display for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.asset_a.symbol, self.asset_b.symbol)
    }
}

// ---------------------------------------------------------------------------
// Priced order (Quoter output)
// ---------------------------------------------------------------------------

/// One hop of a quoted route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStep {
    pub amm_key: String,
    pub label: String,
    pub input_mint: String,
    pub output_mint: String,
    pub in_amount: u64,
    pub out_amount: u64,
    pub fee_amount: u64,
    pub percent: u8,
}

/// A ready-to-sign swap quote for one input/output/amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedOrder {
    /// Correlation id assigned when the quote was obtained.
    pub quote_id: String,
    pub input_mint: String,
    pub output_mint: String,
    pub in_amount: u64,
    pub out_amount: u64,
    /// Minimum output after slippage.
    pub other_amount_threshold: u64,
    pub slippage_bps: u16,
    pub route_plan: Vec<RouteStep>,
    pub context_slot: Option<u64>,
    /// The venue's quote as returned, echoed back when building the swap.
    pub raw: serde_json::Value,
}

impl PricedOrder {
    /// Check the order carries everything needed to submit it.
    pub fn validate(&self) -> Result<(), BotError> {
        let mut missing = Vec::new();
        if self.quote_id.trim().is_empty() {
            missing.push("quote_id");
        }
        if self.input_mint.is_empty() {
            missing.push("input_mint");
        }
        if self.output_mint.is_empty() {
            missing.push("output_mint");
        }
        if self.in_amount == 0 {
            missing.push("in_amount");
        }
        if self.route_plan.is_empty() {
            missing.push("route_plan");
        }
        if self.raw.is_null() {
            missing.push("raw");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(BotError::Validation(format!(
                "priced order {} missing {}",
                self.quote_id,
                missing.join(", ")
            )))
        }
    }
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// Which generator produced a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    TwoLegSpread,
    StableDelta,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::TwoLegSpread => write!(f, "two_leg_spread"),
            StrategyKind::StableDelta => write!(f, "stable_delta"),
        }
    }
}

/// An immutable candidate trade: one atomic swap plus its expected profit.
///
/// Plans are only built through [`Plan::new`], which takes the asset and
/// amount fields from the priced order so the two can never disagree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    kind: StrategyKind,
    input_asset: String,
    output_asset: String,
    input_amount: u64,
    order: PricedOrder,
    notional_usd: Decimal,
    expected_pnl_usd: Decimal,
    max_slippage_bps: u16,
    notes: Option<String>,
}

impl Plan {
    pub fn new(
        kind: StrategyKind,
        order: PricedOrder,
        notional_usd: Decimal,
        expected_pnl_usd: Decimal,
        max_slippage_bps: u16,
        notes: Option<String>,
    ) -> Self {
        Self {
            kind,
            input_asset: order.input_mint.clone(),
            output_asset: order.output_mint.clone(),
            input_amount: order.in_amount,
            order,
            notional_usd,
            expected_pnl_usd,
            max_slippage_bps,
            notes,
        }
    }

    /// Correlation id of the underlying quote.
    pub fn id(&self) -> &str {
        &self.order.quote_id
    }

    pub fn kind(&self) -> StrategyKind {
        self.kind
    }

    pub fn input_asset(&self) -> &str {
        &self.input_asset
    }

    pub fn output_asset(&self) -> &str {
        &self.output_asset
    }

    pub fn input_amount(&self) -> u64 {
        self.input_amount
    }

    pub fn order(&self) -> &PricedOrder {
        &self.order
    }

    pub fn notional_usd(&self) -> Decimal {
        self.notional_usd
    }

    pub fn expected_pnl_usd(&self) -> Decimal {
        self.expected_pnl_usd
    }

    pub fn max_slippage_bps(&self) -> u16 {
        self.max_slippage_bps
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    fn symbol_for(mint: &str) -> String {
        Asset::by_mint(mint)
            .map(|a| a.symbol.to_string())
            .unwrap_or_else(|| mint.chars().take(6).collect())
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}->{} notional=${:.2} pnl=${:.4} slip={}bps",
            self.kind,
            Self::symbol_for(&self.input_asset),
            Self::symbol_for(&self.output_asset),
            self.notional_usd,
            self.expected_pnl_usd,
            self.max_slippage_bps,
        )
    }
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// Fee and slippage parameters handed to the signer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeParams {
    pub priority_fee_lamports: u64,
    pub slippage_bps: u16,
}

/// A signed transaction ready for either submission path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedSwap {
    pub quote_id: String,
    /// Base64 wire transaction.
    pub payload: String,
    /// Base58 first signature (the transaction id).
    pub signature: String,
    pub last_valid_block_height: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionPath {
    BundleRelay,
    DirectBroadcast,
}

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub signature: String,
    pub path: SubmissionPath,
    pub rpc_url: Option<String>,
}

/// Relay acknowledgement for a submitted bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleAck {
    pub bundle_id: String,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for SWAPSCAN.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    /// Malformed or incomplete plan/response. Local, dropped for this cycle.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Network, timeout or non-success answer from an external service.
    #[error("Upstream error ({service}): {message}")]
    Upstream { service: String, message: String },

    #[error("No executable route for {input} -> {output}")]
    NoRoute { input: String, output: String },

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BotError {
    pub fn upstream(service: &str, message: impl Into<String>) -> Self {
        BotError::Upstream {
            service: service.to_string(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

impl PricedOrder {
    /// Helper to build a sample order with sensible defaults.
    #[cfg(test)]
    pub fn sample(input: Asset, output: Asset, in_amount: u64, out_amount: u64) -> Self {
        PricedOrder {
            quote_id: uuid::Uuid::new_v4().to_string(),
            input_mint: input.mint.to_string(),
            output_mint: output.mint.to_string(),
            in_amount,
            out_amount,
            other_amount_threshold: out_amount,
            slippage_bps: 50,
            route_plan: vec![RouteStep {
                amm_key: "amm-test".to_string(),
                label: "Whirlpool".to_string(),
                input_mint: input.mint.to_string(),
                output_mint: output.mint.to_string(),
                in_amount,
                out_amount,
                fee_amount: 0,
                percent: 100,
            }],
            context_slot: Some(1),
            raw: serde_json::json!({ "inAmount": in_amount.to_string() }),
        }
    }
}

impl Plan {
    /// Helper to build a sample plan with a given expected PnL.
    #[cfg(test)]
    pub fn sample(expected_pnl_usd: Decimal) -> Self {
        Plan::new(
            StrategyKind::TwoLegSpread,
            PricedOrder::sample(USDC, SOL, 50_000_000, 330_000_000),
            Decimal::from(50),
            expected_pnl_usd,
            60,
            None,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
