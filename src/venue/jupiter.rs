//! Jupiter aggregator integration.
//!
//! Quotes swaps (`GET /quote`) and builds unsigned swap transactions
//! (`POST /swap`) for a previously obtained quote.
//!
//! API docs: https://station.jup.ag/docs/apis/swap-api
//! Auth: none for the public endpoints.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::Quoter;
use crate::types::{BotError, FeeParams, PricedOrder, RouteStep};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const SERVICE: &str = "jupiter";

const QUOTE_TIMEOUT: Duration = Duration::from_secs(10);
const SWAP_TIMEOUT: Duration = Duration::from_secs(15);

/// Error codes meaning "no executable route" rather than a failure.
const NO_ROUTE_CODES: [&str; 3] = [
    "COULD_NOT_FIND_ANY_ROUTE",
    "NO_ROUTES_FOUND",
    "TOKEN_NOT_TRADABLE",
];

// ---------------------------------------------------------------------------
// API response types (Jupiter JSON -> Rust)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResponse {
    input_mint: String,
    in_amount: String,
    output_mint: String,
    out_amount: String,
    #[serde(default)]
    other_amount_threshold: Option<String>,
    #[serde(default)]
    slippage_bps: u16,
    #[serde(default)]
    route_plan: Vec<RoutePlanEntry>,
    #[serde(default)]
    context_slot: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoutePlanEntry {
    swap_info: SwapInfo,
    #[serde(default)]
    percent: u8,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapInfo {
    amm_key: String,
    #[serde(default)]
    label: String,
    input_mint: String,
    output_mint: String,
    in_amount: String,
    out_amount: String,
    #[serde(default)]
    fee_amount: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapResponse {
    swap_transaction: String,
    #[serde(default)]
    last_valid_block_height: Option<u64>,
}

/// An unsigned swap transaction as built by Jupiter.
#[derive(Debug, Clone)]
pub struct UnsignedSwap {
    /// Base64 wire transaction with empty signature slots.
    pub transaction: String,
    pub last_valid_block_height: Option<u64>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct JupiterClient {
    http: Client,
    base_url: String,
}

impl JupiterClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .user_agent("SWAPSCAN/0.1.0")
            .build()
            .context("Failed to build HTTP client for Jupiter")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Build the unsigned swap transaction for a quote.
    pub async fn build_swap(
        &self,
        order: &PricedOrder,
        user_pubkey: &str,
        fees: &FeeParams,
    ) -> Result<UnsignedSwap> {
        let payload = json!({
            "quoteResponse": order.raw,
            "userPublicKey": user_pubkey,
            "wrapAndUnwrapSol": true,
            "dynamicSlippage": false,
            "prioritizationFeeLamports": fees.priority_fee_lamports,
        });

        let resp = self
            .http
            .post(format!("{}/swap", self.base_url))
            .timeout(SWAP_TIMEOUT)
            .json(&payload)
            .send()
            .await
            .context("Jupiter swap request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(BotError::upstream(SERVICE, format!("swap HTTP {status}: {body}")).into());
        }

        let swap: SwapResponse = resp
            .json()
            .await
            .context("Failed to parse Jupiter swap response")?;

        if swap.swap_transaction.is_empty() {
            return Err(BotError::Validation(format!(
                "Jupiter returned an empty swap transaction for quote {}",
                order.quote_id
            ))
            .into());
        }

        Ok(UnsignedSwap {
            transaction: swap.swap_transaction,
            last_valid_block_height: swap.last_valid_block_height,
        })
    }
}

#[async_trait]
impl Quoter for JupiterClient {
    async fn get_priced_order(
        &self,
        input_mint: &str,
        output_mint: &str,
        amount: u64,
        slippage_bps: u16,
    ) -> Result<Option<PricedOrder>> {
        let url = format!(
            "{}/quote?inputMint={}&outputMint={}&amount={}&slippageBps={}&onlyDirectRoutes=false",
            self.base_url,
            urlencoding::encode(input_mint),
            urlencoding::encode(output_mint),
            amount,
            slippage_bps,
        );

        debug!(url = %url, "Fetching Jupiter quote");

        let resp = self
            .http
            .get(&url)
            .timeout(QUOTE_TIMEOUT)
            .send()
            .await
            .context("Jupiter quote request failed")?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .context("Failed to read Jupiter quote response")?;

        let order = quote_from_reply(status, &text)?;
        if order.is_none() {
            debug!(input_mint, output_mint, amount, "No route");
        }
        Ok(order)
    }
}

/// Classify a quote reply by status before looking at the body, so error
/// pages from proxies surface as upstream failures.
fn quote_from_reply(status: StatusCode, text: &str) -> Result<Option<PricedOrder>> {
    if status.is_success() {
        let body: Value =
            serde_json::from_str(text).context("Failed to parse Jupiter quote response")?;
        return parse_quote(body);
    }

    if status == StatusCode::BAD_REQUEST {
        if let Ok(body) = serde_json::from_str::<Value>(text) {
            if is_no_route(&body) {
                return Ok(None);
            }
        }
    }

    Err(BotError::upstream(SERVICE, format!("quote HTTP {status}: {}", snippet(text))).into())
}

/// First line of an error body, bounded.
fn snippet(text: &str) -> String {
    text.lines().next().unwrap_or_default().chars().take(200).collect()
}

fn is_no_route(body: &Value) -> bool {
    body.get("errorCode")
        .and_then(Value::as_str)
        .map(|code| NO_ROUTE_CODES.contains(&code))
        .unwrap_or(false)
}

fn parse_amount(field: &str, raw: &str) -> Result<u64> {
    raw.parse::<u64>()
        .map_err(|_| BotError::Validation(format!("{field} is not an integer amount: {raw:?}")).into())
}

/// Map a quote body to a typed order. An empty route plan means no route.
fn parse_quote(body: Value) -> Result<Option<PricedOrder>> {
    let quote: QuoteResponse = serde_json::from_value(body.clone())
        .map_err(|e| BotError::Validation(format!("malformed Jupiter quote: {e}")))?;

    if quote.route_plan.is_empty() {
        return Ok(None);
    }

    let out_amount = parse_amount("outAmount", &quote.out_amount)?;
    let other_amount_threshold = match quote.other_amount_threshold.as_deref() {
        Some(raw) => parse_amount("otherAmountThreshold", raw)?,
        None => out_amount,
    };

    let route_plan = quote
        .route_plan
        .iter()
        .map(|entry| -> Result<RouteStep> {
            let info = &entry.swap_info;
            Ok(RouteStep {
                amm_key: info.amm_key.clone(),
                label: info.label.clone(),
                input_mint: info.input_mint.clone(),
                output_mint: info.output_mint.clone(),
                in_amount: parse_amount("swapInfo.inAmount", &info.in_amount)?,
                out_amount: parse_amount("swapInfo.outAmount", &info.out_amount)?,
                fee_amount: match info.fee_amount.as_deref() {
                    Some(raw) if !raw.is_empty() => parse_amount("swapInfo.feeAmount", raw)?,
                    _ => 0,
                },
                percent: entry.percent,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Some(PricedOrder {
        quote_id: uuid::Uuid::new_v4().to_string(),
        input_mint: quote.input_mint,
        output_mint: quote.output_mint,
        in_amount: parse_amount("inAmount", &quote.in_amount)?,
        out_amount,
        other_amount_threshold,
        slippage_bps: quote.slippage_bps,
        route_plan,
        context_slot: quote.context_slot,
        raw: body,
    }))
}
