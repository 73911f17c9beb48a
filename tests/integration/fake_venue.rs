//! In-memory venue for integration testing.
//!
//! Deterministic implementations of the venue capability traits and the
//! endpoint health check. Every fake records what it was asked to do so
//! tests can assert on call counts and arguments, and each can be told to
//! fail.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use swapscan::rpc::HealthCheck;
use swapscan::types::*;
use swapscan::venue::{BundleRelay, Discovery, Quoter, SwapSubmitter};

// ---------------------------------------------------------------------------
// Quoter
// ---------------------------------------------------------------------------

/// Quotes from a fixed table of `(input mint, output mint) -> out_amount`.
/// Pairs not in the table have no route.
#[derive(Clone, Default)]
pub struct FakeQuoter {
    table: HashMap<(String, String), u64>,
    pub calls: Arc<Mutex<Vec<(String, String, u64)>>>,
}

impl FakeQuoter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quote(mut self, input: Asset, output: Asset, out_amount: u64) -> Self {
        self.table
            .insert((input.mint.to_string(), output.mint.to_string()), out_amount);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Quoter for FakeQuoter {
    async fn get_priced_order(
        &self,
        input_mint: &str,
        output_mint: &str,
        amount: u64,
        slippage_bps: u16,
    ) -> Result<Option<PricedOrder>> {
        self.calls
            .lock()
            .unwrap()
            .push((input_mint.to_string(), output_mint.to_string(), amount));

        let Some(out_amount) = self
            .table
            .get(&(input_mint.to_string(), output_mint.to_string()))
            .copied()
        else {
            return Ok(None);
        };

        Ok(Some(PricedOrder {
            quote_id: uuid::Uuid::new_v4().to_string(),
            input_mint: input_mint.to_string(),
            output_mint: output_mint.to_string(),
            in_amount: amount,
            out_amount,
            other_amount_threshold: out_amount,
            slippage_bps,
            route_plan: vec![RouteStep {
                amm_key: "fake-amm".to_string(),
                label: "FakeSwap".to_string(),
                input_mint: input_mint.to_string(),
                output_mint: output_mint.to_string(),
                in_amount: amount,
                out_amount,
                fee_amount: 0,
                percent: 100,
            }],
            context_slot: Some(42),
            raw: json!({ "inAmount": amount.to_string(), "outAmount": out_amount.to_string() }),
        }))
    }
}

// ---------------------------------------------------------------------------
// Submitter
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct FakeSubmitter {
    pub signed: Arc<Mutex<Vec<String>>>,
    pub broadcasts: Arc<Mutex<Vec<String>>>,
    /// If set, `sign` fails with this message.
    pub sign_error: Arc<Mutex<Option<String>>>,
    /// If set, `broadcast` fails with this message.
    pub broadcast_error: Arc<Mutex<Option<String>>>,
}

impl FakeSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sign_count(&self) -> usize {
        self.signed.lock().unwrap().len()
    }

    pub fn broadcast_urls(&self) -> Vec<String> {
        self.broadcasts.lock().unwrap().clone()
    }

    pub fn fail_broadcast(&self, msg: &str) {
        *self.broadcast_error.lock().unwrap() = Some(msg.to_string());
    }
}

#[async_trait]
impl SwapSubmitter for FakeSubmitter {
    async fn sign(&self, order: &PricedOrder, fees: &FeeParams) -> Result<SignedSwap> {
        if let Some(msg) = self.sign_error.lock().unwrap().clone() {
            return Err(anyhow!(msg));
        }
        if order.slippage_bps > fees.slippage_bps {
            return Err(anyhow!("slippage above tolerance"));
        }
        self.signed.lock().unwrap().push(order.quote_id.clone());
        Ok(SignedSwap {
            quote_id: order.quote_id.clone(),
            payload: format!("signed-{}", order.quote_id),
            signature: format!("sig-{}", order.quote_id),
            last_valid_block_height: Some(100),
        })
    }

    async fn broadcast(&self, rpc_url: &str, signed: &SignedSwap) -> Result<ExecutionResult> {
        self.broadcasts.lock().unwrap().push(rpc_url.to_string());
        if let Some(msg) = self.broadcast_error.lock().unwrap().clone() {
            return Err(anyhow!(msg));
        }
        Ok(ExecutionResult {
            signature: signed.signature.clone(),
            path: SubmissionPath::DirectBroadcast,
            rpc_url: Some(rpc_url.to_string()),
        })
    }

    fn identity(&self) -> String {
        "FakeWa11et1111111111111111111111111111111111".to_string()
    }
}

// ---------------------------------------------------------------------------
// Bundle relay
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct FakeRelay {
    pub fail: bool,
    pub bundles: Arc<Mutex<Vec<Vec<String>>>>,
}

impl FakeRelay {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn bundle_count(&self) -> usize {
        self.bundles.lock().unwrap().len()
    }
}

#[async_trait]
impl BundleRelay for FakeRelay {
    async fn submit_bundle(&self, signed_payloads: &[String]) -> Result<BundleAck> {
        self.bundles.lock().unwrap().push(signed_payloads.to_vec());
        if self.fail {
            return Err(anyhow!("relay unavailable"));
        }
        Ok(BundleAck {
            bundle_id: format!("bundle-{}", self.bundle_count()),
        })
    }

    fn name(&self) -> String {
        "fake-relay".to_string()
    }
}

// ---------------------------------------------------------------------------
// Endpoint health
// ---------------------------------------------------------------------------

/// Healthy iff the url is in the set.
#[derive(Clone, Default)]
pub struct FakeHealth {
    pub healthy: Arc<Mutex<HashSet<String>>>,
}

impl FakeHealth {
    pub fn healthy(urls: &[&str]) -> Self {
        Self {
            healthy: Arc::new(Mutex::new(urls.iter().map(|u| u.to_string()).collect())),
        }
    }
}

#[async_trait]
impl HealthCheck for FakeHealth {
    async fn check(&self, url: &str) -> Result<()> {
        if self.healthy.lock().unwrap().contains(url) {
            Ok(())
        } else {
            Err(anyhow!("getHealth: node is behind"))
        }
    }
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

pub struct StaticDiscovery {
    pairs: Vec<TokenPair>,
}

impl StaticDiscovery {
    pub fn new(pairs: &[(Asset, Asset)]) -> Self {
        let info = |a: &Asset| TokenInfo {
            symbol: a.symbol.to_string(),
            mint: a.mint.to_string(),
            decimals: a.decimals,
        };
        Self {
            pairs: pairs
                .iter()
                .map(|(a, b)| TokenPair {
                    asset_a: info(a),
                    asset_b: info(b),
                })
                .collect(),
        }
    }
}

#[async_trait]
impl Discovery for StaticDiscovery {
    async fn snapshot(&self) -> Vec<TokenPair> {
        self.pairs.clone()
    }

    async fn refresh(&self) -> Result<usize> {
        Ok(self.pairs.len())
    }
}
