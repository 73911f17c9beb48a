//! Plan executor.
//!
//! Turns one ranked plan into a submitted transaction. The order of checks
//! is fixed: simulation mode, then plan validation, then signing, then
//! submission (bundle relay first, direct broadcast as the fallback).
//! Every failure ends as a `false` return; nothing propagates to the loop.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::rpc::EndpointPool;
use crate::types::{ExecutionResult, FeeParams, Plan, SubmissionPath};
use crate::venue::{BundleRelay, SwapSubmitter};

/// Anything that can attempt a plan. `true` means it was submitted.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlanExecutor: Send + Sync {
    async fn try_execute(&self, plan: &Plan) -> bool;
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

pub struct Executor {
    pool: Arc<EndpointPool>,
    submitter: Option<Arc<dyn SwapSubmitter>>,
    relay: Option<Arc<dyn BundleRelay>>,
    simulated: bool,
    priority_fee_lamports: u64,
}

impl Executor {
    pub fn new(pool: Arc<EndpointPool>, simulated: bool, priority_fee_lamports: u64) -> Self {
        Self {
            pool,
            submitter: None,
            relay: None,
            simulated,
            priority_fee_lamports,
        }
    }

    pub fn with_submitter(mut self, submitter: Arc<dyn SwapSubmitter>) -> Self {
        self.submitter = Some(submitter);
        self
    }

    pub fn with_relay(mut self, relay: Arc<dyn BundleRelay>) -> Self {
        self.relay = Some(relay);
        self
    }

    pub fn is_simulated(&self) -> bool {
        self.simulated
    }

    /// Sign once, then relay or broadcast the same signed payload.
    async fn submit(&self, plan: &Plan, submitter: &dyn SwapSubmitter) -> Result<ExecutionResult> {
        let fees = FeeParams {
            priority_fee_lamports: self.priority_fee_lamports,
            slippage_bps: plan.max_slippage_bps(),
        };

        let signed = submitter
            .sign(plan.order(), &fees)
            .await
            .with_context(|| format!("Signing failed for plan {}", plan.id()))?;

        if let Some(relay) = &self.relay {
            match relay.submit_bundle(std::slice::from_ref(&signed.payload)).await {
                Ok(ack) => {
                    info!(
                        plan = %plan.id(),
                        relay = %relay.name(),
                        bundle_id = %ack.bundle_id,
                        "Plan submitted via bundle relay"
                    );
                    return Ok(ExecutionResult {
                        signature: signed.signature,
                        path: SubmissionPath::BundleRelay,
                        rpc_url: None,
                    });
                }
                Err(e) => {
                    warn!(
                        plan = %plan.id(),
                        relay = %relay.name(),
                        error = %e,
                        "Bundle relay failed, falling back to direct broadcast"
                    );
                }
            }
        }

        let rpc_url = self.pool.best().await;
        submitter
            .broadcast(&rpc_url, &signed)
            .await
            .with_context(|| format!("Broadcast via {rpc_url} failed"))
    }
}

#[async_trait]
impl PlanExecutor for Executor {
    async fn try_execute(&self, plan: &Plan) -> bool {
        if self.simulated {
            info!(plan = %plan, "[DRY RUN] Would execute plan");
            return false;
        }

        if let Err(e) = plan.order().validate() {
            warn!(plan = %plan.id(), error = %e, "Plan rejected before submission");
            return false;
        }

        let Some(submitter) = &self.submitter else {
            warn!(plan = %plan.id(), "No signer configured, cannot execute");
            return false;
        };

        let signer = submitter.identity();
        debug!(plan = %plan.id(), signer = %signer, "Submitting plan");

        match self.submit(plan, submitter.as_ref()).await {
            Ok(result) => {
                info!(
                    plan = %plan,
                    signer = %signer,
                    signature = %result.signature,
                    path = ?result.path,
                    rpc = result.rpc_url.as_deref().unwrap_or("-"),
                    "Plan executed"
                );
                true
            }
            Err(e) => {
                warn!(
                    plan = %plan.id(),
                    signer = %signer,
                    error = format!("{e:#}"),
                    "Plan execution failed"
                );
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
