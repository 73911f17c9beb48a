//! Plan generators and the risk gate.
//!
//! Every strategy proposes zero or more [`Plan`]s per cycle. The
//! [`StrategySet`] runs them concurrently and fans the results back in.
//! Profitability filtering is not done here; the supervisor does it centrally.

pub mod pnl;
pub mod pricer;
pub mod risk;
pub mod stable_delta;
pub mod two_leg_spread;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::types::Plan;

pub use pnl::PnlModel;
pub use pricer::PlanPricer;
pub use risk::LossGuard;
pub use stable_delta::StableDelta;
pub use two_leg_spread::TwoLegSpread;

/// A plan generator.
///
/// Must not mutate any book-keeping state. Returning an empty list is normal.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Strategy: Send + Sync {
    async fn propose_plans(&self) -> Result<Vec<Plan>>;

    fn name(&self) -> String;
}

// ---------------------------------------------------------------------------
// Strategy set
// ---------------------------------------------------------------------------

/// A fixed collection of strategies evaluated together each cycle.
#[derive(Clone, Default)]
pub struct StrategySet {
    strategies: Vec<Arc<dyn Strategy>>,
}

impl StrategySet {
    pub fn new(strategies: Vec<Arc<dyn Strategy>>) -> Self {
        Self { strategies }
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run every strategy concurrently and concatenate the plans in
    /// strategy order, then emission order.
    ///
    /// A strategy returning `Err` contributes nothing; the error is logged.
    /// A strategy task that panics fails the whole scan.
    pub async fn scan(&self) -> Result<Vec<Plan>> {
        let handles: Vec<_> = self
            .strategies
            .iter()
            .map(|strategy| {
                let strategy = Arc::clone(strategy);
                tokio::spawn(async move {
                    let name = strategy.name();
                    (name, strategy.propose_plans().await)
                })
            })
            .collect();

        let mut plans = Vec::new();
        for joined in futures::future::join_all(handles).await {
            match joined {
                Ok((name, Ok(proposed))) => {
                    debug!(strategy = %name, plans = proposed.len(), "Strategy finished");
                    plans.extend(proposed);
                }
                Ok((name, Err(e))) => {
                    warn!(strategy = %name, error = %e, "Strategy failed, skipping its plans");
                }
                Err(e) => {
                    error!(error = %e, "Strategy task aborted");
                    return Err(anyhow!("strategy task aborted: {e}"));
                }
            }
        }

        Ok(plans)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
