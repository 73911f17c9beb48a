//! Two-leg spread: stable -> native at a fixed notional.
//!
//! Quotes each configured stable/native pair once per cycle and emits one
//! plan per routable pair, profitable or not.

use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
use tracing::debug;

use super::pricer::PlanPricer;
use super::Strategy;
use crate::types::{Asset, Plan, StrategyKind, SOL, USDC, USDT};

pub struct TwoLegSpread {
    pricer: PlanPricer,
    pairs: Vec<(Asset, Asset)>,
}

impl TwoLegSpread {
    pub fn new(pricer: PlanPricer) -> Self {
        Self::with_pairs(pricer, vec![(USDC, SOL), (USDT, SOL)])
    }

    pub fn with_pairs(pricer: PlanPricer, pairs: Vec<(Asset, Asset)>) -> Self {
        Self { pricer, pairs }
    }

    pub fn pairs(&self) -> &[(Asset, Asset)] {
        &self.pairs
    }
}

#[async_trait]
impl Strategy for TwoLegSpread {
    async fn propose_plans(&self) -> Result<Vec<Plan>> {
        let quotes = self.pairs.iter().map(|(input, output)| {
            self.pricer
                .price(StrategyKind::TwoLegSpread, *input, *output)
        });

        let plans: Vec<Plan> = join_all(quotes).await.into_iter().flatten().collect();

        debug!(
            pairs = self.pairs.len(),
            plans = plans.len(),
            notional = %self.pricer.notional_usd(),
            "Two-leg spread scanned"
        );
        Ok(plans)
    }

    fn name(&self) -> String {
        StrategyKind::TwoLegSpread.to_string()
    }
}
