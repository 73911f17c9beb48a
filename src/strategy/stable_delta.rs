//! Stable delta: quote both directions of every discovered stable/stable pair.
//!
//! A depeg shows up as one direction returning more than it costs.

use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use tracing::debug;

use super::pricer::PlanPricer;
use super::Strategy;
use crate::types::{Asset, Plan, StrategyKind, TokenPair};
use crate::venue::Discovery;

pub struct StableDelta {
    discovery: Arc<dyn Discovery>,
    pricer: PlanPricer,
}

impl StableDelta {
    pub fn new(discovery: Arc<dyn Discovery>, pricer: PlanPricer) -> Self {
        Self { discovery, pricer }
    }

    /// Known stable assets on both sides, or `None`.
    fn stable_pair(pair: &TokenPair) -> Option<(Asset, Asset)> {
        let a = Asset::by_mint(&pair.asset_a.mint).filter(|a| a.stable)?;
        let b = Asset::by_mint(&pair.asset_b.mint).filter(|b| b.stable)?;
        (a != b).then_some((a, b))
    }
}

#[async_trait]
impl Strategy for StableDelta {
    async fn propose_plans(&self) -> Result<Vec<Plan>> {
        let pairs = self.discovery.snapshot().await;
        let legs: Vec<(Asset, Asset)> = pairs
            .iter()
            .filter_map(Self::stable_pair)
            .flat_map(|(a, b)| [(a, b), (b, a)])
            .collect();

        let quotes = legs
            .iter()
            .map(|(input, output)| self.pricer.price(StrategyKind::StableDelta, *input, *output));
        let plans: Vec<Plan> = join_all(quotes).await.into_iter().flatten().collect();

        debug!(
            discovered = pairs.len(),
            legs = legs.len(),
            plans = plans.len(),
            "Stable delta scanned"
        );
        Ok(plans)
    }

    fn name(&self) -> String {
        StrategyKind::StableDelta.to_string()
    }
}
