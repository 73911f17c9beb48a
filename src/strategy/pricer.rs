//! Turns one (input, output) request into a priced [`Plan`].
//!
//! Shared by the strategies so the quote call, the boundary checks and the
//! PnL formula live in one place.

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, warn};

use super::pnl::PnlModel;
use crate::config::AppConfig;
use crate::types::{Asset, BotError, Plan, PricedOrder, StrategyKind};
use crate::venue::Quoter;

#[derive(Clone)]
pub struct PlanPricer {
    quoter: Arc<dyn Quoter>,
    pnl: PnlModel,
    notional_usd: Decimal,
    route_slippage_bps: u16,
    plan_slippage_bps: u16,
}

impl PlanPricer {
    pub fn new(
        quoter: Arc<dyn Quoter>,
        pnl: PnlModel,
        notional_usd: Decimal,
        route_slippage_bps: u16,
        plan_slippage_bps: u16,
    ) -> Self {
        Self {
            quoter,
            pnl,
            notional_usd,
            route_slippage_bps,
            plan_slippage_bps,
        }
    }

    pub fn from_config(quoter: Arc<dyn Quoter>, config: &AppConfig) -> Self {
        Self::new(
            quoter,
            PnlModel::from_config(&config.trading),
            config.effective_notional_usd(),
            config.trading.max_route_slippage_bps,
            config.plan_slippage_bps(),
        )
    }

    pub fn notional_usd(&self) -> Decimal {
        self.notional_usd
    }

    /// Quote `input -> output` at the configured notional.
    ///
    /// Returns `None` when there is no route, the quote call fails, or the
    /// answer does not match the request. All three are logged and skipped.
    pub async fn price(&self, kind: StrategyKind, input: Asset, output: Asset) -> Option<Plan> {
        match self.try_price(kind, input, output).await {
            Ok(plan) => Some(plan),
            Err(e @ BotError::NoRoute { .. }) => {
                debug!(reason = %e, "Skipping pair");
                None
            }
            Err(e) => {
                warn!(input = %input, output = %output, error = %e, "Skipping pair");
                None
            }
        }
    }

    /// Like [`price`](Self::price), but says why a pair produced no plan.
    pub async fn try_price(
        &self,
        kind: StrategyKind,
        input: Asset,
        output: Asset,
    ) -> Result<Plan, BotError> {
        let amount = self
            .input_amount(&input)
            .filter(|amount| *amount > 0)
            .ok_or_else(|| {
                BotError::Validation(format!(
                    "notional ${} is not quotable in {input}",
                    self.notional_usd
                ))
            })?;

        let order = self
            .quoter
            .get_priced_order(input.mint, output.mint, amount, self.route_slippage_bps)
            .await
            .map_err(|e| BotError::upstream("quote", format!("{e:#}")))?
            .ok_or_else(|| BotError::NoRoute {
                input: input.symbol.to_string(),
                output: output.symbol.to_string(),
            })?;

        check_matches_request(&order, &input, &output)?;

        let input_usd = self.pnl.usd_value(&input, order.in_amount);
        let output_usd = self.pnl.usd_value(&output, order.out_amount);
        let expected_pnl = self.pnl.expected_pnl(input_usd, output_usd);

        let notes = format!(
            "{}->{} in=${:.4} out=${:.4}",
            input.symbol, output.symbol, input_usd, output_usd
        );

        Ok(Plan::new(
            kind,
            order,
            self.notional_usd,
            expected_pnl,
            self.plan_slippage_bps,
            Some(notes),
        ))
    }

    /// Raw input amount worth the notional at the reference price.
    fn input_amount(&self, input: &Asset) -> Option<u64> {
        let price = self.pnl.usd_price(input);
        if price <= Decimal::ZERO {
            return None;
        }
        input.to_base_units(self.notional_usd / price)
    }
}

fn check_matches_request(order: &PricedOrder, input: &Asset, output: &Asset) -> Result<(), BotError> {
    if order.input_mint != input.mint || order.output_mint != output.mint {
        return Err(BotError::Validation(format!(
            "quote {} is for {} -> {}, requested {} -> {}",
            order.quote_id, order.input_mint, order.output_mint, input.mint, output.mint
        )));
    }
    Ok(())
}
