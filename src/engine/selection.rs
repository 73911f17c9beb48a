//! Ranking and the filter/execute pass.

use rust_decimal::Decimal;
use tracing::{debug, info};

use super::executor::PlanExecutor;
use crate::types::Plan;

/// What the filter/execute pass did with a ranked list.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Plans at or above the minimum profit.
    pub viable: usize,
    /// `try_execute` calls made.
    pub attempts: usize,
    /// The plan that went through, if any.
    pub executed: Option<Plan>,
}

/// Sort descending by expected PnL. The sort is stable, so ties keep
/// strategy-then-emission order.
pub fn rank_plans(mut plans: Vec<Plan>) -> Vec<Plan> {
    plans.sort_by(|a, b| b.expected_pnl_usd().cmp(&a.expected_pnl_usd()));
    plans
}

/// Walk the ranked list, skip plans below `min_profit_usd`, and stop at the
/// first successful execution.
pub async fn execute_first_viable(
    ranked: &[Plan],
    min_profit_usd: Decimal,
    executor: &dyn PlanExecutor,
) -> Selection {
    let mut selection = Selection::default();

    for plan in ranked {
        if plan.expected_pnl_usd() < min_profit_usd {
            debug!(plan = %plan, min_profit = %min_profit_usd, "Below minimum profit, skipping");
            continue;
        }
        selection.viable += 1;

        if selection.executed.is_some() {
            continue;
        }

        selection.attempts += 1;
        if executor.try_execute(plan).await {
            info!(plan = %plan, attempts = selection.attempts, "Plan executed this cycle");
            selection.executed = Some(plan.clone());
        }
    }

    selection
}
