//! Full scan -> rank -> risk-gate -> execute cycles against the fake venue.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;

use swapscan::api::StatusBoard;
use swapscan::engine::{Executor, LoopPhase, StepOutcome, Supervisor, SupervisorConfig};
use swapscan::rpc::EndpointPool;
use swapscan::strategy::{LossGuard, PlanPricer, PnlModel, StableDelta, Strategy, StrategySet, TwoLegSpread};
use swapscan::types::{SOL, USDC, USDT};

use crate::fake_venue::{FakeHealth, FakeQuoter, FakeRelay, FakeSubmitter, StaticDiscovery};

const RPC_DOWN: &str = "https://rpc-down.example.com";
const RPC_UP: &str = "https://rpc-up.example.com";

/// SOL at $150, 30 bps taker fee, 10_000 lamport priority fee, $50 notional.
///
/// USDC->SOL returns 0.34 SOL ($51.00): pnl 0.8485
/// USDT->SOL returns 0.33 SOL ($49.50): pnl -0.6515
/// USDC->USDT returns 50.4 USDT:        pnl 0.2485
fn market() -> FakeQuoter {
    FakeQuoter::new()
        .with_quote(USDC, SOL, 340_000_000)
        .with_quote(USDT, SOL, 330_000_000)
        .with_quote(USDC, USDT, 50_400_000)
}

fn pricer(quoter: &FakeQuoter) -> PlanPricer {
    PlanPricer::new(
        Arc::new(quoter.clone()),
        PnlModel::new(30, 10_000, dec!(150)),
        dec!(50),
        50,
        60,
    )
}

fn strategies(quoter: &FakeQuoter) -> StrategySet {
    let strategies: Vec<Arc<dyn Strategy>> = vec![
        Arc::new(TwoLegSpread::new(pricer(quoter))),
        Arc::new(StableDelta::new(
            Arc::new(StaticDiscovery::new(&[(USDC, USDT)])),
            pricer(quoter),
        )),
    ];
    StrategySet::new(strategies)
}

fn fast_config(min_profit_usd: Decimal) -> SupervisorConfig {
    SupervisorConfig {
        scan_interval: Duration::from_millis(1),
        floor_sleep: Duration::from_millis(1),
        pause_after_fails: 5,
        recovery_delay: Duration::from_millis(1),
        guard_cooldown: Duration::from_millis(1),
        min_profit_usd,
    }
}

async fn probed_pool() -> Arc<EndpointPool> {
    let pool = EndpointPool::new(
        &[RPC_DOWN.to_string(), RPC_UP.to_string()],
        Arc::new(FakeHealth::healthy(&[RPC_UP])),
        Duration::from_millis(200),
        0.0,
    )
    .unwrap();
    pool.probe().await;
    Arc::new(pool)
}

fn completed(outcome: StepOutcome) -> swapscan::engine::CycleReport {
    match outcome {
        StepOutcome::Completed(report) => report,
        other => panic!("expected a completed cycle, got {other:?}"),
    }
}

#[tokio::test]
async fn test_relay_failure_falls_back_to_best_endpoint() {
    let quoter = market();
    let submitter = FakeSubmitter::new();
    let relay = FakeRelay::failing();

    let executor = Executor::new(probed_pool().await, false, 10_000)
        .with_submitter(Arc::new(submitter.clone()))
        .with_relay(Arc::new(relay.clone()));

    let mut supervisor = Supervisor::new(
        fast_config(dec!(0.10)),
        strategies(&quoter),
        Arc::new(executor),
        LossGuard::new(dec!(25)),
    );

    let report = completed(supervisor.step().await);

    // USDC->SOL, USDT->SOL, USDC->USDT; USDT->USDC has no route.
    assert_eq!(report.plans_proposed, 3);
    assert_eq!(report.plans_viable, 2);
    assert_eq!(report.attempts, 1);
    let executed = report.executed.unwrap();
    assert!(executed.contains("USDC->SOL"), "{executed}");

    assert_eq!(submitter.sign_count(), 1);
    assert_eq!(relay.bundle_count(), 1);
    assert_eq!(submitter.broadcast_urls(), vec![RPC_UP.to_string()]);

    assert_eq!(supervisor.guard().accumulated_pnl_usd(), dec!(0.8485));
    assert_eq!(supervisor.consecutive_failures(), 0);
}

#[tokio::test]
async fn test_relay_success_skips_broadcast() {
    let quoter = market();
    let submitter = FakeSubmitter::new();
    let relay = FakeRelay::default();

    let executor = Executor::new(probed_pool().await, false, 10_000)
        .with_submitter(Arc::new(submitter.clone()))
        .with_relay(Arc::new(relay.clone()));

    let mut supervisor = Supervisor::new(
        fast_config(dec!(0.10)),
        strategies(&quoter),
        Arc::new(executor),
        LossGuard::new(dec!(25)),
    );

    let report = completed(supervisor.step().await);

    assert!(report.executed.is_some());
    assert_eq!(relay.bundle_count(), 1);
    assert!(submitter.broadcast_urls().is_empty());
}

#[tokio::test]
async fn test_simulation_never_signs_and_credits_nothing() {
    let quoter = market();
    let submitter = FakeSubmitter::new();

    let executor = Executor::new(probed_pool().await, true, 10_000)
        .with_submitter(Arc::new(submitter.clone()));

    let mut supervisor = Supervisor::new(
        fast_config(dec!(0.10)),
        strategies(&quoter),
        Arc::new(executor),
        LossGuard::new(dec!(25)),
    );

    let report = completed(supervisor.step().await);

    // Every viable plan is tried, none succeeds.
    assert_eq!(report.plans_viable, 2);
    assert_eq!(report.attempts, 2);
    assert!(report.executed.is_none());
    assert_eq!(submitter.sign_count(), 0);
    assert_eq!(supervisor.guard().accumulated_pnl_usd(), Decimal::ZERO);
}

#[tokio::test]
async fn test_broadcast_failure_tries_next_plan_then_gives_up() {
    let quoter = market();
    let submitter = FakeSubmitter::new();
    submitter.fail_broadcast("blockhash not found");

    let executor = Executor::new(probed_pool().await, false, 10_000)
        .with_submitter(Arc::new(submitter.clone()));

    let mut supervisor = Supervisor::new(
        fast_config(dec!(0.10)),
        strategies(&quoter),
        Arc::new(executor),
        LossGuard::new(dec!(25)),
    );

    let report = completed(supervisor.step().await);

    assert_eq!(report.attempts, 2);
    assert!(report.executed.is_none());
    assert_eq!(submitter.sign_count(), 2);
    assert_eq!(supervisor.guard().accumulated_pnl_usd(), Decimal::ZERO);
    // A failed submission is not a failed cycle.
    assert_eq!(supervisor.consecutive_failures(), 0);
}

#[tokio::test]
async fn test_losing_execution_trips_guard_and_pauses_scanning() {
    let quoter = FakeQuoter::new().with_quote(USDT, SOL, 330_000_000);
    let submitter = FakeSubmitter::new();

    let executor = Executor::new(probed_pool().await, false, 10_000)
        .with_submitter(Arc::new(submitter.clone()));

    let strategies: Vec<Arc<dyn Strategy>> = vec![Arc::new(TwoLegSpread::new(pricer(&quoter)))];
    let mut supervisor = Supervisor::new(
        fast_config(dec!(-1)),
        StrategySet::new(strategies),
        Arc::new(executor),
        LossGuard::new(dec!(0.50)),
    );

    let report = completed(supervisor.step().await);
    assert!(report.executed.is_some());
    assert_eq!(supervisor.guard().accumulated_pnl_usd(), dec!(-0.6515));
    assert!(supervisor.guard().exceeded());

    let quotes_before = quoter.call_count();
    assert_eq!(supervisor.step().await, StepOutcome::Paused);
    assert_eq!(quoter.call_count(), quotes_before);
    assert_eq!(submitter.sign_count(), 1);
}

#[tokio::test]
async fn test_status_board_tracks_cycles() {
    let quoter = market();
    let board = Arc::new(StatusBoard::new("SWAPSCAN-IT", true, false));

    let executor = Executor::new(probed_pool().await, true, 10_000);
    let mut supervisor = Supervisor::new(
        fast_config(dec!(0.10)),
        strategies(&quoter),
        Arc::new(executor),
        LossGuard::new(dec!(25)),
    )
    .with_status(Arc::clone(&board));

    supervisor.step().await;
    supervisor.step().await;

    let status = board.current().await;
    assert_eq!(status.phase, LoopPhase::Scanning);
    assert_eq!(status.cycle, 2);
    assert_eq!(status.last_report.map(|r| r.plans_proposed), Some(3));
    assert!(status.updated_at.is_some());
}
