//! The control loop.
//!
//! Each step: guard check -> scan all strategies -> rank -> filter and
//! execute at most one plan -> credit the loss guard -> pace. A cycle that
//! errors out is counted; enough consecutive failures trigger a recovery
//! pause, after which the counter starts over.

use rust_decimal::Decimal;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use super::executor::PlanExecutor;
use super::selection::{execute_first_viable, rank_plans};
use crate::api::{LoopStatus, StatusBoard};
use crate::config::AppConfig;
use crate::strategy::{LossGuard, StrategySet};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub scan_interval: Duration,
    pub floor_sleep: Duration,
    pub pause_after_fails: u32,
    pub recovery_delay: Duration,
    pub guard_cooldown: Duration,
    pub min_profit_usd: Decimal,
}

impl SupervisorConfig {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            scan_interval: config.scan_interval(),
            floor_sleep: Duration::from_millis(config.agent.floor_sleep_ms),
            pause_after_fails: config.agent.pause_after_fails,
            recovery_delay: Duration::from_secs(config.agent.recovery_delay_secs),
            guard_cooldown: Duration::from_secs(config.agent.guard_cooldown_secs),
            min_profit_usd: config.risk.min_profit_usd,
        }
    }
}

// ---------------------------------------------------------------------------
// Cycle reporting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopPhase {
    #[default]
    Starting,
    Scanning,
    GuardPaused,
    Recovering,
}

/// Summary of one completed cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub plans_proposed: usize,
    pub plans_viable: usize,
    pub attempts: usize,
    /// Display form of the executed plan.
    pub executed: Option<String>,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Loss guard tripped; nothing was scanned.
    Paused,
    Completed(CycleReport),
    /// The cycle body failed; the loop retries at once.
    Failed { consecutive: u32 },
    /// The failure threshold was hit and the recovery delay has elapsed.
    Recovered,
}

// ---------------------------------------------------------------------------
// Supervisor
// ---------------------------------------------------------------------------

pub struct Supervisor {
    config: SupervisorConfig,
    strategies: StrategySet,
    executor: Arc<dyn PlanExecutor>,
    guard: LossGuard,
    consecutive_failures: u32,
    cycle: u64,
    last_report: Option<CycleReport>,
    status: Option<Arc<StatusBoard>>,
}

impl Supervisor {
    pub fn new(
        config: SupervisorConfig,
        strategies: StrategySet,
        executor: Arc<dyn PlanExecutor>,
        guard: LossGuard,
    ) -> Self {
        Self {
            config,
            strategies,
            executor,
            guard,
            consecutive_failures: 0,
            cycle: 0,
            last_report: None,
            status: None,
        }
    }

    /// Publish a status snapshot after every step.
    pub fn with_status(mut self, board: Arc<StatusBoard>) -> Self {
        self.status = Some(board);
        self
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn guard(&self) -> &LossGuard {
        &self.guard
    }

    /// `max(floor_sleep, scan_interval - elapsed)`.
    pub fn pacing_delay(&self, elapsed: Duration) -> Duration {
        self.config
            .scan_interval
            .saturating_sub(elapsed)
            .max(self.config.floor_sleep)
    }

    /// Loop until `shutdown` resolves. An in-flight step is dropped at its
    /// next suspension point.
    pub async fn run(&mut self, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);
        info!(
            strategies = ?self.strategies.names(),
            interval_ms = self.config.scan_interval.as_millis() as u64,
            min_profit = %self.config.min_profit_usd,
            "Supervisor starting"
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(cycles = self.cycle, "Supervisor stopping");
                    break;
                }
                _ = self.step() => {}
            }
        }
    }

    /// One iteration of the loop, including its sleep.
    pub async fn step(&mut self) -> StepOutcome {
        if self.guard.exceeded() {
            let snapshot = self.guard.snapshot();
            warn!(
                accumulated = %snapshot.accumulated_pnl_usd,
                limit = %snapshot.limit_usd,
                cooldown_secs = self.config.guard_cooldown.as_secs(),
                "Daily loss limit hit, pausing"
            );
            self.publish(LoopPhase::GuardPaused).await;
            tokio::time::sleep(self.config.guard_cooldown).await;
            return StepOutcome::Paused;
        }

        self.cycle += 1;
        let started = Instant::now();

        match self.run_cycle(started).await {
            Ok(report) => {
                self.consecutive_failures = 0;
                info!(
                    cycle = report.cycle,
                    proposed = report.plans_proposed,
                    viable = report.plans_viable,
                    attempts = report.attempts,
                    executed = report.executed.as_deref().unwrap_or("none"),
                    elapsed_ms = report.elapsed_ms,
                    "Cycle complete"
                );
                self.last_report = Some(report.clone());
                self.publish(LoopPhase::Scanning).await;

                tokio::time::sleep(self.pacing_delay(started.elapsed())).await;
                StepOutcome::Completed(report)
            }
            Err(e) => {
                self.consecutive_failures += 1;
                error!(
                    cycle = self.cycle,
                    consecutive = self.consecutive_failures,
                    error = format!("{e:#}"),
                    "Cycle failed"
                );

                if self.consecutive_failures >= self.config.pause_after_fails {
                    warn!(
                        failures = self.consecutive_failures,
                        delay_secs = self.config.recovery_delay.as_secs_f64(),
                        "Too many consecutive failures, pausing"
                    );
                    self.publish(LoopPhase::Recovering).await;
                    tokio::time::sleep(self.config.recovery_delay).await;
                    self.consecutive_failures = 0;
                    self.publish(LoopPhase::Scanning).await;
                    return StepOutcome::Recovered;
                }

                self.publish(LoopPhase::Scanning).await;
                StepOutcome::Failed {
                    consecutive: self.consecutive_failures,
                }
            }
        }
    }

    /// Scan, rank, filter, execute. No sleeping here.
    async fn run_cycle(&mut self, started: Instant) -> anyhow::Result<CycleReport> {
        let plans = self.strategies.scan().await?;
        let plans_proposed = plans.len();

        let ranked = rank_plans(plans);
        let selection =
            execute_first_viable(&ranked, self.config.min_profit_usd, self.executor.as_ref()).await;

        if let Some(plan) = &selection.executed {
            self.guard.add_pnl(plan.expected_pnl_usd());
        }

        Ok(CycleReport {
            cycle: self.cycle,
            plans_proposed,
            plans_viable: selection.viable,
            attempts: selection.attempts,
            executed: selection.executed.as_ref().map(|p| p.to_string()),
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }

    async fn publish(&self, phase: LoopPhase) {
        if let Some(board) = &self.status {
            board
                .publish(LoopStatus {
                    phase,
                    cycle: self.cycle,
                    consecutive_failures: self.consecutive_failures,
                    last_report: self.last_report.clone(),
                    guard: Some(self.guard.snapshot()),
                    updated_at: Some(chrono::Utc::now()),
                })
                .await;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
