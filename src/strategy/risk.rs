//! Daily loss guard.
//!
//! A rolling 24-hour accumulator of expected PnL credited after successful
//! executions. The window is reset lazily on mutation, never on a timer.
//! Tripping the guard is a scheduling pause, not an error.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

/// Window length after which the accumulator starts over.
pub fn window_length() -> Duration {
    Duration::hours(24)
}

/// Point-in-time view of the guard, for logging and the status API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuardSnapshot {
    pub window_start: DateTime<Utc>,
    pub accumulated_pnl_usd: Decimal,
    pub limit_usd: Decimal,
    pub exceeded: bool,
}

#[derive(Debug, Clone)]
pub struct LossGuard {
    window_start: DateTime<Utc>,
    accumulated_pnl_usd: Decimal,
    limit_usd: Decimal,
}

impl LossGuard {
    pub fn new(limit_usd: Decimal) -> Self {
        Self::starting_at(limit_usd, Utc::now())
    }

    pub fn starting_at(limit_usd: Decimal, now: DateTime<Utc>) -> Self {
        Self {
            window_start: now,
            accumulated_pnl_usd: Decimal::ZERO,
            limit_usd,
        }
    }

    /// Credit a delta to the current window.
    pub fn add_pnl(&mut self, delta_usd: Decimal) {
        self.add_pnl_at(delta_usd, Utc::now());
    }

    pub fn add_pnl_at(&mut self, delta_usd: Decimal, now: DateTime<Utc>) {
        if now - self.window_start > window_length() {
            info!(
                previous_pnl = %self.accumulated_pnl_usd,
                "Loss guard window expired, resetting"
            );
            self.window_start = now;
            self.accumulated_pnl_usd = Decimal::ZERO;
        }

        let was_exceeded = self.exceeded();
        self.accumulated_pnl_usd += delta_usd;

        if !was_exceeded && self.exceeded() {
            warn!(
                accumulated = %self.accumulated_pnl_usd,
                limit = %self.limit_usd,
                "Daily loss limit exceeded"
            );
        }
    }

    /// `accumulated < -|limit|`. Pure.
    pub fn exceeded(&self) -> bool {
        self.accumulated_pnl_usd < -self.limit_usd.abs()
    }

    pub fn accumulated_pnl_usd(&self) -> Decimal {
        self.accumulated_pnl_usd
    }

    pub fn snapshot(&self) -> GuardSnapshot {
        GuardSnapshot {
            window_start: self.window_start,
            accumulated_pnl_usd: self.accumulated_pnl_usd,
            limit_usd: self.limit_usd,
            exceeded: self.exceeded(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
