//! Status API route handlers.
//!
//! All endpoints return JSON. The supervisor writes into the
//! [`StatusBoard`]; handlers only read it.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::engine::{CycleReport, LoopPhase};
use crate::rpc::{Endpoint, EndpointPool};
use crate::strategy::risk::GuardSnapshot;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// What the loop last reported about itself.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoopStatus {
    pub phase: LoopPhase,
    pub cycle: u64,
    pub consecutive_failures: u32,
    pub last_report: Option<CycleReport>,
    pub guard: Option<GuardSnapshot>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Latest loop status plus the fixed facts about this process.
pub struct StatusBoard {
    agent: String,
    dry_run: bool,
    paper_trade: bool,
    started_at: DateTime<Utc>,
    status: RwLock<LoopStatus>,
}

impl StatusBoard {
    pub fn new(agent: impl Into<String>, dry_run: bool, paper_trade: bool) -> Self {
        Self {
            agent: agent.into(),
            dry_run,
            paper_trade,
            started_at: Utc::now(),
            status: RwLock::new(LoopStatus::default()),
        }
    }

    pub async fn publish(&self, status: LoopStatus) {
        *self.status.write().await = status;
    }

    pub async fn current(&self) -> LoopStatus {
        self.status.read().await.clone()
    }
}

/// Shared state accessible by all route handlers.
pub struct ApiState {
    pub board: Arc<StatusBoard>,
    pub pool: Arc<EndpointPool>,
}

pub type AppState = Arc<ApiState>;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub agent: String,
    pub dry_run: bool,
    pub paper_trade: bool,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: i64,
    #[serde(flatten)]
    pub status: LoopStatus,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// GET /api/status
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let board = &state.board;
    Json(StatusResponse {
        agent: board.agent.clone(),
        dry_run: board.dry_run,
        paper_trade: board.paper_trade,
        started_at: board.started_at,
        uptime_secs: (Utc::now() - board.started_at).num_seconds(),
        status: board.current().await,
    })
}

/// GET /api/endpoints
pub async fn get_endpoints(State(state): State<AppState>) -> Json<Vec<Endpoint>> {
    Json(state.pool.snapshot().await)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
