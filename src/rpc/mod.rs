//! Upstream RPC endpoint management.
//!
//! Defines the `HealthCheck` trait and the `EndpointPool` that ranks
//! configured endpoints by health and latency.

pub mod health;
pub mod pool;

use anyhow::Result;
use async_trait::async_trait;

pub use health::JsonRpcHealthCheck;
pub use pool::{Endpoint, EndpointPool};

/// A lightweight liveness check against one endpoint.
///
/// Implementors return `Ok(())` only for a healthy answer. Timeouts are
/// applied by the pool, not by the check.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn check(&self, url: &str) -> Result<()>;
}
