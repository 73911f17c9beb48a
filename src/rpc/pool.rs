//! Endpoint health pool.
//!
//! Tracks the configured upstream endpoints, probes them concurrently and
//! serves the best-known one. There is no background timer: every call to
//! `best()` has a small chance of refreshing health first, so probing cost
//! scales with call volume.

use anyhow::{anyhow, Result};
use futures::future::join_all;
use rand::Rng;
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::HealthCheck;

/// Latency assigned to endpoints that have never been probed.
pub const UNPROBED_LATENCY_MS: f64 = 9999.0;

/// One upstream node as seen by the pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Endpoint {
    pub url: String,
    pub latency_ms: f64,
    pub healthy: bool,
}

impl Endpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            latency_ms: UNPROBED_LATENCY_MS,
            healthy: true,
        }
    }

    /// Healthy first, then lower latency.
    fn rank(a: &Endpoint, b: &Endpoint) -> Ordering {
        b.healthy
            .cmp(&a.healthy)
            .then_with(|| a.latency_ms.total_cmp(&b.latency_ms))
    }
}

pub struct EndpointPool {
    /// The lock is held across the whole probe so probes never interleave.
    endpoints: Mutex<Vec<Endpoint>>,
    checker: Arc<dyn HealthCheck>,
    probe_timeout: Duration,
    probe_probability: f64,
}

impl EndpointPool {
    /// Build a pool over `urls`. Fails if the list is empty.
    pub fn new(
        urls: &[String],
        checker: Arc<dyn HealthCheck>,
        probe_timeout: Duration,
        probe_probability: f64,
    ) -> Result<Self> {
        if urls.is_empty() {
            return Err(anyhow!("No RPC endpoints configured"));
        }

        Ok(Self {
            endpoints: Mutex::new(urls.iter().map(Endpoint::new).collect()),
            checker,
            probe_timeout,
            probe_probability: probe_probability.clamp(0.0, 1.0),
        })
    }

    /// Probe every endpoint concurrently and re-sort the pool.
    ///
    /// A failing, slow or malformed endpoint is marked unhealthy; it never
    /// aborts the probes of its siblings. Latency is recorded either way.
    pub async fn probe(&self) {
        let mut endpoints = self.endpoints.lock().await;

        let checks = endpoints.iter().map(|ep| {
            let url = ep.url.clone();
            let checker = Arc::clone(&self.checker);
            let timeout = self.probe_timeout;
            async move {
                let started = Instant::now();
                let outcome = match tokio::time::timeout(timeout, checker.check(&url)).await {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => Err(e.to_string()),
                    Err(_) => Err(format!("timed out after {}ms", timeout.as_millis())),
                };
                (outcome, started.elapsed().as_secs_f64() * 1000.0)
            }
        });
        let results = join_all(checks).await;

        for (ep, (outcome, latency_ms)) in endpoints.iter_mut().zip(results) {
            ep.latency_ms = latency_ms;
            match outcome {
                Ok(()) => ep.healthy = true,
                Err(reason) => {
                    warn!(url = %ep.url, latency_ms = format!("{latency_ms:.1}"), reason = %reason, "Endpoint unhealthy");
                    ep.healthy = false;
                }
            }
        }

        endpoints.sort_by(Endpoint::rank);

        info!(
            ordered = ?endpoints.iter().map(|e| e.url.as_str()).collect::<Vec<_>>(),
            healthy = endpoints.iter().filter(|e| e.healthy).count(),
            "RPC probe complete"
        );
    }

    /// The first healthy endpoint, or the head of the stale ordering if
    /// none are healthy.
    pub async fn best(&self) -> String {
        if self.should_probe() {
            debug!("Refreshing endpoint health before selection");
            self.probe().await;
        }

        let endpoints = self.endpoints.lock().await;
        endpoints
            .iter()
            .find(|e| e.healthy)
            .or_else(|| endpoints.first())
            .map(|e| e.url.clone())
            // never empty: checked in `new`
            .unwrap_or_default()
    }

    /// Copy of the current ordering.
    pub async fn snapshot(&self) -> Vec<Endpoint> {
        self.endpoints.lock().await.clone()
    }

    fn should_probe(&self) -> bool {
        self.probe_probability > 0.0 && rand::thread_rng().gen_bool(self.probe_probability)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
