//! JSON-RPC `getHealth` probe.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::HealthCheck;
use crate::types::BotError;

/// Probes a Solana-style JSON-RPC node with `getHealth`.
pub struct JsonRpcHealthCheck {
    http: Client,
}

impl JsonRpcHealthCheck {
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .user_agent("SWAPSCAN/0.1.0")
            .build()
            .context("Failed to build HTTP client for health probes")?;
        Ok(Self { http })
    }
}

#[async_trait]
impl HealthCheck for JsonRpcHealthCheck {
    async fn check(&self, url: &str) -> Result<()> {
        let resp = self
            .http
            .post(url)
            .json(&json!({ "jsonrpc": "2.0", "id": 1, "method": "getHealth" }))
            .send()
            .await
            .with_context(|| format!("getHealth request to {url} failed"))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(BotError::upstream(url, format!("HTTP {status}")).into());
        }

        let body: Value = resp
            .json()
            .await
            .with_context(|| format!("Malformed getHealth response from {url}"))?;

        interpret_health(&body).map_err(|reason| BotError::upstream(url, reason).into())
    }
}

/// Healthy iff there is no `error` member and `result` is `"ok"` or absent.
fn interpret_health(body: &Value) -> Result<(), String> {
    if !body.is_object() {
        return Err("response is not a JSON object".into());
    }
    if let Some(err) = body.get("error") {
        return Err(format!("node reported unhealthy: {err}"));
    }
    match body.get("result") {
        None | Some(Value::Null) => Ok(()),
        Some(Value::String(s)) if s == "ok" => Ok(()),
        Some(other) => Err(format!("unexpected getHealth result: {other}")),
    }
}
