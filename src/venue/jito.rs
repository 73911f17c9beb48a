//! Jito block-engine bundle relay.
//!
//! Submits signed transactions as a bundle via the `sendBundle` JSON-RPC
//! method. The relay answers with a bundle id; landing is not tracked.
//!
//! API docs: https://jito-labs.gitbook.io/mev/searcher-resources/json-rpc-api-reference
//! Auth: optional `Authorization: Bearer <token>` (configured via env).

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

use super::BundleRelay;
use crate::types::{BotError, BundleAck};

const SERVICE: &str = "jito";
const BUNDLE_TIMEOUT: Duration = Duration::from_secs(8);

pub struct JitoRelay {
    http: Client,
    url: String,
    auth: Option<SecretString>,
}

impl JitoRelay {
    pub fn new(url: impl Into<String>, auth: Option<SecretString>) -> Result<Self> {
        let http = Client::builder()
            .timeout(BUNDLE_TIMEOUT)
            .build()
            .context("Failed to build HTTP client for Jito")?;

        Ok(Self {
            http,
            url: url.into(),
            auth,
        })
    }
}

#[async_trait]
impl BundleRelay for JitoRelay {
    async fn submit_bundle(&self, signed_payloads: &[String]) -> Result<BundleAck> {
        if signed_payloads.is_empty() {
            return Err(BotError::Validation("empty bundle".into()).into());
        }

        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "sendBundle",
            "params": [signed_payloads, { "encoding": "base64" }],
        });

        let mut req = self.http.post(&self.url).json(&body);
        if let Some(token) = &self.auth {
            req = req.bearer_auth(token.expose_secret());
        }

        debug!(url = %self.url, txs = signed_payloads.len(), "Submitting bundle");

        let resp = req
            .send()
            .await
            .map_err(|e| BotError::upstream(SERVICE, e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(BotError::upstream(SERVICE, format!("HTTP {status}: {text}")).into());
        }

        let reply: Value = resp
            .json()
            .await
            .context("Failed to parse sendBundle response")?;
        let ack = parse_bundle_reply(&reply)?;

        info!(bundle_id = %ack.bundle_id, "Bundle accepted by relay");
        Ok(ack)
    }

    fn name(&self) -> String {
        SERVICE.to_string()
    }
}

fn parse_bundle_reply(reply: &Value) -> Result<BundleAck> {
    if let Some(err) = reply.get("error") {
        return Err(BotError::upstream(SERVICE, format!("sendBundle rejected: {err}")).into());
    }

    match reply.get("result").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => Ok(BundleAck {
            bundle_id: id.to_string(),
        }),
        _ => Err(BotError::upstream(SERVICE, "sendBundle reply has no bundle id").into()),
    }
}
