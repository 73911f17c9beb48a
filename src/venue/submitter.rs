//! Live swap submission: Jupiter-built transaction, locally signed,
//! broadcast with `sendTransaction` to a chosen RPC endpoint.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

use super::jupiter::JupiterClient;
use super::wallet::Wallet;
use super::SwapSubmitter;
use crate::types::{BotError, ExecutionResult, FeeParams, PricedOrder, SignedSwap, SubmissionPath};

const SERVICE: &str = "rpc";
const BROADCAST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct LiveSubmitter {
    jupiter: JupiterClient,
    wallet: Wallet,
    http: Client,
}

impl LiveSubmitter {
    pub fn new(jupiter: JupiterClient, wallet: Wallet) -> Result<Self> {
        let http = Client::builder()
            .timeout(BROADCAST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client for broadcast")?;

        Ok(Self {
            jupiter,
            wallet,
            http,
        })
    }
}

#[async_trait]
impl SwapSubmitter for LiveSubmitter {
    async fn sign(&self, order: &PricedOrder, fees: &FeeParams) -> Result<SignedSwap> {
        if order.slippage_bps > fees.slippage_bps {
            return Err(BotError::Validation(format!(
                "quote {} slippage {}bps exceeds plan tolerance {}bps",
                order.quote_id, order.slippage_bps, fees.slippage_bps
            ))
            .into());
        }

        let unsigned = self
            .jupiter
            .build_swap(order, &self.identity(), fees)
            .await?;
        let signed = self.wallet.sign_transaction(&unsigned.transaction)?;

        debug!(quote_id = %order.quote_id, signature = %signed.signature, "Swap signed");

        Ok(SignedSwap {
            quote_id: order.quote_id.clone(),
            payload: signed.wire,
            signature: signed.signature,
            last_valid_block_height: unsigned.last_valid_block_height,
        })
    }

    async fn broadcast(&self, rpc_url: &str, signed: &SignedSwap) -> Result<ExecutionResult> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "sendTransaction",
            "params": [
                signed.payload,
                { "encoding": "base64", "skipPreflight": true, "maxRetries": 0 }
            ],
        });

        let resp = self
            .http
            .post(rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| BotError::upstream(SERVICE, format!("{rpc_url}: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(BotError::upstream(SERVICE, format!("{rpc_url}: HTTP {status}")).into());
        }

        let reply: Value = resp
            .json()
            .await
            .context("Failed to parse sendTransaction response")?;
        let signature = parse_send_result(&reply)?;

        info!(signature = %signature, rpc = %rpc_url, "Transaction broadcast");

        Ok(ExecutionResult {
            signature,
            path: SubmissionPath::DirectBroadcast,
            rpc_url: Some(rpc_url.to_string()),
        })
    }

    fn identity(&self) -> String {
        self.wallet.pubkey().to_string()
    }
}

/// Extract the signature from a `sendTransaction` reply.
fn parse_send_result(reply: &Value) -> Result<String> {
    if let Some(err) = reply.get("error") {
        let message = err
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(BotError::upstream(SERVICE, format!("sendTransaction rejected: {message}")).into());
    }

    reply
        .get("result")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| BotError::Validation("sendTransaction reply has no result".into()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_result_signature() {
        let reply = json!({"jsonrpc": "2.0", "id": 1, "result": "5VERv8NMvzbJMEkV8xnrLkEaWRtSz9CosKDYjCJjBRnb"});
        assert_eq!(
            parse_send_result(&reply).unwrap(),
            "5VERv8NMvzbJMEkV8xnrLkEaWRtSz9CosKDYjCJjBRnb"
        );
    }

    #[test]
    fn test_send_error_is_upstream() {
        let reply = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32002, "message": "Transaction simulation failed: Blockhash not found"}
        });
        let err = parse_send_result(&reply).unwrap_err();
        match err.downcast_ref::<BotError>() {
            Some(BotError::Upstream { service, message }) => {
                assert_eq!(service, "rpc");
                assert!(message.contains("Blockhash not found"));
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_result_is_validation_error() {
        let err = parse_send_result(&json!({"jsonrpc": "2.0", "id": 1})).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BotError>(),
            Some(BotError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_sign_rejects_loose_quote_without_io() {
        use secrecy::SecretString;

        let wallet = Wallet::from_base58(&SecretString::new(bs58::encode([8u8; 32]).into_string()))
            .unwrap();
        // unroutable base url: any request would fail, but none is made
        let jupiter = JupiterClient::new("http://127.0.0.1:1").unwrap();
        let submitter = LiveSubmitter::new(jupiter, wallet).unwrap();

        let mut order = PricedOrder::sample(crate::types::USDC, crate::types::SOL, 1_000_000, 6_000_000);
        order.slippage_bps = 100;
        let fees = FeeParams {
            priority_fee_lamports: 5_000,
            slippage_bps: 60,
        };
        let err = submitter.sign(&order, &fees).await.unwrap_err();
        assert!(err.to_string().contains("exceeds plan tolerance"));
    }
}
