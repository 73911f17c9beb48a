//! Token-list discovery.
//!
//! Pulls the verified token list, keeps a fixed set of majors and builds
//! every unordered pair among them. The list is refreshed from a background
//! task in `main`; strategies only read the snapshot.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::Discovery;
use crate::types::{TokenInfo, TokenPair};

/// Symbols worth pairing.
pub const MAJOR_SYMBOLS: [&str; 7] = ["USDC", "USDT", "SOL", "mSOL", "JITOSOL", "wBTC", "ETH"];

/// Token list entry. Only the fields we need.
#[derive(Debug, Deserialize)]
struct ListedToken {
    address: String,
    symbol: String,
    #[serde(default)]
    decimals: u8,
}

pub struct TokenListDiscovery {
    http: Client,
    tokens_url: String,
    max_pairs: usize,
    pairs: RwLock<Vec<TokenPair>>,
}

impl TokenListDiscovery {
    pub fn new(tokens_url: impl Into<String>, max_pairs: usize) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("SWAPSCAN/0.1.0")
            .build()
            .context("Failed to build HTTP client for discovery")?;

        Ok(Self {
            http,
            tokens_url: tokens_url.into(),
            max_pairs,
            pairs: RwLock::new(Vec::new()),
        })
    }

    /// Keep majors (first occurrence per symbol) and pair them up.
    fn build_pairs(tokens: Vec<ListedToken>, max_pairs: usize) -> Vec<TokenPair> {
        let mut majors: Vec<TokenInfo> = Vec::new();
        for t in tokens {
            if MAJOR_SYMBOLS.contains(&t.symbol.as_str())
                && !majors.iter().any(|m| m.symbol == t.symbol)
            {
                majors.push(TokenInfo {
                    symbol: t.symbol,
                    mint: t.address,
                    decimals: t.decimals,
                });
            }
        }

        majors
            .iter()
            .enumerate()
            .flat_map(|(i, a)| {
                majors[i + 1..].iter().map(move |b| TokenPair {
                    asset_a: a.clone(),
                    asset_b: b.clone(),
                })
            })
            .take(max_pairs)
            .collect()
    }
}

#[async_trait]
impl Discovery for TokenListDiscovery {
    async fn snapshot(&self) -> Vec<TokenPair> {
        self.pairs.read().await.clone()
    }

    async fn refresh(&self) -> Result<usize> {
        debug!(url = %self.tokens_url, "Fetching token list");

        let resp = self
            .http
            .get(&self.tokens_url)
            .send()
            .await
            .context("Token list request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Token list error {status}: {body}");
        }

        let tokens: Vec<ListedToken> = resp
            .json()
            .await
            .context("Failed to parse token list response")?;

        let listed = tokens.len();
        let pairs = Self::build_pairs(tokens, self.max_pairs);
        let count = pairs.len();
        *self.pairs.write().await = pairs;

        info!(listed, pairs = count, "Discovery refreshed");
        Ok(count)
    }
}
