//! Swap venue integrations.
//!
//! Defines the capability traits the core consumes and provides
//! implementations for:
//! - Token-list discovery of tradable pairs
//! - Jupiter quoting and swap building
//! - Local wallet signing + JSON-RPC broadcast
//! - Jito bundle relay (priority submission path)

pub mod discovery;
pub mod jito;
pub mod jupiter;
pub mod submitter;
pub mod wallet;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{BundleAck, ExecutionResult, FeeParams, PricedOrder, SignedSwap, TokenPair};

/// Source of the tradable pair universe.
///
/// The core only reads snapshots; refreshing is driven from outside.
#[async_trait]
pub trait Discovery: Send + Sync {
    /// The current list of pairs (possibly empty before the first refresh).
    async fn snapshot(&self) -> Vec<TokenPair>;

    /// Re-fetch the pair universe. Returns the new pair count.
    async fn refresh(&self) -> Result<usize>;
}

/// Prices a swap for a given input/output/amount.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Quoter: Send + Sync {
    /// `Ok(None)` means there is no executable route; callers skip the pair.
    async fn get_priced_order(
        &self,
        input_mint: &str,
        output_mint: &str,
        amount: u64,
        slippage_bps: u16,
    ) -> Result<Option<PricedOrder>>;
}

/// Turns a priced order into a signed transaction and broadcasts it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SwapSubmitter: Send + Sync {
    /// Build and sign the swap transaction for `order` with the wallet identity.
    async fn sign(&self, order: &PricedOrder, fees: &FeeParams) -> Result<SignedSwap>;

    /// Broadcast a signed swap through one RPC endpoint.
    async fn broadcast(&self, rpc_url: &str, signed: &SignedSwap) -> Result<ExecutionResult>;

    /// Base58 public key of the signing identity.
    fn identity(&self) -> String;
}

/// Priority submission channel tried before direct broadcast.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BundleRelay: Send + Sync {
    async fn submit_bundle(&self, signed_payloads: &[String]) -> Result<BundleAck>;

    /// Relay name for logging.
    fn name(&self) -> String;
}
