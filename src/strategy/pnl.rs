//! Expected-PnL model shared by all strategies.
//!
//! `pnl = (output_usd - input_usd) - taker_fee - priority_fee`
//!
//! where `taker_fee = input_usd * taker_fee_bps / 10_000` and the priority fee
//! is converted from lamports to fiat with the configured native reference price.

use rust_decimal::Decimal;

use crate::config::TradingConfig;
use crate::types::{Asset, SOL};

const BPS_DENOMINATOR: u32 = 10_000;
const LAMPORTS_DECIMALS: u32 = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct PnlModel {
    taker_fee_bps: u32,
    priority_fee_lamports: u64,
    native_usd_price: Decimal,
}

impl PnlModel {
    pub fn new(taker_fee_bps: u32, priority_fee_lamports: u64, native_usd_price: Decimal) -> Self {
        Self {
            taker_fee_bps,
            priority_fee_lamports,
            native_usd_price,
        }
    }

    pub fn from_config(trading: &TradingConfig) -> Self {
        Self::new(
            trading.taker_fee_bps,
            trading.priority_fee_lamports,
            trading.native_usd_price,
        )
    }

    /// Fiat reference price of one whole unit of `asset`.
    pub fn usd_price(&self, asset: &Asset) -> Decimal {
        if asset.stable {
            Decimal::ONE
        } else if asset.mint == SOL.mint {
            self.native_usd_price
        } else {
            Decimal::ZERO
        }
    }

    /// Fiat value of a raw on-chain amount.
    pub fn usd_value(&self, asset: &Asset, raw_amount: u64) -> Decimal {
        asset.from_base_units(raw_amount) * self.usd_price(asset)
    }

    pub fn taker_fee_usd(&self, input_usd: Decimal) -> Decimal {
        input_usd * Decimal::from(self.taker_fee_bps) / Decimal::from(BPS_DENOMINATOR)
    }

    pub fn priority_fee_usd(&self) -> Decimal {
        let lamports = i128::from(self.priority_fee_lamports);
        Decimal::from_i128_with_scale(lamports, LAMPORTS_DECIMALS) * self.native_usd_price
    }

    pub fn expected_pnl(&self, input_usd: Decimal, output_usd: Decimal) -> Decimal {
        (output_usd - input_usd) - self.taker_fee_usd(input_usd) - self.priority_fee_usd()
    }
}
