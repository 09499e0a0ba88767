use std::collections::HashMap;

use alloy_primitives::{Address, U256};

/// Opaque liquidity source driven by the aggregator.
///
/// A venue only quotes; the aggregator settles against the venue's ledger balance.
pub trait SwapVenue: Send + Sync {
    /// Output for selling `amount_in` of `from` for `to`, or `None` if the pair is not served.
    fn amount_out(&self, from: Address, to: Address, amount_in: U256) -> Option<U256>;
}

/// Venue quoting fixed 18-decimal rates per pair.
#[derive(Clone, Debug, Default)]
pub struct FixedRateVenue {
    rates: HashMap<(Address, Address), U256>,
}

impl FixedRateVenue {
    const SCALE: u64 = 1_000_000_000_000_000_000;

    /// Quote `rate / 1e18` units of `to` per unit of `from`.
    pub fn with_rate(mut self, from: Address, to: Address, rate: U256) -> Self {
        self.rates.insert((from, to), rate);
        self
    }
}

impl SwapVenue for FixedRateVenue {
    fn amount_out(&self, from: Address, to: Address, amount_in: U256) -> Option<U256> {
        let rate = self.rates.get(&(from, to))?;
        amount_in.checked_mul(*rate)?.checked_div(U256::from(Self::SCALE))
    }
}
