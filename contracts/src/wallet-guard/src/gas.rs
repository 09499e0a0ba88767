//! Gas schedule and metering.
//!
//! Gas here is an accounting unit for relayer refunds and a hard stop: running out is a fatal
//! abort of the whole relay attempt, never a recoverable batch failure.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("out of gas: needed {needed}, remaining {remaining}")]
pub struct OutOfGas {
    pub needed: u64,
    pub remaining: u64,
}

/// Cost table charged by the module and the execution context.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GasSchedule {
    pub intrinsic: u64,
    pub per_signature: u64,
    pub per_data_byte: u64,
    pub call: u64,
    pub value_transfer: u64,
    pub token_op: u64,
    pub swap_leg: u64,
    /// Flat overhead added to the measured usage when computing the refund.
    pub refund_overhead: u64,
}

impl Default for GasSchedule {
    fn default() -> Self {
        Self {
            intrinsic: 21_000,
            per_signature: 5_000,
            per_data_byte: 16,
            call: 2_600,
            value_transfer: 9_000,
            token_op: 25_000,
            swap_leg: 60_000,
            refund_overhead: 30_000,
        }
    }
}

impl GasSchedule {
    /// Up-front cost of a relayed batch before any call runs.
    pub fn intrinsic_cost(&self, signatures: usize, data_len: usize) -> u64 {
        self.intrinsic
            .saturating_add(self.per_signature.saturating_mul(signatures as u64))
            .saturating_add(self.per_data_byte.saturating_mul(data_len as u64))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GasMeter {
    limit: u64,
    used: u64,
}

impl GasMeter {
    pub fn new(limit: u64) -> Self {
        Self { limit, used: 0 }
    }

    /// Meter for bookkeeping transfers the relayer does not pay for.
    pub fn unmetered() -> Self {
        Self::new(u64::MAX)
    }

    pub fn charge(&mut self, amount: u64) -> Result<(), OutOfGas> {
        let remaining = self.remaining();
        if amount > remaining {
            return Err(OutOfGas {
                needed: amount,
                remaining,
            });
        }
        self.used += amount;
        Ok(())
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn remaining(&self) -> u64 {
        self.limit - self.used
    }
}
