use std::collections::HashMap;

use alloy_primitives::{Address, U256};
use wallet_guard_types::nonce_timestamp;

use crate::errors::NonceError;

/// Age bounds for the timestamp embedded in a nonce.
///
/// A nonce stamped at `ts` is executable during `[ts + period, ts + period + window]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SecurityWindow {
    pub period: u64,
    pub window: u64,
}

impl SecurityWindow {
    pub fn new(period: u64, window: u64) -> Self {
        Self { period, window }
    }

    pub fn check(&self, timestamp: u64, now: u64) -> Result<(), NonceError> {
        let ready_at = timestamp.saturating_add(self.period);
        if now < ready_at {
            return Err(NonceError::TooNew { ready_at });
        }
        let expired_at = ready_at.saturating_add(self.window);
        if now > expired_at {
            return Err(NonceError::Expired { expired_at });
        }
        Ok(())
    }
}

/// Per-wallet high-water mark of consumed nonces.
#[derive(Clone, Debug, Default)]
pub struct NonceBook {
    last: HashMap<Address, U256>,
}

impl NonceBook {
    pub fn last(&self, wallet: Address) -> U256 {
        self.last.get(&wallet).copied().unwrap_or_default()
    }

    /// Freshness check; does not consume.
    pub fn check(&self, window: &SecurityWindow, wallet: Address, nonce: U256, now: u64) -> Result<(), NonceError> {
        if nonce <= self.last(wallet) {
            return Err(NonceError::AlreadyUsed);
        }
        window.check(nonce_timestamp(nonce), now)
    }

    /// Record `nonce` as used and return the previous mark.
    pub fn consume(&mut self, wallet: Address, nonce: U256) -> U256 {
        self.last.insert(wallet, nonce).unwrap_or_default()
    }

    pub fn rollback(&mut self, wallet: Address, previous: U256) {
        if previous.is_zero() {
            self.last.remove(&wallet);
        } else {
            self.last.insert(wallet, previous);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wallet_guard_types::compose_nonce;

    const WALLET: Address = Address::repeat_byte(0x01);

    #[test]
    fn window_bounds_are_inclusive() {
        let w = SecurityWindow::new(2, 2);
        assert_eq!(w.check(100, 101), Err(NonceError::TooNew { ready_at: 102 }));
        assert_eq!(w.check(100, 102), Ok(()));
        assert_eq!(w.check(100, 104), Ok(()));
        assert_eq!(w.check(100, 105), Err(NonceError::Expired { expired_at: 104 }));
    }

    #[test]
    fn future_timestamps_are_too_new() {
        let w = SecurityWindow::new(0, 10);
        assert_eq!(w.check(200, 100), Err(NonceError::TooNew { ready_at: 200 }));
    }

    #[test]
    fn nonces_are_strictly_increasing() {
        let w = SecurityWindow::new(2, 2);
        let mut book = NonceBook::default();
        let first = compose_nonce(100, 1);
        assert_eq!(book.check(&w, WALLET, first, 102), Ok(()));
        assert_eq!(book.consume(WALLET, first), U256::ZERO);

        assert_eq!(book.check(&w, WALLET, first, 102), Err(NonceError::AlreadyUsed));
        assert_eq!(book.check(&w, WALLET, compose_nonce(100, 0), 102), Err(NonceError::AlreadyUsed));
        assert_eq!(book.check(&w, WALLET, compose_nonce(100, 2), 102), Ok(()));
        // other wallets are unaffected
        assert_eq!(book.check(&w, Address::repeat_byte(2), first, 102), Ok(()));
    }

    #[test]
    fn rollback_restores_previous_mark() {
        let mut book = NonceBook::default();
        let previous = book.consume(WALLET, compose_nonce(100, 1));
        book.rollback(WALLET, previous);
        assert_eq!(book.last(WALLET), U256::ZERO);
    }
}
