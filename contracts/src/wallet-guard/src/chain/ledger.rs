use std::collections::HashMap;

use alloy_primitives::{Address, U256};

use crate::chain::ExecutionFault;

/// Balances and allowances; the native asset is kept under [`wallet_guard_types::ETH_TOKEN`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ledger {
    balances: HashMap<(Address, Address), U256>,
    allowances: HashMap<(Address, Address, Address), U256>,
}

impl Ledger {
    pub fn balance_of(&self, token: Address, holder: Address) -> U256 {
        self.balances.get(&(token, holder)).copied().unwrap_or_default()
    }

    pub fn mint(&mut self, token: Address, holder: Address, amount: U256) {
        let balance = self.balances.entry((token, holder)).or_default();
        *balance = balance.saturating_add(amount);
    }

    pub fn transfer(&mut self, token: Address, from: Address, to: Address, amount: U256) -> Result<(), ExecutionFault> {
        let available = self.balance_of(token, from);
        if available < amount {
            return Err(ExecutionFault::revert("insufficient balance"));
        }
        if from == to || amount.is_zero() {
            return Ok(());
        }
        self.balances.insert((token, from), available - amount);
        self.mint(token, to, amount);
        Ok(())
    }

    pub fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
        self.allowances.get(&(token, owner, spender)).copied().unwrap_or_default()
    }

    pub fn approve(&mut self, token: Address, owner: Address, spender: Address, amount: U256) {
        self.allowances.insert((token, owner, spender), amount);
    }

    /// Decrease an allowance; `U256::MAX` means unlimited and is never decreased.
    pub fn spend_allowance(
        &mut self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), ExecutionFault> {
        let current = self.allowance(token, owner, spender);
        if current == U256::MAX {
            return Ok(());
        }
        if current < amount {
            return Err(ExecutionFault::revert("insufficient allowance"));
        }
        self.approve(token, owner, spender, current - amount);
        Ok(())
    }
}
