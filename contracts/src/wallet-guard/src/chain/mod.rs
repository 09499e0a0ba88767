//! Execution context the batch runs against.
//!
//! The guard only needs three things from a chain: run a call as the wallet, take a snapshot,
//! and put a snapshot back. [`InMemoryChain`] provides them over a [`Ledger`] plus a table of
//! stateless contracts keyed by address; addresses without a contract behave like EOAs.

mod aggregator;
mod ledger;
mod token;
mod venue;

pub use aggregator::{SwapAggregator, TokenTransferProxy};
pub use ledger::Ledger;
pub use token::Erc20Token;
pub use venue::{FixedRateVenue, SwapVenue};

use std::{collections::HashMap, sync::Arc};

use alloy_primitives::{Address, Bytes, U256};
use thiserror::Error;
use wallet_guard_types::{Call, ETH_TOKEN};

use crate::gas::{GasMeter, GasSchedule, OutOfGas};

/// Why a call did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionFault {
    #[error("reverted: {0}")]
    Revert(String),
    #[error(transparent)]
    OutOfGas(#[from] OutOfGas),
}

impl ExecutionFault {
    pub fn revert(reason: impl Into<String>) -> Self {
        ExecutionFault::Revert(reason.into())
    }

    pub(crate) fn abi(err: alloy_sol_types::Error) -> Self {
        ExecutionFault::Revert(format!("abi decoding failed: {err}"))
    }
}

pub trait ExecutionContext {
    type Snapshot;

    fn snapshot(&self) -> Self::Snapshot;

    fn restore(&mut self, snapshot: Self::Snapshot);

    /// Run `call` with `from` as the sender, charging `gas`.
    fn call(&mut self, from: Address, call: &Call, gas: &mut GasMeter) -> Result<Bytes, ExecutionFault>;

    /// Unmetered asset movement, used for relayer refunds.
    fn transfer(&mut self, token: Address, from: Address, to: Address, amount: U256) -> Result<(), ExecutionFault>;

    /// Install the cost table calls are charged against.
    fn set_schedule(&mut self, schedule: &GasSchedule);
}

/// A deployed contract. Implementations hold configuration only; state lives in the ledger.
pub trait Contract: Send + Sync {
    fn call(&self, env: &mut Env<'_>, this: Address, sender: Address, call: &Call) -> Result<Bytes, ExecutionFault>;
}

/// What a contract sees while it runs.
pub struct Env<'a> {
    pub ledger: &'a mut Ledger,
    contracts: &'a HashMap<Address, Arc<dyn Contract>>,
    schedule: &'a GasSchedule,
    gas: &'a mut GasMeter,
}

impl Env<'_> {
    pub fn charge(&mut self, amount: u64) -> Result<(), ExecutionFault> {
        Ok(self.gas.charge(amount)?)
    }

    pub fn charge_token_op(&mut self) -> Result<(), ExecutionFault> {
        self.charge(self.schedule.token_op)
    }

    pub fn charge_swap_leg(&mut self) -> Result<(), ExecutionFault> {
        self.charge(self.schedule.swap_leg)
    }

    /// Nested call; native value moves before the callee runs.
    pub fn call(&mut self, from: Address, call: &Call) -> Result<Bytes, ExecutionFault> {
        self.charge(self.schedule.call)?;
        if !call.value.is_zero() {
            self.charge(self.schedule.value_transfer)?;
            self.ledger.transfer(ETH_TOKEN, from, call.to, call.value)?;
        }
        match self.contracts.get(&call.to).cloned() {
            Some(contract) => contract.call(self, call.to, from, call),
            None => Ok(Bytes::new()),
        }
    }
}

#[derive(Clone, Default)]
pub struct InMemoryChain {
    ledger: Ledger,
    contracts: HashMap<Address, Arc<dyn Contract>>,
    schedule: GasSchedule,
}

impl InMemoryChain {
    pub fn deploy(&mut self, address: Address, contract: Arc<dyn Contract>) {
        self.contracts.insert(address, contract);
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    pub fn balance_of(&self, token: Address, holder: Address) -> U256 {
        self.ledger.balance_of(token, holder)
    }

    pub fn schedule(&self) -> &GasSchedule {
        &self.schedule
    }
}

impl ExecutionContext for InMemoryChain {
    type Snapshot = Ledger;

    fn snapshot(&self) -> Ledger {
        self.ledger.clone()
    }

    fn restore(&mut self, snapshot: Ledger) {
        self.ledger = snapshot;
    }

    fn call(&mut self, from: Address, call: &Call, gas: &mut GasMeter) -> Result<Bytes, ExecutionFault> {
        let mut env = Env {
            ledger: &mut self.ledger,
            contracts: &self.contracts,
            schedule: &self.schedule,
            gas,
        };
        env.call(from, call)
    }

    fn transfer(&mut self, token: Address, from: Address, to: Address, amount: U256) -> Result<(), ExecutionFault> {
        self.ledger.transfer(token, from, to, amount)
    }

    fn set_schedule(&mut self, schedule: &GasSchedule) {
        self.schedule = schedule.clone();
    }
}
