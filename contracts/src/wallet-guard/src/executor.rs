//! Two-phase batch execution: authorise every call, then run them all or none.

use alloy_primitives::Bytes;
use tracing::{debug, info};
use wallet_guard_types::Call;

use crate::{
    chain::{ExecutionContext, ExecutionFault},
    errors::BatchError,
    gas::{GasMeter, OutOfGas},
    registry::{Authorisation, Registries},
    wallet::Wallet,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// Every call ran; one return blob per call.
    Completed { return_data: Vec<Bytes> },
    /// Nothing changed.
    Failed(BatchError),
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Completed { .. })
    }

    pub fn error(&self) -> Option<&BatchError> {
        match self {
            ExecutionOutcome::Completed { .. } => None,
            ExecutionOutcome::Failed(err) => Some(err),
        }
    }
}

pub struct CallBatchExecutor<'a> {
    registries: &'a Registries,
}

impl<'a> CallBatchExecutor<'a> {
    pub fn new(registries: &'a Registries) -> Self {
        Self { registries }
    }

    /// Pure validation pass; stops at the first call that is not authorised.
    pub fn authorise(&self, wallet: &Wallet, calls: &[Call], now: u64) -> Result<Vec<Authorisation>, BatchError> {
        calls
            .iter()
            .enumerate()
            .map(|(index, call)| {
                let auth = self.registries.authorise(&wallet.lists, wallet.address, call, now);
                if auth.is_authorised() {
                    Ok(auth)
                } else {
                    debug!(wallet = %wallet.address, index, to = %call.to, ?auth, "call not authorised");
                    Err(BatchError::NotAuthorised { index })
                }
            })
            .collect()
    }

    /// Authorise then commit. A revert restores the context and is reported as a failed
    /// outcome; gas exhaustion restores the context and is returned as an error.
    pub fn execute<C: ExecutionContext>(
        &self,
        ctx: &mut C,
        wallet: &Wallet,
        calls: &[Call],
        gas: &mut GasMeter,
        now: u64,
    ) -> Result<ExecutionOutcome, OutOfGas> {
        if let Err(err) = self.authorise(wallet, calls, now) {
            return Ok(ExecutionOutcome::Failed(err));
        }

        let snapshot = ctx.snapshot();
        let mut return_data = Vec::with_capacity(calls.len());
        for (index, call) in calls.iter().enumerate() {
            match ctx.call(wallet.address, call, gas) {
                Ok(data) => return_data.push(data),
                Err(ExecutionFault::Revert(reason)) => {
                    ctx.restore(snapshot);
                    info!(wallet = %wallet.address, index, %reason, "batch reverted");
                    return Ok(ExecutionOutcome::Failed(BatchError::Reverted { index, reason }));
                }
                Err(ExecutionFault::OutOfGas(oog)) => {
                    ctx.restore(snapshot);
                    return Err(oog);
                }
            }
        }
        Ok(ExecutionOutcome::Completed { return_data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        chain::{Erc20Token, InMemoryChain},
        filters::{ApproveOnlyFilter, Filter},
        registry::DEFAULT_LIST,
    };
    use alloy_primitives::{Address, U256};
    use alloy_sol_types::SolCall;
    use std::sync::Arc;
    use wallet_guard_types::{ETH_TOKEN, IERC20};

    const ADMIN: Address = Address::repeat_byte(0xad);
    const WALLET: Address = Address::repeat_byte(0x01);
    const OWNER: Address = Address::repeat_byte(0x02);
    const RELAYER: Address = Address::repeat_byte(0x03);
    const TOKEN: Address = Address::repeat_byte(0x0a);
    const PROXY: Address = Address::repeat_byte(0x0b);

    fn setup() -> (Registries, InMemoryChain, Wallet) {
        let mut registries = Registries::new(ADMIN);
        registries.dapps.register(DEFAULT_LIST, RELAYER, Filter::Null, 0).unwrap();
        registries
            .dapps
            .register(DEFAULT_LIST, TOKEN, ApproveOnlyFilter::new(PROXY).into(), 0)
            .unwrap();
        let mut chain = InMemoryChain::default();
        chain.deploy(TOKEN, Arc::new(Erc20Token));
        chain.ledger_mut().mint(ETH_TOKEN, WALLET, U256::from(100u64));
        (registries, chain, Wallet::new(WALLET, OWNER, vec![]))
    }

    fn approve(amount: u64) -> Call {
        Call::new(
            TOKEN,
            U256::ZERO,
            IERC20::approveCall { spender: PROXY, amount: U256::from(amount) }.abi_encode(),
        )
    }

    #[test]
    fn unauthorised_call_blocks_whole_batch() {
        let (registries, mut chain, wallet) = setup();
        let calls = vec![
            Call::value_transfer(RELAYER, U256::from(10u64)),
            Call::value_transfer(Address::repeat_byte(0x99), U256::from(10u64)),
        ];
        let outcome = CallBatchExecutor::new(&registries)
            .execute(&mut chain, &wallet, &calls, &mut GasMeter::unmetered(), 0)
            .unwrap();
        assert_eq!(outcome, ExecutionOutcome::Failed(BatchError::NotAuthorised { index: 1 }));
        assert_eq!(outcome.error().map(BatchError::reason), Some("call not authorised"));
        assert_eq!(chain.balance_of(ETH_TOKEN, RELAYER), U256::ZERO);
    }

    #[test]
    fn revert_rolls_back_earlier_calls() {
        let (registries, mut chain, wallet) = setup();
        let calls = vec![
            approve(5),
            Call::value_transfer(RELAYER, U256::from(10u64)),
            Call::value_transfer(RELAYER, U256::from(1_000u64)),
        ];
        let outcome = CallBatchExecutor::new(&registries)
            .execute(&mut chain, &wallet, &calls, &mut GasMeter::unmetered(), 0)
            .unwrap();
        assert_eq!(
            outcome,
            ExecutionOutcome::Failed(BatchError::Reverted { index: 2, reason: "insufficient balance".into() })
        );
        assert_eq!(chain.balance_of(ETH_TOKEN, RELAYER), U256::ZERO);
        assert_eq!(chain.ledger().allowance(TOKEN, WALLET, PROXY), U256::ZERO);
    }

    #[test]
    fn successful_batch_commits_in_order() {
        let (registries, mut chain, wallet) = setup();
        let calls = vec![approve(5), Call::value_transfer(RELAYER, U256::from(10u64))];
        let outcome = CallBatchExecutor::new(&registries)
            .execute(&mut chain, &wallet, &calls, &mut GasMeter::unmetered(), 0)
            .unwrap();
        assert!(outcome.is_success());
        assert_eq!(chain.ledger().allowance(TOKEN, WALLET, PROXY), U256::from(5u64));
        assert_eq!(chain.balance_of(ETH_TOKEN, RELAYER), U256::from(10u64));
    }

    #[test]
    fn out_of_gas_restores_and_is_fatal() {
        let (registries, mut chain, wallet) = setup();
        let calls = vec![approve(5), Call::value_transfer(RELAYER, U256::from(10u64))];
        let mut gas = GasMeter::new(chain.schedule().call + chain.schedule().token_op + 1);
        let res = CallBatchExecutor::new(&registries).execute(&mut chain, &wallet, &calls, &mut gas, 0);
        assert!(res.is_err());
        assert_eq!(chain.ledger().allowance(TOKEN, WALLET, PROXY), U256::ZERO);
    }
}
