use alloy_primitives::{Address, Bytes};
use alloy_sol_types::{SolCall, SolValue};
use wallet_guard_types::{Call, IERC20};

use crate::{
    chain::{Contract, Env, ExecutionFault},
    decoder::selector,
};

/// Plain ERC-20; balances live in the ledger under the token's own address.
#[derive(Clone, Copy, Debug, Default)]
pub struct Erc20Token;

impl Contract for Erc20Token {
    fn call(&self, env: &mut Env<'_>, this: Address, sender: Address, call: &Call) -> Result<Bytes, ExecutionFault> {
        if !call.value.is_zero() {
            return Err(ExecutionFault::revert("token is not payable"));
        }
        let sel = selector(&call.data).map_err(|_| ExecutionFault::revert("missing selector"))?;
        let data = call.data.as_ref();

        if sel == IERC20::approveCall::SELECTOR {
            let c = IERC20::approveCall::abi_decode(data, true).map_err(ExecutionFault::abi)?;
            env.charge_token_op()?;
            env.ledger.approve(this, sender, c.spender, c.amount);
            Ok(true.abi_encode().into())
        } else if sel == IERC20::transferCall::SELECTOR {
            let c = IERC20::transferCall::abi_decode(data, true).map_err(ExecutionFault::abi)?;
            env.charge_token_op()?;
            env.ledger.transfer(this, sender, c.to, c.amount)?;
            Ok(true.abi_encode().into())
        } else if sel == IERC20::transferFromCall::SELECTOR {
            let c = IERC20::transferFromCall::abi_decode(data, true).map_err(ExecutionFault::abi)?;
            env.charge_token_op()?;
            env.ledger.spend_allowance(this, c.from, sender, c.amount)?;
            env.ledger.transfer(this, c.from, c.to, c.amount)?;
            Ok(true.abi_encode().into())
        } else if sel == IERC20::balanceOfCall::SELECTOR {
            let c = IERC20::balanceOfCall::abi_decode(data, true).map_err(ExecutionFault::abi)?;
            Ok(env.ledger.balance_of(this, c.account).abi_encode().into())
        } else if sel == IERC20::allowanceCall::SELECTOR {
            let c = IERC20::allowanceCall::abi_decode(data, true).map_err(ExecutionFault::abi)?;
            Ok(env.ledger.allowance(this, c.owner, c.spender).abi_encode().into())
        } else {
            Err(ExecutionFault::revert("unknown selector"))
        }
    }
}
