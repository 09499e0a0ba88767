use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{SolCall, SolValue};
use wallet_guard_types::{Call, IAugustusSwapper, ITokenTransferProxy, ETH_TOKEN, PERCENT_BASE};

use crate::{
    chain::{Contract, Env, ExecutionFault, SwapVenue},
    decoder::{decode_multi_swap, selector, SwapIntent},
};

/// Pulls approved tokens from users on behalf of one aggregator.
#[derive(Clone, Copy, Debug)]
pub struct TokenTransferProxy {
    aggregator: Address,
}

impl TokenTransferProxy {
    pub fn new(aggregator: Address) -> Self {
        Self { aggregator }
    }
}

impl Contract for TokenTransferProxy {
    fn call(&self, env: &mut Env<'_>, this: Address, sender: Address, call: &Call) -> Result<Bytes, ExecutionFault> {
        let sel = selector(&call.data).map_err(|_| ExecutionFault::revert("missing selector"))?;
        if sel != ITokenTransferProxy::transferFromCall::SELECTOR {
            return Err(ExecutionFault::revert("unknown selector"));
        }
        if sender != self.aggregator {
            return Err(ExecutionFault::revert("caller is not the aggregator"));
        }
        let c = ITokenTransferProxy::transferFromCall::abi_decode(&call.data, true).map_err(ExecutionFault::abi)?;
        env.charge_token_op()?;
        env.ledger.spend_allowance(c.token, c.from, this, c.amount)?;
        env.ledger.transfer(c.token, c.from, c.to, c.amount)?;
        Ok(Bytes::new())
    }
}

/// Multi-route swap aggregator.
///
/// Routes through whitelisted adapters; each leg settles against the venue registered under
/// its `targetExchange`.
#[derive(Clone, Default)]
pub struct SwapAggregator {
    proxy: Address,
    adapters: HashSet<Address>,
    venues: HashMap<Address, Arc<dyn SwapVenue>>,
}

impl SwapAggregator {
    pub fn new(proxy: Address) -> Self {
        Self {
            proxy,
            ..Self::default()
        }
    }

    pub fn with_adapter(mut self, adapter: Address) -> Self {
        self.adapters.insert(adapter);
        self
    }

    pub fn with_venue(mut self, address: Address, venue: Arc<dyn SwapVenue>) -> Self {
        self.venues.insert(address, venue);
        self
    }

    fn multi_swap(&self, env: &mut Env<'_>, this: Address, sender: Address, call: &Call) -> Result<Bytes, ExecutionFault> {
        let intent = decode_multi_swap(&call.data).map_err(|e| ExecutionFault::revert(e.to_string()))?;

        if intent.from_token == ETH_TOKEN {
            if call.value != intent.from_amount {
                return Err(ExecutionFault::revert("incorrect msg.value"));
            }
        } else {
            if !call.value.is_zero() {
                return Err(ExecutionFault::revert("unexpected msg.value"));
            }
            let pull = ITokenTransferProxy::transferFromCall {
                token: intent.from_token,
                from: sender,
                to: this,
                amount: intent.from_amount,
            };
            env.call(this, &Call::new(self.proxy, U256::ZERO, pull.abi_encode()))?;
        }

        let received = self.route(env, this, &intent)?;
        if received < intent.to_amount {
            return Err(ExecutionFault::revert("received amount lower than minimum"));
        }

        let beneficiary = if intent.beneficiary == Address::ZERO {
            sender
        } else {
            intent.beneficiary
        };
        env.ledger.transfer(intent.to_token, this, beneficiary, received)?;
        Ok(received.abi_encode().into())
    }

    fn route(&self, env: &mut Env<'_>, this: Address, intent: &SwapIntent) -> Result<U256, ExecutionFault> {
        let mut token = intent.from_token;
        let mut amount = intent.from_amount;
        for hop in &intent.hops {
            let mut remaining = amount;
            let mut received = U256::ZERO;
            for (i, leg) in hop.legs.iter().enumerate() {
                env.charge_swap_leg()?;
                if !self.adapters.contains(&leg.exchange) {
                    return Err(ExecutionFault::revert("exchange not whitelisted"));
                }
                let venue = self
                    .venues
                    .get(&leg.target_exchange)
                    .ok_or_else(|| ExecutionFault::revert("unknown target exchange"))?;

                // last leg takes the rounding remainder
                let share = if i + 1 == hop.legs.len() {
                    remaining
                } else {
                    amount.saturating_mul(U256::from(leg.percent)) / U256::from(PERCENT_BASE)
                };
                remaining = remaining.saturating_sub(share);

                let out = venue
                    .amount_out(token, hop.to, share)
                    .ok_or_else(|| ExecutionFault::revert("pair not served by venue"))?;
                env.ledger.transfer(token, this, leg.target_exchange, share)?;
                env.ledger.transfer(hop.to, leg.target_exchange, this, out)?;
                received = received.saturating_add(out);
            }
            token = hop.to;
            amount = received;
        }
        Ok(amount)
    }
}

impl Contract for SwapAggregator {
    fn call(&self, env: &mut Env<'_>, this: Address, sender: Address, call: &Call) -> Result<Bytes, ExecutionFault> {
        let sel = selector(&call.data).map_err(|_| ExecutionFault::revert("missing selector"))?;
        if sel == IAugustusSwapper::multiSwapCall::SELECTOR {
            self.multi_swap(env, this, sender, call)
        } else if sel == IAugustusSwapper::getTokenTransferProxyCall::SELECTOR {
            Ok(self.proxy.abi_encode().into())
        } else {
            Err(ExecutionFault::revert("unsupported entry point"))
        }
    }
}
