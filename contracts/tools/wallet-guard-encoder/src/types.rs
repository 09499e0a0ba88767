use alloy_primitives::{Address, U256};

/// One leg of a hop.
#[derive(Clone, Debug)]
pub struct RouteSpec {
    /// Adapter the aggregator calls.
    pub exchange: Address,
    /// Venue behind the adapter.
    pub target_exchange: Address,
    /// Basis points of the hop amount.
    pub percent: u64,
}

#[derive(Clone, Debug)]
pub struct HopSpec {
    pub to: Address,
    pub routes: Vec<RouteSpec>,
}

/// Swap as the client describes it, before ABI encoding.
#[derive(Clone, Debug)]
pub struct SwapSpec {
    pub from_token: Address,
    pub to_token: Address,
    pub from_amount: U256,
    /// Minimum the aggregator must deliver.
    pub min_amount: U256,
    /// Zero sends proceeds to the caller.
    pub beneficiary: Address,
    pub hops: Vec<HopSpec>,
}

impl SwapSpec {
    /// Single-hop, single-leg swap.
    pub fn direct(from_token: Address, to_token: Address, from_amount: U256, exchange: Address, target: Address) -> Self {
        Self {
            from_token,
            to_token,
            from_amount,
            min_amount: U256::from(1u64),
            beneficiary: Address::ZERO,
            hops: vec![HopSpec {
                to: to_token,
                routes: vec![RouteSpec {
                    exchange,
                    target_exchange: target,
                    percent: 10_000,
                }],
            }],
        }
    }
}

/// Deployment a signature is bound to.
#[derive(Clone, Copy, Debug)]
pub struct RelayScope {
    pub chain_id: u64,
    pub module: Address,
}
