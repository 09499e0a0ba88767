//! Payload decoding for the filters.
//!
//! Filters never look at raw calldata beyond the selector: everything they check comes out of
//! the typed shapes below, and any decoding failure is reported as a [`DecodeError`] which the
//! filters turn into a rejection.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use wallet_guard_types::{IAugustusSwapper, IERC20, PERCENT_BASE};

use crate::errors::DecodeError;

/// ERC-20 calls the guard understands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenAction {
    Approve { spender: Address, amount: U256 },
    Transfer { to: Address, amount: U256 },
    TransferFrom { from: Address, to: Address, amount: U256 },
}

/// One leg of a hop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteLeg {
    /// Adapter the aggregator delegates to.
    pub exchange: Address,
    /// Venue the adapter trades against.
    pub target_exchange: Address,
    /// Share of the hop amount, in basis points of [`PERCENT_BASE`].
    pub percent: u64,
    pub payload: Bytes,
}

/// One sequential hop ending in `to`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwapHop {
    pub to: Address,
    pub legs: Vec<RouteLeg>,
}

/// Decoded multi-route swap request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwapIntent {
    pub from_token: Address,
    pub to_token: Address,
    pub from_amount: U256,
    pub to_amount: U256,
    pub beneficiary: Address,
    pub hops: Vec<SwapHop>,
}

impl SwapIntent {
    /// Every adapter and venue address referenced by the route, in route order.
    pub fn exchanges(&self) -> impl Iterator<Item = Address> + '_ {
        self.hops
            .iter()
            .flat_map(|hop| hop.legs.iter())
            .flat_map(|leg| [leg.exchange, leg.target_exchange])
    }
}

/// Leading selector of `data`.
pub fn selector(data: &[u8]) -> Result<[u8; 4], DecodeError> {
    if data.len() < 4 {
        return Err(DecodeError::NoSelector);
    }
    let mut sel = [0u8; 4];
    sel.copy_from_slice(&data[..4]);
    Ok(sel)
}

/// Decode an ERC-20 `approve`, `transfer` or `transferFrom`.
pub fn decode_token_action(data: &[u8]) -> Result<TokenAction, DecodeError> {
    let sel = selector(data)?;
    let action = if sel == IERC20::approveCall::SELECTOR {
        let c = IERC20::approveCall::abi_decode(data, true).map_err(malformed)?;
        TokenAction::Approve {
            spender: c.spender,
            amount: c.amount,
        }
    } else if sel == IERC20::transferCall::SELECTOR {
        let c = IERC20::transferCall::abi_decode(data, true).map_err(malformed)?;
        TokenAction::Transfer {
            to: c.to,
            amount: c.amount,
        }
    } else if sel == IERC20::transferFromCall::SELECTOR {
        let c = IERC20::transferFromCall::abi_decode(data, true).map_err(malformed)?;
        TokenAction::TransferFrom {
            from: c.from,
            to: c.to,
            amount: c.amount,
        }
    } else {
        return Err(DecodeError::UnexpectedSelector(sel));
    };
    Ok(action)
}

/// Decode a `multiSwap` call into a [`SwapIntent`].
///
/// Selector matching is exact: the `buy` entry point (or anything else) is an
/// [`DecodeError::UnexpectedSelector`] even when its arguments look alike. Structural checks on
/// the route happen here so a partial route never reaches a filter as valid.
pub fn decode_multi_swap(data: &[u8]) -> Result<SwapIntent, DecodeError> {
    let sel = selector(data)?;
    if sel != IAugustusSwapper::multiSwapCall::SELECTOR {
        return Err(DecodeError::UnexpectedSelector(sel));
    }
    let call = IAugustusSwapper::multiSwapCall::abi_decode(data, true).map_err(malformed)?;

    if call.path.is_empty() {
        return Err(DecodeError::InvalidRoute("empty path"));
    }

    let mut hops = Vec::with_capacity(call.path.len());
    for path in &call.path {
        if path.routes.is_empty() {
            return Err(DecodeError::InvalidRoute("hop without routes"));
        }
        let mut total = 0u64;
        let mut legs = Vec::with_capacity(path.routes.len());
        for route in &path.routes {
            let percent = u64::try_from(route.percent)
                .map_err(|_| DecodeError::InvalidRoute("percent out of range"))?;
            if percent == 0 {
                return Err(DecodeError::InvalidRoute("zero percent leg"));
            }
            total = total
                .checked_add(percent)
                .ok_or(DecodeError::InvalidRoute("percent out of range"))?;
            legs.push(RouteLeg {
                exchange: route.exchange,
                target_exchange: route.targetExchange,
                percent,
                payload: route.payload.clone(),
            });
        }
        if total != PERCENT_BASE {
            return Err(DecodeError::InvalidRoute("hop percentages do not cover the amount"));
        }
        hops.push(SwapHop { to: path.to, legs });
    }

    if hops.last().map(|h| h.to) != Some(call.toToken) {
        return Err(DecodeError::InvalidRoute("last hop does not end in the destination token"));
    }

    Ok(SwapIntent {
        from_token: call.fromToken,
        to_token: call.toToken,
        from_amount: call.fromAmount,
        to_amount: call.toAmount,
        beneficiary: call.beneficiary,
        hops,
    })
}

fn malformed(err: alloy_sol_types::Error) -> DecodeError {
    DecodeError::Malformed(err.to_string())
}
