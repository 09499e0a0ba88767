use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use tracing::debug;
use wallet_guard_types::{Call, TradeFacts, ETH_TOKEN};

use crate::decoder::{decode_multi_swap, SwapIntent};

/// Which swap legs must involve tradable tokens.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradableCheck {
    Off,
    /// Only the token the wallet receives.
    #[default]
    Destination,
    Both,
}

/// Guards the multi-route swap entry point of an aggregator.
///
/// Accepts exactly `multiSwap`: every adapter and venue on the route must be authorised, the
/// proceeds must go to the wallet (zero beneficiary or the wallet itself), tokens must pass the
/// configured tradability check and native value must match the sell side.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapAggregatorFilter {
    #[serde(default)]
    pub tradable_check: TradableCheck,
}

impl SwapAggregatorFilter {
    pub fn new(tradable_check: TradableCheck) -> Self {
        Self { tradable_check }
    }

    pub fn validate(&self, facts: &dyn TradeFacts, wallet: Address, call: &Call) -> bool {
        let intent = match decode_multi_swap(&call.data) {
            Ok(intent) => intent,
            Err(err) => {
                debug!(to = %call.to, %err, "swap filter: rejected payload");
                return false;
            }
        };

        if !has_valid_beneficiary(wallet, intent.beneficiary) {
            debug!(beneficiary = %intent.beneficiary, "swap filter: third-party beneficiary");
            return false;
        }
        if !has_matching_value(&intent, call.value) {
            debug!(value = %call.value, "swap filter: native value does not match the sell side");
            return false;
        }
        if !self.has_tradable_tokens(facts, &intent) {
            debug!(from = %intent.from_token, to = %intent.to_token, "swap filter: token not tradable");
            return false;
        }
        if let Some(exchange) = intent.exchanges().find(|e| !facts.is_authorised_exchange(*e)) {
            debug!(%exchange, "swap filter: exchange not authorised");
            return false;
        }
        true
    }

    fn has_tradable_tokens(&self, facts: &dyn TradeFacts, intent: &SwapIntent) -> bool {
        let tradable = |token: Address| token == ETH_TOKEN || facts.is_tradable(token);
        match self.tradable_check {
            TradableCheck::Off => true,
            TradableCheck::Destination => tradable(intent.to_token),
            TradableCheck::Both => tradable(intent.from_token) && tradable(intent.to_token),
        }
    }
}

fn has_valid_beneficiary(wallet: Address, beneficiary: Address) -> bool {
    beneficiary == Address::ZERO || beneficiary == wallet
}

fn has_matching_value(intent: &SwapIntent, value: U256) -> bool {
    if intent.from_token == ETH_TOKEN {
        value == intent.from_amount
    } else {
        value == U256::ZERO
    }
}
