//! Per-target call filters.
//!
//! A filter is a pure decision over `(registries, wallet, call)`. The registry stores one
//! [`Filter`] per `(list, target)` and dispatches on the variant; there is no filter state
//! beyond its configuration.

mod approve_only;
mod swap_aggregator;

pub use approve_only::ApproveOnlyFilter;
pub use swap_aggregator::{SwapAggregatorFilter, TradableCheck};

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use wallet_guard_types::{Call, TradeFacts};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Filter {
    /// Trusted counterparty: every call is accepted without looking at the payload.
    Null,
    ApproveOnly(ApproveOnlyFilter),
    SwapAggregator(SwapAggregatorFilter),
}

impl Filter {
    pub fn validate(&self, facts: &dyn TradeFacts, wallet: Address, call: &Call) -> bool {
        match self {
            Filter::Null => true,
            Filter::ApproveOnly(f) => f.validate(call),
            Filter::SwapAggregator(f) => f.validate(facts, wallet, call),
        }
    }

    pub fn is_trusted(&self) -> bool {
        matches!(self, Filter::Null)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Filter::Null => "null",
            Filter::ApproveOnly(_) => "approve_only",
            Filter::SwapAggregator(_) => "swap_aggregator",
        }
    }
}

impl From<ApproveOnlyFilter> for Filter {
    fn from(f: ApproveOnlyFilter) -> Self {
        Filter::ApproveOnly(f)
    }
}

impl From<SwapAggregatorFilter> for Filter {
    fn from(f: SwapAggregatorFilter) -> Self {
        Filter::SwapAggregator(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    struct DenyAll;
    impl TradeFacts for DenyAll {}

    #[test]
    fn null_filter_accepts_anything() {
        let call = Call::new(Address::repeat_byte(1), U256::from(7u64), vec![0xde, 0xad]);
        assert!(Filter::Null.validate(&DenyAll, Address::repeat_byte(2), &call));
    }

    #[test]
    fn filters_round_trip_through_json_tags() {
        let json = r#"{"kind":"approve_only","spender":"0x1111111111111111111111111111111111111111"}"#;
        let filter: Filter = serde_json::from_str(json).unwrap();
        assert_eq!(
            filter,
            Filter::ApproveOnly(ApproveOnlyFilter::new(Address::repeat_byte(0x11)))
        );
        let filter: Filter = serde_json::from_str(r#"{"kind":"swap_aggregator"}"#).unwrap();
        assert_eq!(filter, Filter::SwapAggregator(SwapAggregatorFilter::default()));
        let filter: Filter = serde_json::from_str(r#"{"kind":"null"}"#).unwrap();
        assert!(filter.is_trusted());
    }
}
