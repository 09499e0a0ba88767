//! Registries consulted when authorising a call.

mod dapp;
mod dex;
mod token_price;

pub use dapp::{Authorisation, DappEntry, DappRegistry, EnabledLists, DEFAULT_LIST};
pub use dex::DexRegistry;
pub use token_price::TokenPriceRegistry;

use alloy_primitives::Address;
use wallet_guard_types::{Call, TradeFacts};

/// The three registries, owned together by the module.
#[derive(Clone, Debug)]
pub struct Registries {
    pub dapps: DappRegistry,
    pub dexes: DexRegistry,
    pub tokens: TokenPriceRegistry,
}

impl Registries {
    /// Empty registries administered by `admin`.
    pub fn new(admin: Address) -> Self {
        Self {
            dapps: DappRegistry::new(admin),
            dexes: DexRegistry::new(admin),
            tokens: TokenPriceRegistry::new(admin),
        }
    }

    pub fn authorise(&self, lists: &EnabledLists, wallet: Address, call: &Call, now: u64) -> Authorisation {
        self.dapps.authorise(lists, self, wallet, call, now)
    }
}

impl TradeFacts for Registries {
    fn is_authorised_exchange(&self, exchange: Address) -> bool {
        self.dexes.is_authorised(exchange)
    }

    fn is_tradable(&self, token: Address) -> bool {
        self.tokens.is_tradable(token)
    }
}
