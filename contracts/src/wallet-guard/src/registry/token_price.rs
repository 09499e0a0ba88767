use std::collections::BTreeSet;

use alloy_primitives::Address;
use tracing::info;

use crate::errors::RegistryError;

/// Tokens vetted for trading.
#[derive(Clone, Debug)]
pub struct TokenPriceRegistry {
    admin: Address,
    tradable: BTreeSet<Address>,
}

impl TokenPriceRegistry {
    pub fn new(admin: Address) -> Self {
        Self {
            admin,
            tradable: BTreeSet::new(),
        }
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    pub fn set_tradable_for_token_list(
        &mut self,
        caller: Address,
        tokens: &[Address],
        flags: &[bool],
    ) -> Result<(), RegistryError> {
        if caller != self.admin {
            return Err(RegistryError::NotAdmin(caller));
        }
        if tokens.len() != flags.len() {
            return Err(RegistryError::LengthMismatch {
                addresses: tokens.len(),
                flags: flags.len(),
            });
        }
        for (token, &tradable) in tokens.iter().zip(flags) {
            if tradable {
                self.tradable.insert(*token);
            } else {
                self.tradable.remove(token);
            }
            info!(%token, tradable, "token tradability updated");
        }
        Ok(())
    }

    pub fn is_tradable(&self, token: Address) -> bool {
        self.tradable.contains(&token)
    }
}
