use std::collections::HashSet;

use alloy_primitives::Address;
use tracing::info;

use crate::errors::RegistryError;

/// Adapters and venues the swap filter may route through.
#[derive(Clone, Debug)]
pub struct DexRegistry {
    admin: Address,
    authorised: HashSet<Address>,
}

impl DexRegistry {
    pub fn new(admin: Address) -> Self {
        Self {
            admin,
            authorised: HashSet::new(),
        }
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    pub fn set_authorised(
        &mut self,
        caller: Address,
        exchanges: &[Address],
        flags: &[bool],
    ) -> Result<(), RegistryError> {
        if caller != self.admin {
            return Err(RegistryError::NotAdmin(caller));
        }
        if exchanges.len() != flags.len() {
            return Err(RegistryError::LengthMismatch {
                addresses: exchanges.len(),
                flags: flags.len(),
            });
        }
        for (exchange, &authorised) in exchanges.iter().zip(flags) {
            if authorised {
                self.authorised.insert(*exchange);
            } else {
                self.authorised.remove(exchange);
            }
            info!(%exchange, authorised, "dex registry updated");
        }
        Ok(())
    }

    pub fn is_authorised(&self, exchange: Address) -> bool {
        self.authorised.contains(&exchange)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADMIN: Address = Address::repeat_byte(0xad);

    #[test]
    fn admin_toggles_are_idempotent() {
        let mut dex = DexRegistry::new(ADMIN);
        let a = Address::repeat_byte(1);
        let b = Address::repeat_byte(2);
        dex.set_authorised(ADMIN, &[a, b], &[true, true]).unwrap();
        dex.set_authorised(ADMIN, &[a, b], &[true, true]).unwrap();
        assert!(dex.is_authorised(a) && dex.is_authorised(b));
        dex.set_authorised(ADMIN, &[a], &[false]).unwrap();
        dex.set_authorised(ADMIN, &[a], &[false]).unwrap();
        assert!(!dex.is_authorised(a));
        assert!(dex.is_authorised(b));
        dex.set_authorised(ADMIN, &[a], &[true]).unwrap();
        assert!(dex.is_authorised(a));
    }

    #[test]
    fn rejects_non_admin_and_length_mismatch() {
        let mut dex = DexRegistry::new(ADMIN);
        let a = Address::repeat_byte(1);
        assert_eq!(
            dex.set_authorised(a, &[a], &[true]),
            Err(RegistryError::NotAdmin(a))
        );
        assert_eq!(
            dex.set_authorised(ADMIN, &[a], &[true, false]),
            Err(RegistryError::LengthMismatch { addresses: 1, flags: 2 })
        );
        assert!(!dex.is_authorised(a));
    }
}
