use std::collections::HashMap;

use alloy_primitives::Address;
use tracing::info;

use crate::{
    errors::{RegistryError, WalletError},
    registry::{DappRegistry, EnabledLists},
};

/// A guarded wallet: its signers and the dapp lists it consults.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Wallet {
    pub address: Address,
    pub owner: Address,
    guardians: Vec<Address>,
    pub lists: EnabledLists,
}

impl Wallet {
    pub fn new(address: Address, owner: Address, mut guardians: Vec<Address>) -> Self {
        guardians.sort();
        guardians.dedup();
        Self {
            address,
            owner,
            guardians,
            lists: EnabledLists::default(),
        }
    }

    /// Guardians in ascending address order.
    pub fn guardians(&self) -> &[Address] {
        &self.guardians
    }

    pub fn is_guardian(&self, who: Address) -> bool {
        self.guardians.binary_search(&who).is_ok()
    }
}

#[derive(Clone, Debug, Default)]
pub struct WalletStore {
    wallets: HashMap<Address, Wallet>,
}

impl WalletStore {
    pub fn create(&mut self, address: Address, owner: Address, guardians: Vec<Address>) -> Result<(), WalletError> {
        if owner == Address::ZERO {
            return Err(WalletError::ZeroOwner);
        }
        if guardians.contains(&owner) {
            return Err(WalletError::OwnerIsGuardian(owner));
        }
        if self.wallets.contains_key(&address) {
            return Err(WalletError::AlreadyExists(address));
        }
        let wallet = Wallet::new(address, owner, guardians);
        info!(wallet = %address, %owner, guardians = wallet.guardians.len(), "wallet created");
        self.wallets.insert(address, wallet);
        Ok(())
    }

    pub fn get(&self, address: Address) -> Option<&Wallet> {
        self.wallets.get(&address)
    }

    /// Enable or disable a dapp list for a wallet; only its owner may do so.
    pub fn toggle_list(
        &mut self,
        dapps: &DappRegistry,
        caller: Address,
        wallet: Address,
        list: u8,
        enabled: bool,
    ) -> Result<(), WalletError> {
        if !dapps.has_list(list) {
            return Err(RegistryError::UnknownList(list).into());
        }
        let entry = self.wallets.get_mut(&wallet).ok_or(WalletError::Unknown(wallet))?;
        if entry.owner != caller {
            return Err(WalletError::NotOwner(caller));
        }
        entry.lists.set(list, enabled);
        info!(%wallet, list, enabled, "dapp list toggled for wallet");
        Ok(())
    }
}
