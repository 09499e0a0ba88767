//! Module configuration and the JSON policy document used to bootstrap registries.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::{
    errors::ConfigError,
    filters::Filter,
    gas::GasSchedule,
    registry::{Registries, DEFAULT_LIST},
    relay::SecurityWindow,
    wallet::WalletStore,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    pub chain_id: u64,
    /// Minimum age, in seconds, of a nonce's timestamp.
    pub security_period: u64,
    /// Seconds after `security_period` during which a nonce stays executable.
    pub security_window: u64,
    pub gas: GasSchedule,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            chain_id: 1,
            security_period: 24 * 60 * 60,
            security_window: 12 * 60 * 60,
            gas: GasSchedule::default(),
        }
    }
}

impl GuardConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security_window == 0 {
            return Err(ConfigError::Invalid("security_window must be non-zero".into()));
        }
        if self.security_period.checked_add(self.security_window).is_none() {
            return Err(ConfigError::Invalid("security_period + security_window overflows".into()));
        }
        Ok(())
    }

    pub fn security_window(&self) -> SecurityWindow {
        SecurityWindow::new(self.security_period, self.security_window)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSpec {
    pub id: u8,
    pub owner: Address,
    #[serde(default)]
    pub timelock: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DappSpec {
    #[serde(default)]
    pub list: u8,
    pub target: Address,
    pub filter: Filter,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSpec {
    pub address: Address,
    pub owner: Address,
    #[serde(default)]
    pub guardians: Vec<Address>,
    /// Extra dapp lists enabled on top of the default one.
    #[serde(default)]
    pub lists: Vec<u8>,
}

/// Everything needed to stand up a module: config, registry contents and wallets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDocument {
    pub admin: Address,
    #[serde(default)]
    pub config: GuardConfig,
    #[serde(default)]
    pub lists: Vec<ListSpec>,
    #[serde(default)]
    pub dapps: Vec<DappSpec>,
    #[serde(default)]
    pub exchanges: Vec<Address>,
    #[serde(default)]
    pub tradable_tokens: Vec<Address>,
    #[serde(default)]
    pub wallets: Vec<WalletSpec>,
}

impl PolicyDocument {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let doc: PolicyDocument = serde_json::from_str(json)?;
        doc.config.validate()?;
        Ok(doc)
    }

    /// Registries as described by the document. Registrations are live at `now`; list
    /// timelocks apply only to later additions.
    pub fn build_registries(&self, now: u64) -> Result<Registries, ConfigError> {
        let mut registries = Registries::new(self.admin);
        for list in &self.lists {
            if list.id != DEFAULT_LIST {
                registries.dapps.create_list(self.admin, list.id, list.owner)?;
            }
        }
        for dapp in &self.dapps {
            registries.dapps.register(dapp.list, dapp.target, dapp.filter.clone(), now)?;
        }
        for list in &self.lists {
            if list.timelock > 0 {
                let owner = registries.dapps.list_owner(list.id).unwrap_or(self.admin);
                registries.dapps.set_timelock(owner, list.id, list.timelock)?;
            }
        }

        let flags = vec![true; self.exchanges.len()];
        registries.dexes.set_authorised(self.admin, &self.exchanges, &flags)?;
        let flags = vec![true; self.tradable_tokens.len()];
        registries
            .tokens
            .set_tradable_for_token_list(self.admin, &self.tradable_tokens, &flags)?;
        Ok(registries)
    }

    pub fn build_wallets(&self, registries: &Registries) -> Result<WalletStore, ConfigError> {
        let mut wallets = WalletStore::default();
        for spec in &self.wallets {
            wallets.create(spec.address, spec.owner, spec.guardians.clone())?;
            for list in &spec.lists {
                wallets.toggle_list(&registries.dapps, spec.owner, spec.address, *list, true)?;
            }
        }
        Ok(wallets)
    }
}
