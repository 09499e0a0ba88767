use std::collections::{BTreeMap, BTreeSet, HashMap};

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use wallet_guard_types::{Call, TradeFacts};

use crate::{errors::RegistryError, filters::Filter};

/// List every wallet starts with.
pub const DEFAULT_LIST: u8 = 0;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DappEntry {
    pub filter: Filter,
    pub enabled: bool,
    /// Registration becomes effective at this timestamp (list timelock).
    pub valid_after: u64,
}

impl DappEntry {
    pub fn is_live(&self, now: u64) -> bool {
        self.enabled && self.valid_after <= now
    }
}

#[derive(Clone, Debug)]
struct DappList {
    owner: Address,
    timelock: u64,
    entries: HashMap<Address, DappEntry>,
}

impl DappList {
    fn new(owner: Address) -> Self {
        Self {
            owner,
            timelock: 0,
            entries: HashMap::new(),
        }
    }
}

/// Dapp lists a wallet consults, in ascending id order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnabledLists(BTreeSet<u8>);

impl Default for EnabledLists {
    fn default() -> Self {
        Self(BTreeSet::from([DEFAULT_LIST]))
    }
}

impl EnabledLists {
    pub fn set(&mut self, list: u8, enabled: bool) {
        if enabled {
            self.0.insert(list);
        } else {
            self.0.remove(&list);
        }
    }

    pub fn contains(&self, list: u8) -> bool {
        self.0.contains(&list)
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().copied()
    }
}

/// How a call resolved against a wallet's enabled lists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Authorisation {
    /// Target carries the trusted marker in `list`.
    Trusted { list: u8 },
    /// The filter registered in `list` accepted the call.
    Accepted { list: u8 },
    /// Target is registered but every live filter rejected the call.
    Rejected,
    /// No live registration for the target.
    Unregistered,
}

impl Authorisation {
    pub fn is_authorised(&self) -> bool {
        matches!(self, Authorisation::Trusted { .. } | Authorisation::Accepted { .. })
    }
}

/// Policy table `(list, target) -> filter`.
#[derive(Clone, Debug)]
pub struct DappRegistry {
    admin: Address,
    lists: BTreeMap<u8, DappList>,
}

impl DappRegistry {
    /// Registry with the default list owned by `admin`.
    pub fn new(admin: Address) -> Self {
        let mut lists = BTreeMap::new();
        lists.insert(DEFAULT_LIST, DappList::new(admin));
        Self { admin, lists }
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    pub fn has_list(&self, list: u8) -> bool {
        self.lists.contains_key(&list)
    }

    pub fn list_owner(&self, list: u8) -> Option<Address> {
        self.lists.get(&list).map(|l| l.owner)
    }

    pub fn create_list(&mut self, caller: Address, list: u8, owner: Address) -> Result<(), RegistryError> {
        if caller != self.admin {
            return Err(RegistryError::NotAdmin(caller));
        }
        if self.lists.contains_key(&list) {
            return Err(RegistryError::ListExists(list));
        }
        self.lists.insert(list, DappList::new(owner));
        info!(list, %owner, "dapp list created");
        Ok(())
    }

    /// Delay between a registration and the moment it becomes effective.
    pub fn set_timelock(&mut self, caller: Address, list: u8, secs: u64) -> Result<(), RegistryError> {
        let dapps = self.owned_list_mut(caller, list)?;
        dapps.timelock = secs;
        info!(list, secs, "dapp list timelock changed");
        Ok(())
    }

    /// Map `target` to `filter` in `list`; the latest registration replaces any earlier one.
    pub fn register(&mut self, list: u8, target: Address, filter: Filter, now: u64) -> Result<(), RegistryError> {
        let dapps = self.lists.get_mut(&list).ok_or(RegistryError::UnknownList(list))?;
        let valid_after = now.saturating_add(dapps.timelock);
        info!(list, %target, filter = filter.name(), valid_after, "dapp registered");
        dapps.entries.insert(
            target,
            DappEntry {
                filter,
                enabled: true,
                valid_after,
            },
        );
        Ok(())
    }

    /// Governance entry point: [`register`](Self::register) restricted to the list owner.
    pub fn add_dapp(
        &mut self,
        caller: Address,
        list: u8,
        target: Address,
        filter: Filter,
        now: u64,
    ) -> Result<(), RegistryError> {
        self.owned_list_mut(caller, list)?;
        self.register(list, target, filter, now)
    }

    pub fn set_dapp_enabled(
        &mut self,
        caller: Address,
        list: u8,
        target: Address,
        enabled: bool,
    ) -> Result<(), RegistryError> {
        let dapps = self.owned_list_mut(caller, list)?;
        let entry = dapps
            .entries
            .get_mut(&target)
            .ok_or(RegistryError::UnknownDapp { list, target })?;
        entry.enabled = enabled;
        info!(list, %target, enabled, "dapp toggled");
        Ok(())
    }

    pub fn remove_dapp(&mut self, caller: Address, list: u8, target: Address) -> Result<(), RegistryError> {
        let dapps = self.owned_list_mut(caller, list)?;
        dapps
            .entries
            .remove(&target)
            .ok_or(RegistryError::UnknownDapp { list, target })?;
        info!(list, %target, "dapp removed");
        Ok(())
    }

    pub fn lookup(&self, list: u8, target: Address) -> Option<&DappEntry> {
        self.lists.get(&list)?.entries.get(&target)
    }

    /// Resolve `call` against every enabled list; any live filter that accepts authorises it.
    pub fn authorise(
        &self,
        lists: &EnabledLists,
        facts: &dyn TradeFacts,
        wallet: Address,
        call: &Call,
        now: u64,
    ) -> Authorisation {
        let mut registered = false;
        for list in lists.iter() {
            let Some(entry) = self.lookup(list, call.to) else {
                continue;
            };
            if !entry.is_live(now) {
                continue;
            }
            registered = true;
            if entry.filter.is_trusted() {
                return Authorisation::Trusted { list };
            }
            if entry.filter.validate(facts, wallet, call) {
                return Authorisation::Accepted { list };
            }
            debug!(list, to = %call.to, filter = entry.filter.name(), "filter rejected call");
        }
        if registered {
            Authorisation::Rejected
        } else {
            debug!(to = %call.to, "no live registration for target");
            Authorisation::Unregistered
        }
    }

    /// Whether `destination` carries the trusted marker in one of `lists`.
    pub fn is_trusted_destination(&self, lists: &EnabledLists, destination: Address, now: u64) -> bool {
        lists.iter().any(|list| {
            self.lookup(list, destination)
                .map(|e| e.is_live(now) && e.filter.is_trusted())
                .unwrap_or(false)
        })
    }

    fn owned_list_mut(&mut self, caller: Address, list: u8) -> Result<&mut DappList, RegistryError> {
        let dapps = self.lists.get_mut(&list).ok_or(RegistryError::UnknownList(list))?;
        if dapps.owner != caller {
            return Err(RegistryError::NotListOwner { caller, list });
        }
        Ok(dapps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::ApproveOnlyFilter;
    use alloy_primitives::U256;
    use alloy_sol_types::SolCall;
    use wallet_guard_types::IERC20;

    const ADMIN: Address = Address::repeat_byte(0xad);
    const WALLET: Address = Address::repeat_byte(0x01);
    const TOKEN: Address = Address::repeat_byte(0x0a);
    const PROXY: Address = Address::repeat_byte(0x0b);
    const RELAYER: Address = Address::repeat_byte(0x0c);

    struct NoFacts;
    impl TradeFacts for NoFacts {}

    fn approve(spender: Address) -> Call {
        Call::new(
            TOKEN,
            U256::ZERO,
            IERC20::approveCall { spender, amount: U256::from(1u64) }.abi_encode(),
        )
    }

    #[test]
    fn unregistered_targets_are_denied() {
        let reg = DappRegistry::new(ADMIN);
        let auth = reg.authorise(&EnabledLists::default(), &NoFacts, WALLET, &approve(PROXY), 0);
        assert_eq!(auth, Authorisation::Unregistered);
        assert!(!auth.is_authorised());
    }

    #[test]
    fn filter_decides_registered_targets() {
        let mut reg = DappRegistry::new(ADMIN);
        reg.add_dapp(ADMIN, DEFAULT_LIST, TOKEN, ApproveOnlyFilter::new(PROXY).into(), 0)
            .unwrap();
        let lists = EnabledLists::default();
        assert_eq!(
            reg.authorise(&lists, &NoFacts, WALLET, &approve(PROXY), 0),
            Authorisation::Accepted { list: DEFAULT_LIST }
        );
        assert_eq!(
            reg.authorise(&lists, &NoFacts, WALLET, &approve(RELAYER), 0),
            Authorisation::Rejected
        );
    }

    #[test]
    fn latest_registration_wins() {
        let mut reg = DappRegistry::new(ADMIN);
        reg.register(DEFAULT_LIST, TOKEN, ApproveOnlyFilter::new(RELAYER).into(), 0).unwrap();
        reg.register(DEFAULT_LIST, TOKEN, ApproveOnlyFilter::new(PROXY).into(), 0).unwrap();
        assert_eq!(
            reg.lookup(DEFAULT_LIST, TOKEN).map(|e| &e.filter),
            Some(&Filter::ApproveOnly(ApproveOnlyFilter::new(PROXY)))
        );
    }

    #[test]
    fn trusted_marker_and_refund_destination() {
        let mut reg = DappRegistry::new(ADMIN);
        reg.add_dapp(ADMIN, DEFAULT_LIST, RELAYER, Filter::Null, 0).unwrap();
        let lists = EnabledLists::default();
        let pay = Call::value_transfer(RELAYER, U256::from(5u64));
        assert_eq!(
            reg.authorise(&lists, &NoFacts, WALLET, &pay, 0),
            Authorisation::Trusted { list: DEFAULT_LIST }
        );
        assert!(reg.is_trusted_destination(&lists, RELAYER, 0));
        assert!(!reg.is_trusted_destination(&lists, PROXY, 0));
    }

    #[test]
    fn timelock_and_disable_gate_entries() {
        let mut reg = DappRegistry::new(ADMIN);
        reg.set_timelock(ADMIN, DEFAULT_LIST, 100).unwrap();
        reg.add_dapp(ADMIN, DEFAULT_LIST, RELAYER, Filter::Null, 1_000).unwrap();
        let lists = EnabledLists::default();
        let pay = Call::value_transfer(RELAYER, U256::from(5u64));
        assert_eq!(reg.authorise(&lists, &NoFacts, WALLET, &pay, 1_099), Authorisation::Unregistered);
        assert!(reg.authorise(&lists, &NoFacts, WALLET, &pay, 1_100).is_authorised());

        reg.set_dapp_enabled(ADMIN, DEFAULT_LIST, RELAYER, false).unwrap();
        assert!(!reg.authorise(&lists, &NoFacts, WALLET, &pay, 2_000).is_authorised());
        reg.remove_dapp(ADMIN, DEFAULT_LIST, RELAYER).unwrap();
        assert!(reg.lookup(DEFAULT_LIST, RELAYER).is_none());
    }

    #[test]
    fn lists_are_partitioned_and_owned() {
        let mut reg = DappRegistry::new(ADMIN);
        let curator = Address::repeat_byte(0xcc);
        assert_eq!(
            reg.create_list(curator, 1, curator),
            Err(RegistryError::NotAdmin(curator))
        );
        reg.create_list(ADMIN, 1, curator).unwrap();
        assert_eq!(reg.create_list(ADMIN, 1, curator), Err(RegistryError::ListExists(1)));
        assert_eq!(
            reg.add_dapp(ADMIN, 1, RELAYER, Filter::Null, 0),
            Err(RegistryError::NotListOwner { caller: ADMIN, list: 1 })
        );
        reg.add_dapp(curator, 1, RELAYER, Filter::Null, 0).unwrap();

        let pay = Call::value_transfer(RELAYER, U256::from(5u64));
        let mut lists = EnabledLists::default();
        assert!(!reg.authorise(&lists, &NoFacts, WALLET, &pay, 0).is_authorised());
        lists.set(1, true);
        assert_eq!(
            reg.authorise(&lists, &NoFacts, WALLET, &pay, 0),
            Authorisation::Trusted { list: 1 }
        );
        assert_eq!(reg.register(7, RELAYER, Filter::Null, 0), Err(RegistryError::UnknownList(7)));
    }
}
