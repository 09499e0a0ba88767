//! The guard module: relayer entry point and governance surface.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::Serialize;
use tracing::{info, warn};
use wallet_guard_types::{batch_hash, RelayedTransaction, SIGNATURE_LEN};

use crate::{
    chain::ExecutionContext,
    clock::Clock,
    config::GuardConfig,
    errors::{ConfigError, RegistryError, RelayError, WalletError},
    executor::{CallBatchExecutor, ExecutionOutcome},
    filters::Filter,
    gas::GasMeter,
    registry::Registries,
    relay::{relay_sign_hash, RelayAdmission, SignatureVerifier},
    wallet::{Wallet, WalletStore},
};

/// What the relayer gets back for an admitted batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RelayOutcome {
    pub success: bool,
    pub gas_used: u64,
    /// Failure reason; `"call not authorised"` for any authorisation failure.
    pub error: Option<String>,
    /// Amount of the refund token paid to the refund destination.
    pub refund: U256,
    pub return_data: Vec<Bytes>,
}

/// Relayed-batch guard over an execution context `C`.
///
/// The module's [`GuardConfig::gas`] is the single cost table: it is installed into the chain
/// on construction so per-call costs and the intrinsic and refund charges always agree.
pub struct GuardModule<C> {
    address: Address,
    config: GuardConfig,
    clock: Arc<dyn Clock>,
    registries: Registries,
    wallets: WalletStore,
    admission: RelayAdmission,
    chain: C,
}

impl<C: ExecutionContext> GuardModule<C> {
    pub fn new(
        address: Address,
        config: GuardConfig,
        registries: Registries,
        mut chain: C,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        chain.set_schedule(&config.gas);
        let admission = RelayAdmission::new(config.security_window());
        Ok(Self {
            address,
            config,
            clock,
            registries,
            wallets: WalletStore::default(),
            admission,
            chain,
        })
    }

    pub fn with_wallets(mut self, wallets: WalletStore) -> Self {
        self.wallets = wallets;
        self
    }

    pub fn with_verifier(mut self, verifier: Box<dyn SignatureVerifier>) -> Self {
        self.admission = RelayAdmission::with_verifier(self.config.security_window(), verifier);
        self
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    pub fn registries(&self) -> &Registries {
        &self.registries
    }

    pub fn wallet(&self, address: Address) -> Option<&Wallet> {
        self.wallets.get(address)
    }

    pub fn chain(&self) -> &C {
        &self.chain
    }

    pub fn chain_mut(&mut self) -> &mut C {
        &mut self.chain
    }

    pub fn last_nonce(&self, wallet: Address) -> U256 {
        self.admission.last_nonce(wallet)
    }

    /// Digest the signers of `tx` must sign.
    pub fn sign_hash(&self, tx: &RelayedTransaction) -> B256 {
        relay_sign_hash(self.address, self.config.chain_id, tx)
    }

    /// Admit, execute and settle a relayed batch.
    ///
    /// `Err` means nothing happened: no state change and the nonce is still usable.
    /// `Ok` means the nonce is consumed, whether or not the batch itself succeeded.
    pub fn submit_relayed_batch(&mut self, tx: &RelayedTransaction) -> Result<RelayOutcome, RelayError> {
        let now = self.clock.now();
        let wallet = self
            .wallets
            .get(tx.wallet)
            .cloned()
            .ok_or(RelayError::UnknownWallet(tx.wallet))?;
        let batch = batch_hash(&tx.calls);

        let mut gas = GasMeter::new(tx.gas_limit);
        let intrinsic = self
            .config
            .gas
            .intrinsic_cost(tx.signatures.len() / SIGNATURE_LEN, tx.call_data().len());
        if let Err(oog) = gas.charge(intrinsic) {
            warn!(wallet = %wallet.address, %batch, %oog, "relay rejected: intrinsic gas");
            return Err(oog.into());
        }

        let digest = self.sign_hash(tx);
        let accepted = self.admission.admit(&wallet, tx, &digest, now)?;

        if let Err(err) = self.check_refund_destination(&wallet, tx, now) {
            warn!(wallet = %wallet.address, %batch, %err, "relay aborted: refund");
            self.admission.rollback(wallet.address, accepted);
            return Err(err);
        }

        let before = self.chain.snapshot();
        let executor = CallBatchExecutor::new(&self.registries);
        let outcome = match executor.execute(&mut self.chain, &wallet, &tx.calls, &mut gas, now) {
            Ok(outcome) => outcome,
            Err(oog) => {
                warn!(wallet = %wallet.address, %batch, %oog, "relay aborted: out of gas");
                self.chain.restore(before);
                self.admission.rollback(wallet.address, accepted);
                return Err(oog.into());
            }
        };

        let refund = match self.pay_refund(&wallet, tx, gas.used()) {
            Ok(refund) => refund,
            Err(err) => {
                warn!(wallet = %wallet.address, %batch, %err, "relay aborted: refund");
                self.chain.restore(before);
                self.admission.rollback(wallet.address, accepted);
                return Err(err);
            }
        };

        let result = match outcome {
            ExecutionOutcome::Completed { return_data } => {
                info!(wallet = %wallet.address, %batch, gas_used = gas.used(), %refund, "batch executed");
                RelayOutcome {
                    success: true,
                    gas_used: gas.used(),
                    error: None,
                    refund,
                    return_data,
                }
            }
            ExecutionOutcome::Failed(err) => {
                info!(wallet = %wallet.address, %batch, index = err.index(), reason = err.reason(), "batch failed");
                RelayOutcome {
                    success: false,
                    gas_used: gas.used(),
                    error: Some(err.reason().to_string()),
                    refund,
                    return_data: Vec::new(),
                }
            }
        };
        Ok(result)
    }

    /// A paid refund may only go to a destination the wallet trusts.
    fn check_refund_destination(&self, wallet: &Wallet, tx: &RelayedTransaction, now: u64) -> Result<(), RelayError> {
        if tx.gas_price.is_zero() {
            return Ok(());
        }
        let destination = tx.refund_destination();
        if !self
            .registries
            .dapps
            .is_trusted_destination(&wallet.lists, destination, now)
        {
            return Err(RelayError::RefundNotAuthorised(destination));
        }
        Ok(())
    }

    /// Pay the relayer from the wallet for the gas the batch actually used.
    fn pay_refund(&mut self, wallet: &Wallet, tx: &RelayedTransaction, gas_used: u64) -> Result<U256, RelayError> {
        if tx.gas_price.is_zero() {
            return Ok(U256::ZERO);
        }
        let charged = gas_used
            .saturating_add(self.config.gas.refund_overhead)
            .min(tx.gas_limit);
        let refund = U256::from(charged).saturating_mul(tx.gas_price);
        self.chain
            .transfer(tx.refund_token, wallet.address, tx.refund_destination(), refund)
            .map_err(|fault| RelayError::RefundUnpaid(fault.to_string()))?;
        Ok(refund)
    }

    pub fn add_dapp(&mut self, caller: Address, list: u8, target: Address, filter: Filter) -> Result<(), RegistryError> {
        let now = self.clock.now();
        self.registries.dapps.add_dapp(caller, list, target, filter, now)
    }

    pub fn create_dapp_list(&mut self, caller: Address, list: u8, owner: Address) -> Result<(), RegistryError> {
        self.registries.dapps.create_list(caller, list, owner)
    }

    pub fn set_dapp_timelock(&mut self, caller: Address, list: u8, secs: u64) -> Result<(), RegistryError> {
        self.registries.dapps.set_timelock(caller, list, secs)
    }

    pub fn set_dapp_enabled(
        &mut self,
        caller: Address,
        list: u8,
        target: Address,
        enabled: bool,
    ) -> Result<(), RegistryError> {
        self.registries.dapps.set_dapp_enabled(caller, list, target, enabled)
    }

    pub fn remove_dapp(&mut self, caller: Address, list: u8, target: Address) -> Result<(), RegistryError> {
        self.registries.dapps.remove_dapp(caller, list, target)
    }

    pub fn set_authorised(&mut self, caller: Address, exchanges: &[Address], flags: &[bool]) -> Result<(), RegistryError> {
        self.registries.dexes.set_authorised(caller, exchanges, flags)
    }

    pub fn set_tradable_for_token_list(
        &mut self,
        caller: Address,
        tokens: &[Address],
        flags: &[bool],
    ) -> Result<(), RegistryError> {
        self.registries.tokens.set_tradable_for_token_list(caller, tokens, flags)
    }

    pub fn create_wallet(&mut self, address: Address, owner: Address, guardians: Vec<Address>) -> Result<(), WalletError> {
        self.wallets.create(address, owner, guardians)
    }

    pub fn toggle_dapp_list(&mut self, caller: Address, wallet: Address, list: u8, enabled: bool) -> Result<(), WalletError> {
        self.wallets
            .toggle_list(&self.registries.dapps, caller, wallet, list, enabled)
    }
}
