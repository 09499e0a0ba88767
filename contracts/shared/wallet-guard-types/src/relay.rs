use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use serde::{Deserialize, Serialize};

use crate::{
    abi::{IRelayModule, Transaction},
    calls::Call,
};

/// Length of one `r || s || v` signature.
pub const SIGNATURE_LEN: usize = 65;

/// Which signer set must approve a relayed batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignerRequirement {
    /// The wallet owner alone.
    #[default]
    Owner,
    /// The owner plus a majority (rounded up) of the wallet's guardians.
    OwnerAndGuardians,
}

/// A signed batch handed to the module by a relayer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayedTransaction {
    pub wallet: Address,
    pub calls: Vec<Call>,
    /// `(timestamp << 128) | sequence`, see [`compose_nonce`].
    pub nonce: U256,
    #[serde(default)]
    pub signer_requirement: SignerRequirement,
    /// Concatenated 65-byte signatures, owner first then guardians by ascending address.
    #[serde(default)]
    pub signatures: Bytes,
    #[serde(default)]
    pub gas_price: U256,
    pub gas_limit: u64,
    pub refund_token: Address,
    /// Zero means "refund the relayer".
    #[serde(default)]
    pub refund_address: Address,
    /// Submitting party; not covered by the signatures.
    pub relayer: Address,
}

impl RelayedTransaction {
    /// ABI calldata the signers approve: `multiCall` or `multiCallWithGuardians`.
    pub fn call_data(&self) -> Vec<u8> {
        let transactions: Vec<Transaction> = self.calls.iter().map(Transaction::from).collect();
        match self.signer_requirement {
            SignerRequirement::Owner => IRelayModule::multiCallCall {
                wallet: self.wallet,
                transactions,
            }
            .abi_encode(),
            SignerRequirement::OwnerAndGuardians => IRelayModule::multiCallWithGuardiansCall {
                wallet: self.wallet,
                transactions,
            }
            .abi_encode(),
        }
    }

    /// Number of 65-byte signatures carried, or `None` if the blob is not a whole multiple.
    pub fn signature_count(&self) -> Option<usize> {
        if self.signatures.len() % SIGNATURE_LEN != 0 {
            return None;
        }
        Some(self.signatures.len() / SIGNATURE_LEN)
    }

    /// Refund destination after applying the "zero means relayer" rule.
    pub fn refund_destination(&self) -> Address {
        if self.refund_address == Address::ZERO {
            self.relayer
        } else {
            self.refund_address
        }
    }
}

/// Build a nonce embedding `timestamp` in the high 128 bits.
pub fn compose_nonce(timestamp: u64, sequence: u64) -> U256 {
    (U256::from(timestamp) << 128usize) | U256::from(sequence)
}

/// Timestamp embedded in a nonce; saturates so oversized values read as "far future".
pub fn nonce_timestamp(nonce: U256) -> u64 {
    u64::try_from(nonce >> 128usize).unwrap_or(u64::MAX)
}
