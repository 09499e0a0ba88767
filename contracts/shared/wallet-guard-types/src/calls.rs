use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

use crate::abi::Transaction;

/// A single low-level call the wallet is asked to make.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub to: Address,
    #[serde(default)]
    pub value: U256,
    #[serde(default)]
    pub data: Bytes,
}

impl Call {
    pub fn new(to: Address, value: U256, data: impl Into<Bytes>) -> Self {
        Self { to, value, data: data.into() }
    }

    /// Pure native-asset transfer with no payload.
    pub fn value_transfer(to: Address, value: U256) -> Self {
        Self { to, value, data: Bytes::new() }
    }

    /// Keccak256 over `to || value || keccak256(data)`.
    pub fn digest(&self) -> B256 {
        let mut buf = Vec::with_capacity(20 + 32 + 32);
        buf.extend_from_slice(self.to.as_slice());
        buf.extend_from_slice(&self.value.to_be_bytes::<32>());
        buf.extend_from_slice(keccak256(&self.data).as_slice());
        keccak256(buf)
    }
}

impl From<&Call> for Transaction {
    fn from(call: &Call) -> Self {
        Transaction {
            to: call.to,
            value: call.value,
            data: call.data.clone(),
        }
    }
}

/// Keccak256 of the ordered per-call digests; identifies a batch in logs and reports.
pub fn batch_hash(calls: &[Call]) -> B256 {
    let mut buf = Vec::with_capacity(32 * calls.len());
    for call in calls {
        buf.extend_from_slice(call.digest().as_slice());
    }
    keccak256(buf)
}
