use alloy_primitives::Address;
use thiserror::Error;

use crate::gas::OutOfGas;

/// Reason string surfaced for any call that fails authorisation.
pub const CALL_NOT_AUTHORISED: &str = "call not authorised";

/// Reason string surfaced for a revert that carried no message.
pub const EXECUTION_REVERTED: &str = "execution reverted";

/// Errors while decoding a call payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("payload shorter than a function selector")]
    NoSelector,
    #[error("unexpected selector 0x{}", hex::encode(.0))]
    UnexpectedSelector([u8; 4]),
    #[error("malformed arguments: {0}")]
    Malformed(String),
    #[error("invalid route: {0}")]
    InvalidRoute(&'static str),
}

/// Signer-set failures; fatal to the relay attempt, nonce untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("signature blob is not a whole number of 65-byte signatures")]
    MalformedBlob,
    #[error("wrong number of signatures: expected {expected}, got {actual}")]
    WrongCount { expected: usize, actual: usize },
    #[error("signature {0} could not be recovered")]
    Unrecoverable(usize),
    #[error("first signature is not from the wallet owner")]
    NotOwner,
    #[error("signer {0} is not a guardian of the wallet")]
    NotGuardian(Address),
    #[error("guardian signatures must be distinct and ordered by address")]
    Unordered,
    #[error("signature {0} is the owner's, counted again as a guardian")]
    OwnerAsGuardian(usize),
}

/// Nonce freshness failures; fatal to the relay attempt, nonce untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NonceError {
    #[error("nonce already used")]
    AlreadyUsed,
    #[error("nonce not executable before {ready_at}")]
    TooNew { ready_at: u64 },
    #[error("nonce expired at {expired_at}")]
    Expired { expired_at: u64 },
}

/// Failure of an admitted batch. The nonce stays consumed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("call {index}: {}", CALL_NOT_AUTHORISED)]
    NotAuthorised { index: usize },
    #[error("call {index} reverted: {reason}")]
    Reverted { index: usize, reason: String },
}

impl BatchError {
    /// Short machine-checkable reason reported back to the relayer.
    pub fn reason(&self) -> &str {
        match self {
            BatchError::NotAuthorised { .. } => CALL_NOT_AUTHORISED,
            BatchError::Reverted { reason, .. } if reason.is_empty() => EXECUTION_REVERTED,
            BatchError::Reverted { reason, .. } => reason,
        }
    }

    /// Position of the failing call in the batch.
    pub fn index(&self) -> usize {
        match self {
            BatchError::NotAuthorised { index } | BatchError::Reverted { index, .. } => *index,
        }
    }
}

/// Errors that abort a relay attempt as a whole; no state changes survive them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("unknown wallet {0}")]
    UnknownWallet(Address),
    #[error(transparent)]
    Signature(#[from] SignatureError),
    #[error(transparent)]
    Nonce(#[from] NonceError),
    #[error("refund destination {0} not authorised")]
    RefundNotAuthorised(Address),
    #[error("refund payment failed: {0}")]
    RefundUnpaid(String),
    #[error(transparent)]
    OutOfGas(#[from] OutOfGas),
}

/// Governance mutation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("caller {0} is not the registry admin")]
    NotAdmin(Address),
    #[error("caller {caller} does not own dapp list {list}")]
    NotListOwner { caller: Address, list: u8 },
    #[error("dapp list {0} already exists")]
    ListExists(u8),
    #[error("unknown dapp list {0}")]
    UnknownList(u8),
    #[error("dapp {target} is not registered in list {list}")]
    UnknownDapp { list: u8, target: Address },
    #[error("length mismatch: {addresses} addresses, {flags} flags")]
    LengthMismatch { addresses: usize, flags: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("wallet {0} already exists")]
    AlreadyExists(Address),
    #[error("unknown wallet {0}")]
    Unknown(Address),
    #[error("caller {0} is not the wallet owner")]
    NotOwner(Address),
    #[error("wallet owner must be a non-zero address")]
    ZeroOwner,
    #[error("owner {0} cannot also be a guardian")]
    OwnerIsGuardian(Address),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("failed parsing policy document: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Wallet(#[from] WalletError),
}
