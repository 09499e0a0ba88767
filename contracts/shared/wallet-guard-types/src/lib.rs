//! Shared types for the wallet guard: the ABI surface the guard decodes, the call and
//! relayed-transaction shapes, and the read-only view filters take of the trade registries.

pub mod abi;
pub mod calls;
pub mod facts;
pub mod relay;

pub use abi::{
    BuyRoute, IAugustusSwapper, IRelayModule, ITokenTransferProxy, Path, Route, Transaction, IERC20,
    ETH_TOKEN, PERCENT_BASE,
};
pub use calls::{batch_hash, Call};
pub use facts::TradeFacts;
pub use relay::{compose_nonce, nonce_timestamp, RelayedTransaction, SignerRequirement, SIGNATURE_LEN};
