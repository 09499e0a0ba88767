//! Client-side helpers: build guarded calldata and sign relayed batches.

pub mod encoder;
pub mod types;

#[cfg(test)]
mod tests;

pub use encoder::{
    address_of, encode_approve, encode_buy, encode_multi_swap, encode_transfer, relay_sign_hash,
    sign_relayed_transaction,
};
pub use types::{HopSpec, RelayScope, RouteSpec, SwapSpec};
