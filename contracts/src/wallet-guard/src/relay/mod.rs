//! Relay admission: who signed, and whether the nonce is fresh.

mod admission;
mod digest;
mod nonce;
mod signature;

pub use admission::{required_signatures, Accepted, RelayAdmission};
pub use digest::relay_sign_hash;
pub use nonce::{NonceBook, SecurityWindow};
pub use signature::{address_of, EcdsaVerifier, SignatureVerifier};
