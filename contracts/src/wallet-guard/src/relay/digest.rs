//! Message signed by the wallet owner (and guardians) to approve a relayed batch.

use alloy_primitives::{keccak256, Address, B256, U256};
use wallet_guard_types::RelayedTransaction;

/// Signed-message hash of a relayed batch.
///
/// Inner hash (packed encoding):
/// - `0x19 0x00`
/// - `address module`
/// - `address wallet`
/// - `uint256 value` (always 0)
/// - `bytes calldata` (`multiCall` / `multiCallWithGuardians`)
/// - `uint256 chainId`, `uint256 nonce`, `uint256 gasPrice`, `uint256 gasLimit`
/// - `address refundToken`, `address refundAddress`
///
/// The result is wrapped as `keccak256("\x19Ethereum Signed Message:\n32" || inner)`.
pub fn relay_sign_hash(module: Address, chain_id: u64, tx: &RelayedTransaction) -> B256 {
    let call_data = tx.call_data();

    let mut buf = Vec::with_capacity(2 + 20 + 20 + 32 + call_data.len() + 32 * 4 + 20 + 20);
    buf.extend_from_slice(&[0x19, 0x00]);
    buf.extend_from_slice(module.as_slice());
    buf.extend_from_slice(tx.wallet.as_slice());
    buf.extend_from_slice(&U256::ZERO.to_be_bytes::<32>());
    buf.extend_from_slice(&call_data);
    buf.extend_from_slice(&U256::from(chain_id).to_be_bytes::<32>());
    buf.extend_from_slice(&tx.nonce.to_be_bytes::<32>());
    buf.extend_from_slice(&tx.gas_price.to_be_bytes::<32>());
    buf.extend_from_slice(&U256::from(tx.gas_limit).to_be_bytes::<32>());
    buf.extend_from_slice(tx.refund_token.as_slice());
    buf.extend_from_slice(tx.refund_address.as_slice());
    let inner = keccak256(buf);

    let mut wrapped = Vec::with_capacity(28 + 32);
    wrapped.extend_from_slice(b"\x19Ethereum Signed Message:\n32");
    wrapped.extend_from_slice(inner.as_slice());
    keccak256(wrapped)
}
