use alloy_primitives::{Address, Bytes, FixedBytes, U256};
use alloy_sol_types::SolCall;
use k256::{ecdsa::SigningKey, elliptic_curve::sec1::ToEncodedPoint, AffinePoint};
use sha3::{Digest, Keccak256};
use wallet_guard_types::{BuyRoute, IAugustusSwapper, Path, RelayedTransaction, Route, IERC20, SIGNATURE_LEN};

use crate::types::{RelayScope, SwapSpec};

pub fn encode_approve(spender: Address, amount: U256) -> Vec<u8> {
    IERC20::approveCall { spender, amount }.abi_encode()
}

pub fn encode_transfer(to: Address, amount: U256) -> Vec<u8> {
    IERC20::transferCall { to, amount }.abi_encode()
}

/// `multiSwap` calldata for `spec`.
pub fn encode_multi_swap(spec: &SwapSpec) -> Vec<u8> {
    let path = spec
        .hops
        .iter()
        .map(|hop| Path {
            to: hop.to,
            totalNetworkFee: U256::ZERO,
            routes: hop
                .routes
                .iter()
                .map(|r| Route {
                    exchange: r.exchange,
                    targetExchange: r.target_exchange,
                    percent: U256::from(r.percent),
                    payload: Bytes::new(),
                    networkFee: U256::ZERO,
                })
                .collect(),
        })
        .collect();

    IAugustusSwapper::multiSwapCall {
        fromToken: spec.from_token,
        toToken: spec.to_token,
        fromAmount: spec.from_amount,
        toAmount: spec.min_amount,
        expectedAmount: spec.min_amount,
        path,
        mintPrice: U256::ZERO,
        beneficiary: spec.beneficiary,
        donationPercentage: U256::ZERO,
        referrer: "wallet-guard".into(),
    }
    .abi_encode()
}

/// `buy` calldata over the first hop of `spec`.
pub fn encode_buy(spec: &SwapSpec) -> Vec<u8> {
    let route = spec
        .hops
        .first()
        .map(|hop| {
            hop.routes
                .iter()
                .map(|r| BuyRoute {
                    exchange: r.exchange,
                    targetExchange: r.target_exchange,
                    fromAmount: spec.from_amount * U256::from(r.percent) / U256::from(10_000u64),
                    toAmount: spec.min_amount * U256::from(r.percent) / U256::from(10_000u64),
                    payload: Bytes::new(),
                    networkFee: U256::ZERO,
                })
                .collect()
        })
        .unwrap_or_default();

    IAugustusSwapper::buyCall {
        fromToken: spec.from_token,
        toToken: spec.to_token,
        fromAmount: spec.from_amount,
        toAmount: spec.min_amount,
        expectedAmount: spec.min_amount,
        route,
        mintPrice: U256::ZERO,
        beneficiary: spec.beneficiary,
        donationPercentage: U256::ZERO,
        referrer: "wallet-guard".into(),
    }
    .abi_encode()
}

fn keccak256_bytes(bytes: &[u8]) -> FixedBytes<32> {
    let mut h = Keccak256::new();
    h.update(bytes);
    let out = h.finalize();
    let mut b = [0u8; 32];
    b.copy_from_slice(out.as_slice());
    FixedBytes(b)
}

/// Relay digest (must match the module's `relay_sign_hash`).
pub fn relay_sign_hash(scope: &RelayScope, tx: &RelayedTransaction) -> FixedBytes<32> {
    let call_data = tx.call_data();

    let mut buf = Vec::with_capacity(2 + 20 + 20 + 32 + call_data.len() + 32 * 4 + 20 + 20);
    buf.extend_from_slice(&[0x19, 0x00]);
    buf.extend_from_slice(scope.module.as_slice());
    buf.extend_from_slice(tx.wallet.as_slice());
    buf.extend_from_slice(&[0u8; 32]);
    buf.extend_from_slice(&call_data);
    buf.extend_from_slice(&U256::from(scope.chain_id).to_be_bytes::<32>());
    buf.extend_from_slice(&tx.nonce.to_be_bytes::<32>());
    buf.extend_from_slice(&tx.gas_price.to_be_bytes::<32>());
    buf.extend_from_slice(&U256::from(tx.gas_limit).to_be_bytes::<32>());
    buf.extend_from_slice(tx.refund_token.as_slice());
    buf.extend_from_slice(tx.refund_address.as_slice());
    let inner = keccak256_bytes(&buf);

    let mut wrapped = Vec::with_capacity(28 + 32);
    wrapped.extend_from_slice(b"\x19Ethereum Signed Message:\n32");
    wrapped.extend_from_slice(inner.as_slice());
    keccak256_bytes(&wrapped)
}

/// Sign `tx` with `signers` in the given order and write the concatenated signatures into it.
///
/// Order matters on-chain: owner first, then guardians by ascending address.
pub fn sign_relayed_transaction(
    tx: &mut RelayedTransaction,
    scope: &RelayScope,
    signers: &[&SigningKey],
) -> Result<(), k256::ecdsa::Error> {
    let digest = relay_sign_hash(scope, tx);
    let mut blob = Vec::with_capacity(signers.len() * SIGNATURE_LEN);
    for key in signers {
        let (signature, recid) = key.sign_prehash_recoverable(digest.as_slice())?;
        blob.extend_from_slice(&signature.to_bytes());
        blob.push(recid.to_byte() + 27);
    }
    tx.signatures = blob.into();
    Ok(())
}

/// Ethereum address controlled by `key`.
pub fn address_of(key: &SigningKey) -> Address {
    let affine: &AffinePoint = key.verifying_key().as_ref();
    let point = affine.to_encoded_point(false);
    let hash = keccak256_bytes(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}
