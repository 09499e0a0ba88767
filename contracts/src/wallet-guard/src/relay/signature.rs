//! Signer recovery.

use alloy_primitives::{keccak256, Address, B256};
use k256::{
    ecdsa::{RecoveryId, Signature, VerifyingKey},
    elliptic_curve::sec1::ToEncodedPoint,
    AffinePoint,
};
use wallet_guard_types::SIGNATURE_LEN;

/// Recovers the signer of a 32-byte digest.
pub trait SignatureVerifier: Send + Sync {
    fn recover(&self, digest: &B256, signature: &[u8; SIGNATURE_LEN]) -> Option<Address>;

    fn verify(&self, signature: &[u8; SIGNATURE_LEN], digest: &B256, signer: Address) -> bool {
        self.recover(digest, signature) == Some(signer)
    }
}

/// secp256k1 recovery over `r || s || v`, with v in {0, 1, 27, 28}.
#[derive(Clone, Copy, Debug, Default)]
pub struct EcdsaVerifier;

impl SignatureVerifier for EcdsaVerifier {
    fn recover(&self, digest: &B256, signature: &[u8; SIGNATURE_LEN]) -> Option<Address> {
        let v = match signature[64] {
            v @ (0 | 1) => v,
            v @ (27 | 28) => v - 27,
            _ => return None,
        };
        let sig = Signature::from_slice(&signature[..64]).ok()?;
        let recid = RecoveryId::from_byte(v)?;
        let key = VerifyingKey::recover_from_prehash(digest.as_slice(), &sig, recid).ok()?;
        Some(address_of(&key))
    }
}

/// Ethereum address of a public key: last 20 bytes of keccak256 over the uncompressed point.
pub fn address_of(key: &VerifyingKey) -> Address {
    let affine: &AffinePoint = key.as_ref();
    let point = affine.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::SigningKey;

    fn sign(key: &SigningKey, digest: &B256) -> [u8; SIGNATURE_LEN] {
        let (sig, recid) = key.sign_prehash_recoverable(digest.as_slice()).unwrap();
        let mut out = [0u8; SIGNATURE_LEN];
        out[..64].copy_from_slice(&sig.to_bytes());
        out[64] = recid.to_byte() + 27;
        out
    }

    #[test]
    fn recovers_signer_with_either_v_encoding() {
        let key = SigningKey::from_slice(&[7u8; 32]).unwrap();
        let signer = address_of(key.verifying_key());
        let digest = keccak256(b"batch");

        let mut sig = sign(&key, &digest);
        assert!(EcdsaVerifier.verify(&sig, &digest, signer));
        sig[64] -= 27;
        assert_eq!(EcdsaVerifier.recover(&digest, &sig), Some(signer));
    }

    #[test]
    fn rejects_unknown_v_and_wrong_digest() {
        let key = SigningKey::from_slice(&[7u8; 32]).unwrap();
        let signer = address_of(key.verifying_key());
        let digest = keccak256(b"batch");
        let mut sig = sign(&key, &digest);

        assert!(!EcdsaVerifier.verify(&sig, &keccak256(b"other"), signer));
        sig[64] = 5;
        assert_eq!(EcdsaVerifier.recover(&digest, &sig), None);
    }

    #[test]
    fn known_key_maps_to_known_address() {
        // secret key 1 -> generator point
        let mut secret = [0u8; 32];
        secret[31] = 1;
        let key = SigningKey::from_slice(&secret).unwrap();
        assert_eq!(
            address_of(key.verifying_key()),
            "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf".parse::<Address>().unwrap()
        );
    }
}
