use alloy_primitives::{Address, B256, U256};
use tracing::{debug, warn};
use wallet_guard_types::{RelayedTransaction, SignerRequirement, SIGNATURE_LEN};

use crate::{
    errors::{RelayError, SignatureError},
    relay::{
        nonce::{NonceBook, SecurityWindow},
        signature::{EcdsaVerifier, SignatureVerifier},
    },
    wallet::Wallet,
};

/// Receipt of a successful admission; hands back the nonce mark it replaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct Accepted {
    pub previous_nonce: U256,
}

/// Signatures a batch must carry for `requirement`.
pub fn required_signatures(requirement: SignerRequirement, guardians: usize) -> usize {
    match requirement {
        SignerRequirement::Owner => 1,
        SignerRequirement::OwnerAndGuardians => 1 + guardians.div_ceil(2),
    }
}

/// Decides whether a relayed batch may run at all.
///
/// Order of checks: nonce freshness, then signer set. The nonce is consumed only once both
/// pass; a rejection leaves it untouched.
pub struct RelayAdmission {
    window: SecurityWindow,
    nonces: NonceBook,
    verifier: Box<dyn SignatureVerifier>,
}

impl RelayAdmission {
    pub fn new(window: SecurityWindow) -> Self {
        Self::with_verifier(window, Box::new(EcdsaVerifier))
    }

    pub fn with_verifier(window: SecurityWindow, verifier: Box<dyn SignatureVerifier>) -> Self {
        Self {
            window,
            nonces: NonceBook::default(),
            verifier,
        }
    }

    pub fn last_nonce(&self, wallet: Address) -> U256 {
        self.nonces.last(wallet)
    }

    pub fn admit(
        &mut self,
        wallet: &Wallet,
        tx: &RelayedTransaction,
        digest: &B256,
        now: u64,
    ) -> Result<Accepted, RelayError> {
        if let Err(err) = self.nonces.check(&self.window, wallet.address, tx.nonce, now) {
            warn!(wallet = %wallet.address, nonce = %tx.nonce, %err, "relay rejected: nonce");
            return Err(err.into());
        }
        if let Err(err) = self.verify_signers(wallet, tx, digest) {
            warn!(wallet = %wallet.address, %err, "relay rejected: signatures");
            return Err(err.into());
        }
        let previous_nonce = self.nonces.consume(wallet.address, tx.nonce);
        debug!(wallet = %wallet.address, nonce = %tx.nonce, "relay admitted");
        Ok(Accepted { previous_nonce })
    }

    /// Undo the nonce consumption of `accepted` after a fatal abort.
    pub fn rollback(&mut self, wallet: Address, accepted: Accepted) {
        debug!(%wallet, previous = %accepted.previous_nonce, "nonce rolled back");
        self.nonces.rollback(wallet, accepted.previous_nonce);
    }

    fn verify_signers(&self, wallet: &Wallet, tx: &RelayedTransaction, digest: &B256) -> Result<(), SignatureError> {
        let actual = tx.signature_count().ok_or(SignatureError::MalformedBlob)?;
        let expected = required_signatures(tx.signer_requirement, wallet.guardians().len());
        if actual != expected {
            return Err(SignatureError::WrongCount { expected, actual });
        }

        let mut last_guardian = Address::ZERO;
        for (i, chunk) in tx.signatures.chunks_exact(SIGNATURE_LEN).enumerate() {
            let mut sig = [0u8; SIGNATURE_LEN];
            sig.copy_from_slice(chunk);
            let signer = self
                .verifier
                .recover(digest, &sig)
                .ok_or(SignatureError::Unrecoverable(i))?;

            if i == 0 {
                if signer != wallet.owner {
                    return Err(SignatureError::NotOwner);
                }
                continue;
            }
            if signer == wallet.owner {
                return Err(SignatureError::OwnerAsGuardian(i));
            }
            if !wallet.is_guardian(signer) {
                return Err(SignatureError::NotGuardian(signer));
            }
            if signer <= last_guardian {
                return Err(SignatureError::Unordered);
            }
            last_guardian = signer;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::NonceError;
    use alloy_primitives::{keccak256, Bytes};
    use std::collections::HashMap;
    use wallet_guard_types::compose_nonce;

    const WALLET: Address = Address::repeat_byte(0x01);
    const OWNER: Address = Address::repeat_byte(0x02);
    const G1: Address = Address::repeat_byte(0x10);
    const G2: Address = Address::repeat_byte(0x20);
    const G3: Address = Address::repeat_byte(0x30);

    /// Signature byte 0 names the signer.
    struct TagVerifier(HashMap<u8, Address>);

    impl SignatureVerifier for TagVerifier {
        fn recover(&self, _digest: &B256, signature: &[u8; SIGNATURE_LEN]) -> Option<Address> {
            self.0.get(&signature[0]).copied()
        }
    }

    fn admission() -> RelayAdmission {
        let tags = HashMap::from([(1u8, OWNER), (2, G1), (3, G2), (4, G3)]);
        RelayAdmission::with_verifier(SecurityWindow::new(2, 2), Box::new(TagVerifier(tags)))
    }

    fn tx(requirement: SignerRequirement, tags: &[u8], nonce: U256) -> RelayedTransaction {
        let mut signatures = Vec::new();
        for tag in tags {
            let mut sig = [0u8; SIGNATURE_LEN];
            sig[0] = *tag;
            signatures.extend_from_slice(&sig);
        }
        RelayedTransaction {
            wallet: WALLET,
            calls: vec![],
            nonce,
            signer_requirement: requirement,
            signatures: Bytes::from(signatures),
            gas_price: U256::ZERO,
            gas_limit: 1_000_000,
            refund_token: Address::ZERO,
            refund_address: Address::ZERO,
            relayer: Address::ZERO,
        }
    }

    #[test]
    fn guardian_majority_rounds_up() {
        assert_eq!(required_signatures(SignerRequirement::Owner, 3), 1);
        assert_eq!(required_signatures(SignerRequirement::OwnerAndGuardians, 0), 1);
        assert_eq!(required_signatures(SignerRequirement::OwnerAndGuardians, 1), 2);
        assert_eq!(required_signatures(SignerRequirement::OwnerAndGuardians, 3), 3);
        assert_eq!(required_signatures(SignerRequirement::OwnerAndGuardians, 4), 3);
    }

    #[test]
    fn admits_owner_and_consumes_nonce() {
        let wallet = Wallet::new(WALLET, OWNER, vec![]);
        let mut adm = admission();
        let nonce = compose_nonce(100, 1);
        let digest = keccak256(b"d");
        let accepted = adm.admit(&wallet, &tx(SignerRequirement::Owner, &[1], nonce), &digest, 102).unwrap();
        assert_eq!(accepted.previous_nonce, U256::ZERO);
        assert_eq!(adm.last_nonce(WALLET), nonce);

        let replay = adm.admit(&wallet, &tx(SignerRequirement::Owner, &[1], nonce), &digest, 102);
        assert_eq!(replay, Err(RelayError::Nonce(NonceError::AlreadyUsed)));
    }

    #[test]
    fn signature_failures_leave_nonce_untouched() {
        let wallet = Wallet::new(WALLET, OWNER, vec![G1, G2, G3]);
        let mut adm = admission();
        let nonce = compose_nonce(100, 1);
        let digest = keccak256(b"d");
        let cases = [
            (vec![1u8], SignatureError::WrongCount { expected: 3, actual: 1 }),
            (vec![2, 1, 3], SignatureError::NotOwner),
            (vec![1, 3, 2], SignatureError::Unordered),
            (vec![1, 2, 2], SignatureError::Unordered),
            (vec![1, 2, 9], SignatureError::Unrecoverable(2)),
        ];
        for (tags, expected) in cases {
            let res = adm.admit(&wallet, &tx(SignerRequirement::OwnerAndGuardians, &tags, nonce), &digest, 102);
            assert_eq!(res, Err(RelayError::Signature(expected)));
        }
        assert_eq!(adm.last_nonce(WALLET), U256::ZERO);

        let ok = adm.admit(&wallet, &tx(SignerRequirement::OwnerAndGuardians, &[1, 2, 4], nonce), &digest, 102);
        assert!(ok.is_ok());
    }

    #[test]
    fn non_guardian_cosigner_is_rejected() {
        let wallet = Wallet::new(WALLET, OWNER, vec![G1]);
        let mut adm = admission();
        let res = adm.admit(
            &wallet,
            &tx(SignerRequirement::OwnerAndGuardians, &[1, 3], compose_nonce(100, 1)),
            &keccak256(b"d"),
            102,
        );
        assert_eq!(res, Err(RelayError::Signature(SignatureError::NotGuardian(G2))));
    }

    #[test]
    fn owner_key_cannot_fill_a_guardian_slot() {
        // built directly, bypassing the store's owner/guardian separation
        let wallet = Wallet::new(WALLET, OWNER, vec![OWNER]);
        let mut adm = admission();
        let res = adm.admit(
            &wallet,
            &tx(SignerRequirement::OwnerAndGuardians, &[1, 1], compose_nonce(100, 1)),
            &keccak256(b"d"),
            102,
        );
        assert_eq!(res, Err(RelayError::Signature(SignatureError::OwnerAsGuardian(1))));
        assert_eq!(adm.last_nonce(WALLET), U256::ZERO);
    }

    #[test]
    fn truncated_blob_is_malformed() {
        let wallet = Wallet::new(WALLET, OWNER, vec![]);
        let mut adm = admission();
        let mut t = tx(SignerRequirement::Owner, &[1], compose_nonce(100, 1));
        t.signatures = Bytes::from(vec![1u8; 64]);
        assert_eq!(
            adm.admit(&wallet, &t, &keccak256(b"d"), 102),
            Err(RelayError::Signature(SignatureError::MalformedBlob))
        );
    }

    #[test]
    fn nonce_is_checked_before_signatures() {
        let wallet = Wallet::new(WALLET, OWNER, vec![]);
        let mut adm = admission();
        let res = adm.admit(&wallet, &tx(SignerRequirement::Owner, &[9], compose_nonce(100, 1)), &keccak256(b"d"), 101);
        assert_eq!(res, Err(RelayError::Nonce(NonceError::TooNew { ready_at: 102 })));
    }

    #[test]
    fn rollback_reopens_the_nonce() {
        let wallet = Wallet::new(WALLET, OWNER, vec![]);
        let mut adm = admission();
        let t = tx(SignerRequirement::Owner, &[1], compose_nonce(100, 1));
        let digest = keccak256(b"d");
        let accepted = adm.admit(&wallet, &t, &digest, 102).unwrap();
        adm.rollback(WALLET, accepted);
        assert!(adm.admit(&wallet, &t, &digest, 102).is_ok());
    }
}
