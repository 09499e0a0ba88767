#[cfg(test)]
mod tests {
    use crate::encoder::{address_of, encode_buy, encode_multi_swap, relay_sign_hash, sign_relayed_transaction};
    use crate::types::{HopSpec, RelayScope, RouteSpec, SwapSpec};
    use alloy_primitives::{Address, U256};
    use alloy_sol_types::SolCall;
    use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
    use wallet_guard_types::{compose_nonce, Call, IAugustusSwapper, RelayedTransaction, SignerRequirement};

    fn key(byte: u8) -> SigningKey {
        SigningKey::from_slice(&[byte; 32]).unwrap()
    }

    fn tx() -> RelayedTransaction {
        RelayedTransaction {
            wallet: Address::repeat_byte(0x01),
            calls: vec![Call::value_transfer(Address::repeat_byte(0x02), U256::from(5u64))],
            nonce: compose_nonce(1_700_000_000, 1),
            signer_requirement: SignerRequirement::OwnerAndGuardians,
            signatures: Default::default(),
            gas_price: U256::from(1u64),
            gas_limit: 500_000,
            refund_token: Address::ZERO,
            refund_address: Address::ZERO,
            relayer: Address::repeat_byte(0x03),
        }
    }

    #[test]
    fn test_encode_multi_swap() {
        let a = Address::repeat_byte(0x0a);
        let b = Address::repeat_byte(0x0b);
        let spec = SwapSpec {
            from_token: a,
            to_token: b,
            from_amount: U256::from(100u64),
            min_amount: U256::from(90u64),
            beneficiary: Address::ZERO,
            hops: vec![HopSpec {
                to: b,
                routes: vec![
                    RouteSpec { exchange: Address::repeat_byte(1), target_exchange: Address::repeat_byte(2), percent: 6_000 },
                    RouteSpec { exchange: Address::repeat_byte(1), target_exchange: Address::repeat_byte(3), percent: 4_000 },
                ],
            }],
        };

        let encoded = encode_multi_swap(&spec);
        assert_eq!(encoded[..4], IAugustusSwapper::multiSwapCall::SELECTOR);
        let decoded = IAugustusSwapper::multiSwapCall::abi_decode(&encoded, true).unwrap();
        assert_eq!(decoded.path.len(), 1);
        assert_eq!(decoded.path[0].routes[1].percent, U256::from(4_000u64));
        assert_eq!(decoded.toAmount, U256::from(90u64));

        let buy = encode_buy(&spec);
        assert_eq!(buy[..4], IAugustusSwapper::buyCall::SELECTOR);
    }

    #[test]
    fn test_signatures_recover_in_order() {
        let owner = key(1);
        let guardian = key(2);
        let scope = RelayScope { chain_id: 1, module: Address::repeat_byte(0x4d) };
        let mut tx = tx();
        sign_relayed_transaction(&mut tx, &scope, &[&owner, &guardian]).unwrap();
        assert_eq!(tx.signature_count(), Some(2));

        let digest = relay_sign_hash(&scope, &tx);
        for (chunk, expected) in tx.signatures.chunks(65).zip([&owner, &guardian]) {
            let sig = Signature::from_slice(&chunk[..64]).unwrap();
            let recid = RecoveryId::from_byte(chunk[64] - 27).unwrap();
            let vk = VerifyingKey::recover_from_prehash(digest.as_slice(), &sig, recid).unwrap();
            assert_eq!(&vk, expected.verifying_key());
        }
    }

    #[test]
    fn test_digest_binds_scope_and_fields() {
        let scope = RelayScope { chain_id: 1, module: Address::repeat_byte(0x4d) };
        let base = relay_sign_hash(&scope, &tx());

        let other_chain = RelayScope { chain_id: 2, ..scope };
        assert_ne!(relay_sign_hash(&other_chain, &tx()), base);

        let mut changed = tx();
        changed.gas_limit += 1;
        assert_ne!(relay_sign_hash(&scope, &changed), base);

        // relayer and signatures are not signed over
        let mut relayed = tx();
        relayed.relayer = Address::repeat_byte(0x77);
        relayed.signatures = vec![1u8; 65].into();
        assert_eq!(relay_sign_hash(&scope, &relayed), base);
    }

    #[test]
    fn test_address_of_known_key() {
        let mut secret = [0u8; 32];
        secret[31] = 1;
        let key = SigningKey::from_slice(&secret).unwrap();
        assert_eq!(
            address_of(&key),
            "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf".parse::<Address>().unwrap()
        );
    }
}
