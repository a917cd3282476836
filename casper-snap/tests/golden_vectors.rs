//! Golden vector tests for the Casper snap.
//!
//! These tests verify correctness against known test vectors from:
//! - RFC 7693 (BLAKE2)
//! - BIP-32 test vector 2
//! - SLIP-0010 test vector 2 (ed25519)
//! - The casper-node example deploy (hash, body hash and approval)
//! - Unified transactions encoded with the Casper 2.0 call-table layout
//!
//! Run with: cargo test --test golden_vectors

use casper_snap::codec::{CLType, PublicKey, Reader};
use casper_snap::crypto::{self, Seed, TransactionSigner};
use casper_snap::decoder::{decode, DecodeOptions, TypedValue};
use casper_snap::{Bip32Path, Curve, EnvelopeKind, KeyringHost, MockPlatform, Transaction};
use hex_literal::hex;
use serde_json::json;

/// BIP-32 / SLIP-0010 test vector 2 seed.
const SEED_2: [u8; 64] = hex!(
    "fffcf9f6f3f0edeae7e4e1dedbd8d5d2cfccc9c6c3c0bdbab7b4b1aeaba8a5a2"
    "9f9c999693908d8a8784817e7b7875726f6c696663605d5a5754514e4b484542"
);

// =============================================================================
// Blake2b-256
// =============================================================================

mod blake2b {
    use super::*;

    #[test]
    fn test_empty() {
        assert_eq!(
            crypto::blake2b256(b""),
            hex!("0e5751c026e543b2e8ab2eb06099daa1d1e5df47778f7787faab45cdf12fe3a8")
        );
    }

    #[test]
    fn test_abc() {
        assert_eq!(
            crypto::blake2b256(b"abc"),
            hex!("bddd813c634239723171ef3fee98579b94964e3bb1cb3e427262c8c068d52319")
        );
    }

    #[test]
    fn test_account_hash_preimage() {
        let key = PublicKey::from_raw(Curve::Ed25519, &[0x11; 32]).unwrap();
        let mut preimage = b"ed25519".to_vec();
        preimage.push(0);
        preimage.extend_from_slice(&[0x11; 32]);
        assert_eq!(key.to_account_hash().as_bytes(), &crypto::blake2b256(&preimage));
    }
}

// =============================================================================
// Key derivation
// =============================================================================

mod derivation {
    use super::*;

    #[test]
    fn test_bip32_vector_2_master() {
        let seed = Seed::from_bytes(&SEED_2);
        let key = crypto::derive_secp256k1(&seed, &Bip32Path::from_slice(&[])).unwrap();
        assert_eq!(
            key.to_bytes().as_slice(),
            hex!("4b03d6fc340455b363f51020ad3ecca4f0850280cf436c70c727923f6db46c3e")
        );
    }

    #[test]
    fn test_slip10_vector_2_master() {
        let seed = Seed::from_bytes(&SEED_2);
        let key = crypto::derive_ed25519(&seed, &Bip32Path::from_slice(&[])).unwrap();
        assert_eq!(
            key.to_bytes(),
            hex!("171cb88b1b3c1db25add599712e36245d75bc65a1a5c9e18d76f9f2b1eab4012")
        );
        assert_eq!(
            key.verifying_key().to_bytes(),
            hex!("8fe9693f8fa62a4305a140b9764c5ee01e455963744fe18204b4fb948249308a")
        );

        let signer = crypto::Ed25519Signer::new(key);
        assert_eq!(
            signer.public_key().to_hex(),
            "018fe9693f8fa62a4305a140b9764c5ee01e455963744fe18204b4fb948249308a"
        );
    }

    #[tokio::test]
    async fn test_index_zero_and_one_differ() {
        for curve in ["ed25519", "secp256k1"] {
            let platform = MockPlatform::new().with_curve(curve);
            let a = platform.derive_address_key(506, 0).await.unwrap();
            let b = platform.derive_address_key(506, 0).await.unwrap();
            let c = platform.derive_address_key(506, 1).await.unwrap();
            assert_eq!(a.public_key, b.public_key, "{}", curve);
            assert_ne!(a.public_key, c.public_key, "{}", curve);
        }
    }
}

// =============================================================================
// Envelope hashes
// =============================================================================

mod envelope_hashes {
    use super::*;

    const ACCOUNT: &str = "01c9e33693951aaac23c49bee44ad6f863eedcd38c084a3a8f11237716a3df9c2c";

    #[test]
    fn test_node_example_deploy() {
        let deploy = json!({
            "hash": "5c9b3b099c1378aa8e4a5f07f59ff1fcdc69a83179427c7e67ae0377d94d93fa",
            "header": {
                "account": "01d9bf2148748a85c89da5aad8ee0b0fc2d105fd39d41a4c796536354f0ae2900c",
                "timestamp": "2020-11-17T00:39:24.072Z",
                "ttl": "1h",
                "gas_price": 1,
                "body_hash": "d53cf72d17278fd47d399013ca389c50d589352f1a12593c0b8e01872a641b50",
                "dependencies": ["0101010101010101010101010101010101010101010101010101010101010101"],
                "chain_name": "casper-example"
            },
            "payment": { "StoredContractByName": {
                "name": "casper-example",
                "entry_point": "example-entry-point",
                "args": [["amount", { "cl_type": "I32", "bytes": "e8030000", "parsed": 1000 }]]
            } },
            "session": { "Transfer": {
                "args": [["amount", { "cl_type": "I32", "bytes": "e8030000", "parsed": 1000 }]]
            } },
            "approvals": [{
                "signer": "01d9bf2148748a85c89da5aad8ee0b0fc2d105fd39d41a4c796536354f0ae2900c",
                "signature": "014c1a89f92e29dd74fc648f741137d9caf4edba97c5f9799ce0c9aa6b0c9b58db368c64098603dbecef645774c05dff057cb1f91f2cf390bbacce78aa6f084007"
            }]
        });

        let tx = Transaction::from_json(EnvelopeKind::Deploy, &deploy).unwrap();
        assert_eq!(
            tx.hash(),
            &hex!("5c9b3b099c1378aa8e4a5f07f59ff1fcdc69a83179427c7e67ae0377d94d93fa")
        );
        let Transaction::Deploy(inner) = &tx else {
            panic!("expected a deploy");
        };
        assert_eq!(
            inner.compute_body_hash(),
            hex!("d53cf72d17278fd47d399013ca389c50d589352f1a12593c0b8e01872a641b50")
        );
        tx.validate().unwrap();
    }

    #[test]
    fn test_stored_package_transaction() {
        let transaction = json!({
            "hash": "2c7d08d1a539754782a9daf7f8f71636fa7fd1f0dd6656d43bcaff908f9eeb4b",
            "payload": {
                "initiator_addr": { "PublicKey": ACCOUNT },
                "timestamp": "2024-05-01T12:00:00.000Z",
                "ttl": "30m",
                "chain_name": "casper",
                "pricing_mode": { "Fixed": {
                    "additional_computation_factor": 0,
                    "gas_price_tolerance": 5
                } },
                "fields": {
                    "args": { "Named": [
                        ["recipient", { "cl_type": "Key", "bytes": format!("00{}", "ab".repeat(32)) }],
                        ["amount", { "cl_type": "U512", "bytes": "0400e1f505" }]
                    ] },
                    "entry_point": { "Custom": "transfer" },
                    "scheduling": "Standard",
                    "target": { "Stored": {
                        "id": { "ByPackageHash": {
                            "addr": "cd".repeat(32),
                            "version": 2,
                            "protocol_version_major": 2
                        } },
                        "runtime": "VmCasperV1"
                    } }
                }
            },
            "approvals": []
        });

        let tx = Transaction::from_json(EnvelopeKind::TransactionV1, &transaction).unwrap();
        assert_eq!(
            tx.hash(),
            &hex!("2c7d08d1a539754782a9daf7f8f71636fa7fd1f0dd6656d43bcaff908f9eeb4b")
        );

        // Dropping the pinned protocol version changes the hash.
        let mut unpinned = transaction.clone();
        unpinned["payload"]["fields"]["target"]["Stored"]["id"]["ByPackageHash"]
            .as_object_mut()
            .unwrap()
            .remove("protocol_version_major");
        assert!(Transaction::from_json(EnvelopeKind::TransactionV1, &unpinned).is_err());
    }

    #[test]
    fn test_native_delegation_transaction() {
        let transaction = json!({
            "hash": "07fccb6345397a08b16f2dd769cc27eccaa881b588faee01fd9b9aa4299147ab",
            "payload": {
                "initiator_addr": { "PublicKey": ACCOUNT },
                "timestamp": "2024-06-01T00:00:00.000Z",
                "ttl": "2h",
                "chain_name": "casper-test",
                "pricing_mode": { "PaymentLimited": {
                    "payment_amount": 2500000000u64,
                    "gas_price_tolerance": 1,
                    "standard_payment": true
                } },
                "fields": {
                    "args": { "Named": [
                        ["delegator", { "cl_type": "PublicKey", "bytes": ACCOUNT }],
                        ["validator", { "cl_type": "PublicKey", "bytes": ACCOUNT }],
                        ["amount", { "cl_type": "U512", "bytes": "0500e8764817" }]
                    ] },
                    "entry_point": "Delegate",
                    "scheduling": { "FutureEra": 17000 },
                    "target": "Native"
                }
            },
            "approvals": []
        });

        let tx = Transaction::from_json(EnvelopeKind::TransactionV1, &transaction).unwrap();
        assert_eq!(
            tx.hash(),
            &hex!("07fccb6345397a08b16f2dd769cc27eccaa881b588faee01fd9b9aa4299147ab")
        );
    }
}

// =============================================================================
// bytesrepr values
// =============================================================================

mod values {
    use super::*;

    fn render(cl_type: CLType, bytes: &[u8]) -> String {
        let value = TypedValue::from_bytes(&cl_type, bytes).unwrap();
        decode(&value, &DecodeOptions::default()).to_string()
    }

    #[test]
    fn test_u512_five_cspr() {
        assert_eq!(render(CLType::U512, &hex!("0500f2052a01")), "5000000000");
    }

    #[test]
    fn test_string() {
        assert_eq!(render(CLType::String, &hex!("0500000068656c6c6f")), "hello");
    }

    #[test]
    fn test_u32_little_endian() {
        let bytes = hex!("07000000");
        let mut r = Reader::new(&bytes);
        assert_eq!(r.u32().unwrap(), 7);
        assert!(r.finish().is_ok());
    }
}
