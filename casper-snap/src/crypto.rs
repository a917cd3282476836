//! Cryptographic operations for the Casper snap.
//!
//! This module provides:
//! - Blake2b-256 hashing (Casper's digest)
//! - BIP32 (secp256k1) and SLIP-10 (ed25519) key derivation from a seed
//! - Ed25519 and secp256k1 ECDSA signing behind [`TransactionSigner`]
//! - Signature verification for approval validation
//!
//! # Security
//!
//! - All operations use constant-time implementations where available
//! - Private keys are zeroized on drop
//! - No secret-dependent memory access patterns

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use casper_snap_common::{Bip32Path, Curve, Hash256, SnapError};
use hmac::{Hmac, Mac};
use k256::ecdsa::{signature::Signer as _, signature::Verifier as _, SigningKey, VerifyingKey};
use sha2::Sha512;
use zeroize::{Zeroize, Zeroizing};

use crate::codec::{PublicKey, Signature};

// =============================================================================
// Blake2b-256
// =============================================================================

type Blake2b256 = Blake2b<U32>;

/// Blake2b with a 32-byte output, as used for every Casper hash.
pub fn blake2b256(data: &[u8]) -> Hash256 {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    hasher.finalize().into()
}

// =============================================================================
// Key Derivation
// =============================================================================

/// Seed for key derivation.
///
/// In production the host keyring owns the seed; this type backs the
/// host-side reference keyring and tests.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct Seed([u8; 64]);

impl Seed {
    /// Create from bytes.
    pub fn from_bytes(bytes: &[u8; 64]) -> Self {
        Self(*bytes)
    }

    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

/// Derive a secp256k1 private key from seed using a BIP32 path.
///
/// # Security
///
/// - Uses bip32 crate which provides constant-time operations
/// - Private key is zeroized on drop
pub fn derive_secp256k1(seed: &Seed, path: &Bip32Path) -> Result<SigningKey, SnapError> {
    use bip32::{ChildNumber, XPrv};

    let mut xprv = XPrv::new(seed.as_bytes())
        .map_err(|_| SnapError::Host("BIP32 master key derivation failed".into()))?;

    for &component in path.as_slice() {
        let hardened = component & Bip32Path::HARDENED != 0;
        let child = ChildNumber::new(component & !Bip32Path::HARDENED, hardened)
            .map_err(|_| SnapError::InvalidIndex)?;
        xprv = xprv
            .derive_child(child)
            .map_err(|_| SnapError::Host("BIP32 child derivation failed".into()))?;
    }

    let mut private_key_bytes = Zeroizing::new([0u8; 32]);
    private_key_bytes.copy_from_slice(&xprv.private_key().to_bytes());
    SigningKey::from_bytes((&private_key_bytes[..]).into())
        .map_err(|_| SnapError::Host("invalid secp256k1 key".into()))
}

/// Derive an ed25519 private key from seed using SLIP-10.
///
/// SLIP-10 ed25519 only defines hardened derivation; non-hardened
/// components are rejected.
pub fn derive_ed25519(
    seed: &Seed,
    path: &Bip32Path,
) -> Result<ed25519_dalek::SigningKey, SnapError> {
    if !path.is_fully_hardened() {
        return Err(SnapError::InvalidIndex);
    }

    let (mut key, mut chain_code) = slip10_step(b"ed25519 seed", seed.as_bytes())?;
    for &component in path.as_slice() {
        let mut data = Zeroizing::new(Vec::with_capacity(37));
        data.push(0u8);
        data.extend_from_slice(&key[..]);
        data.extend_from_slice(&component.to_be_bytes());
        let (next_key, next_chain) = slip10_step(&chain_code[..], &data)?;
        key = next_key;
        chain_code = next_chain;
    }

    Ok(ed25519_dalek::SigningKey::from_bytes(&key))
}

/// One HMAC-SHA512 step, split into (key, chain code).
fn slip10_step(
    hmac_key: &[u8],
    data: &[u8],
) -> Result<(Zeroizing<[u8; 32]>, Zeroizing<[u8; 32]>), SnapError> {
    let mut mac = Hmac::<Sha512>::new_from_slice(hmac_key)
        .map_err(|_| SnapError::Host("SLIP-10 HMAC init failed".into()))?;
    mac.update(data);
    let mut out = Zeroizing::new([0u8; 64]);
    out.copy_from_slice(&mac.finalize().into_bytes());

    let mut key = Zeroizing::new([0u8; 32]);
    let mut chain_code = Zeroizing::new([0u8; 32]);
    key.copy_from_slice(&out[..32]);
    chain_code.copy_from_slice(&out[32..]);
    Ok((key, chain_code))
}

/// Compressed SEC1 public key (33 bytes).
pub fn get_compressed_pubkey(signing_key: &SigningKey) -> [u8; 33] {
    let encoded = signing_key.verifying_key().to_encoded_point(true);
    let mut result = [0u8; 33];
    result.copy_from_slice(encoded.as_bytes());
    result
}

/// Compresses a SEC1 secp256k1 public key (33 or 65 bytes).
pub fn compress_secp256k1(sec1: &[u8]) -> Option<[u8; 33]> {
    let key = VerifyingKey::from_sec1_bytes(sec1).ok()?;
    let encoded = key.to_encoded_point(true);
    encoded.as_bytes().try_into().ok()
}

// =============================================================================
// Signing
// =============================================================================

/// Signs envelope hashes and messages with one private key.
pub trait TransactionSigner: Send + Sync {
    /// Casper public key matching the private key.
    fn public_key(&self) -> PublicKey;

    /// Signs `message` and returns the tagged signature.
    fn sign(&self, message: &[u8]) -> Result<Signature, SnapError>;
}

/// Ed25519 signer (pure Ed25519 over the message).
pub struct Ed25519Signer(ed25519_dalek::SigningKey);

impl Ed25519Signer {
    pub fn from_bytes(private_key: &[u8]) -> Result<Self, SnapError> {
        let bytes: Zeroizing<[u8; 32]> = Zeroizing::new(
            private_key
                .try_into()
                .map_err(|_| SnapError::Host("ed25519 private key must be 32 bytes".into()))?,
        );
        Ok(Self(ed25519_dalek::SigningKey::from_bytes(&bytes)))
    }

    pub fn new(key: ed25519_dalek::SigningKey) -> Self {
        Self(key)
    }
}

impl TransactionSigner for Ed25519Signer {
    fn public_key(&self) -> PublicKey {
        PublicKey::Ed25519(self.0.verifying_key().to_bytes())
    }

    fn sign(&self, message: &[u8]) -> Result<Signature, SnapError> {
        use ed25519_dalek::Signer as _;
        Ok(Signature::new(Curve::Ed25519, self.0.sign(message).to_bytes()))
    }
}

/// Secp256k1 signer: ECDSA over SHA-256(message), RFC 6979 nonces, low-S.
pub struct Secp256k1Signer(SigningKey);

impl Secp256k1Signer {
    pub fn from_bytes(private_key: &[u8]) -> Result<Self, SnapError> {
        SigningKey::from_slice(private_key)
            .map(Self)
            .map_err(|_| SnapError::Host("invalid secp256k1 private key".into()))
    }

    pub fn new(key: SigningKey) -> Self {
        Self(key)
    }
}

impl TransactionSigner for Secp256k1Signer {
    fn public_key(&self) -> PublicKey {
        PublicKey::Secp256k1(get_compressed_pubkey(&self.0))
    }

    fn sign(&self, message: &[u8]) -> Result<Signature, SnapError> {
        let sig: k256::ecdsa::Signature = self
            .0
            .try_sign(message)
            .map_err(|_| SnapError::SigningFailed)?;
        let mut bytes = [0u8; 64];
        bytes.copy_from_slice(&sig.to_bytes());
        Ok(Signature::new(Curve::Secp256k1, bytes))
    }
}

/// Builds the signer for a curve from raw private key bytes.
pub fn signer_for(curve: Curve, private_key: &[u8]) -> Result<Box<dyn TransactionSigner>, SnapError> {
    Ok(match curve {
        Curve::Ed25519 => Box::new(Ed25519Signer::from_bytes(private_key)?),
        Curve::Secp256k1 => Box::new(Secp256k1Signer::from_bytes(private_key)?),
    })
}

// =============================================================================
// Verification
// =============================================================================

/// Verifies a tagged signature over `message`.
///
/// Returns false on any curve mismatch or malformed key/signature.
pub fn verify(public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool {
    match (public_key, signature) {
        (PublicKey::Ed25519(pk), Signature::Ed25519(sig)) => {
            use ed25519_dalek::Verifier as _;
            let Ok(vk) = ed25519_dalek::VerifyingKey::from_bytes(pk) else {
                return false;
            };
            vk.verify(message, &ed25519_dalek::Signature::from_bytes(sig))
                .is_ok()
        }
        (PublicKey::Secp256k1(pk), Signature::Secp256k1(sig)) => {
            let Ok(vk) = VerifyingKey::from_sec1_bytes(pk) else {
                return false;
            };
            let Ok(sig) = k256::ecdsa::Signature::from_slice(sig) else {
                return false;
            };
            vk.verify(message, &sig).is_ok()
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    fn test_seed() -> Seed {
        // BIP39 "abandon abandon ... about"
        Seed::from_bytes(&hex!(
            "5eb00bbddcf069084889a8ab9155568165f5c453ccb85e70811aaed6f6da5fc1"
            "9a5ac40b389cd370d086206dec8aa6c43daea6690f20ad3d8d48b2d2ce9e38e4"
        ))
    }

    #[test]
    fn test_blake2b256_empty() {
        assert_eq!(
            blake2b256(b""),
            hex!("0e5751c026e543b2e8ab2eb06099daa1d1e5df47778f7787faab45cdf12fe3a8")
        );
    }

    #[test]
    fn test_slip10_vector_1() {
        // SLIP-10 test vector 1 for ed25519, master node
        let seed = hex!("000102030405060708090a0b0c0d0e0f");
        let (key, chain) = slip10_step(b"ed25519 seed", &seed).unwrap();
        assert_eq!(
            *key,
            hex!("2b4be7f19ee27bbf30c667b642d5f4aa69fd169872f8fc3059c08ebae2eb19e7")
        );
        assert_eq!(
            *chain,
            hex!("90046a93de5380a72b5e45010748567d5ea02bbf6522f979e05c0d8d8ca9fffb")
        );
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let seed = test_seed();
        let a = derive_secp256k1(&seed, &Bip32Path::bip44(506, 0)).unwrap();
        let b = derive_secp256k1(&seed, &Bip32Path::bip44(506, 0)).unwrap();
        let c = derive_secp256k1(&seed, &Bip32Path::bip44(506, 1)).unwrap();
        assert_eq!(a.to_bytes(), b.to_bytes());
        assert_ne!(a.to_bytes(), c.to_bytes());

        let a = derive_ed25519(&seed, &Bip32Path::slip10(506, 0)).unwrap();
        let b = derive_ed25519(&seed, &Bip32Path::slip10(506, 0)).unwrap();
        let c = derive_ed25519(&seed, &Bip32Path::slip10(506, 1)).unwrap();
        assert_eq!(a.to_bytes(), b.to_bytes());
        assert_ne!(a.to_bytes(), c.to_bytes());
    }

    #[test]
    fn test_ed25519_rejects_soft_path() {
        let seed = test_seed();
        assert!(derive_ed25519(&seed, &Bip32Path::bip44(506, 0)).is_err());
    }

    #[test]
    fn test_sign_and_verify_both_curves() {
        let seed = test_seed();
        let signers: Vec<Box<dyn TransactionSigner>> = vec![
            Box::new(Secp256k1Signer::new(
                derive_secp256k1(&seed, &Bip32Path::bip44(506, 0)).unwrap(),
            )),
            Box::new(Ed25519Signer::new(
                derive_ed25519(&seed, &Bip32Path::slip10(506, 0)).unwrap(),
            )),
        ];
        let hash = blake2b256(b"deploy header");
        for signer in signers {
            let pk = signer.public_key();
            let sig = signer.sign(&hash).unwrap();
            assert_eq!(sig.curve().tag(), pk.tag());
            assert!(verify(&pk, &hash, &sig));
            assert!(!verify(&pk, b"other message", &sig));
        }
    }

    #[test]
    fn test_secp256k1_signature_is_deterministic() {
        let signer = Secp256k1Signer::new(
            derive_secp256k1(&test_seed(), &Bip32Path::bip44(506, 0)).unwrap(),
        );
        assert_eq!(signer.sign(b"abc").unwrap(), signer.sign(b"abc").unwrap());
    }

    #[test]
    fn test_verify_rejects_curve_mismatch() {
        let pk = PublicKey::Ed25519([0u8; 32]);
        let sig = Signature::new(Curve::Secp256k1, [0u8; 64]);
        assert!(!verify(&pk, b"msg", &sig));
    }

    #[test]
    fn test_compress_secp256k1() {
        let key = derive_secp256k1(&test_seed(), &Bip32Path::bip44(506, 0)).unwrap();
        let uncompressed = key.verifying_key().to_encoded_point(false);
        assert_eq!(
            compress_secp256k1(uncompressed.as_bytes()),
            Some(get_compressed_pubkey(&key))
        );
        assert_eq!(compress_secp256k1(&[0u8; 10]), None);
    }

    #[test]
    fn test_signer_for_rejects_short_key() {
        assert!(signer_for(Curve::Ed25519, &[1u8; 16]).is_err());
        assert!(signer_for(Curve::Secp256k1, &[0u8; 32]).is_err());
    }
}
