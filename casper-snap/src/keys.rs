//! Per-account key material.
//!
//! Address indices arrive as loosely typed JSON and are validated here
//! before anything touches the keyring. The host reports public keys in
//! its own encoding; they are normalized to Casper public keys.
//!
//! # Security
//!
//! - Private keys stay in `Zeroizing` buffers for the life of a request
//! - Key material is never logged

use casper_snap_common::{Curve, SnapError, HARDENED_OFFSET};
use serde_json::Value;
use zeroize::Zeroizing;

use crate::codec::PublicKey;
use crate::crypto::{self, TransactionSigner};
use crate::platform::KeyringHost;

/// Parses the `addressIndex` request field.
///
/// Absent or `null` means index 0. Only integral, non-negative numbers
/// below 2^31 are accepted.
pub fn parse_address_index(value: Option<&Value>) -> Result<u32, SnapError> {
    let number = match value {
        None | Some(Value::Null) => return Ok(0),
        Some(Value::Number(n)) => n,
        Some(_) => return Err(SnapError::InvalidIndex),
    };

    if let Some(index) = number.as_u64() {
        return u32::try_from(index)
            .ok()
            .filter(|&i| i < HARDENED_OFFSET)
            .ok_or(SnapError::InvalidIndex);
    }
    match number.as_f64() {
        Some(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f < HARDENED_OFFSET as f64 => {
            Ok(f as u32)
        }
        _ => Err(SnapError::InvalidIndex),
    }
}

/// Key material for one address index.
pub struct KeyMaterial {
    pub index: u32,
    pub curve: Curve,
    pub public_key: PublicKey,
    private_key: Option<Zeroizing<Vec<u8>>>,
}

impl KeyMaterial {
    /// Builds the signer for this key.
    pub fn signer(&self) -> Result<Box<dyn TransactionSigner>, SnapError> {
        let private_key = self
            .private_key
            .as_ref()
            .ok_or(SnapError::NoPrivateKey(self.index))?;
        let signer = crypto::signer_for(self.curve, private_key)?;
        if signer.public_key() != self.public_key {
            return Err(SnapError::Host(
                "private key does not match the reported public key".into(),
            ));
        }
        Ok(signer)
    }
}

/// Fetches and normalizes the key material for `index`.
pub async fn derive<H: KeyringHost + ?Sized>(
    host: &H,
    coin_type: u32,
    index: u32,
) -> Result<KeyMaterial, SnapError> {
    let host_key = host.derive_address_key(coin_type, index).await?;
    let curve = Curve::from_host_name(&host_key.curve)
        .ok_or_else(|| SnapError::UnsupportedCurve(host_key.curve.clone()))?;

    let public_key = normalize_public_key(curve, &host_key.public_key)
        .ok_or_else(|| SnapError::Host(format!("malformed {} public key", curve)))?;

    Ok(KeyMaterial {
        index,
        curve,
        public_key,
        private_key: host_key.private_key,
    })
}

fn normalize_public_key(curve: Curve, raw: &[u8]) -> Option<PublicKey> {
    match curve {
        Curve::Ed25519 => {
            let raw = match raw {
                [0, rest @ ..] if rest.len() == 32 => rest,
                _ => raw,
            };
            PublicKey::from_raw(curve, raw).ok()
        }
        Curve::Secp256k1 => {
            let compressed = crypto::compress_secp256k1(raw)?;
            PublicKey::from_raw(curve, &compressed).ok()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MockPlatform;
    use serde_json::json;

    #[test]
    fn test_parse_index() {
        assert_eq!(parse_address_index(None).unwrap(), 0);
        assert_eq!(parse_address_index(Some(&Value::Null)).unwrap(), 0);
        assert_eq!(parse_address_index(Some(&json!(7))).unwrap(), 7);
        assert_eq!(parse_address_index(Some(&json!(3.0))).unwrap(), 3);
        assert_eq!(
            parse_address_index(Some(&json!(0x7fff_ffffu32))).unwrap(),
            0x7fff_ffff
        );
    }

    #[test]
    fn test_parse_index_rejects() {
        for bad in [
            json!(-1),
            json!(1.5),
            json!("1"),
            json!(true),
            json!([0]),
            json!(0x8000_0000u32),
        ] {
            let err = parse_address_index(Some(&bad)).unwrap_err();
            assert_eq!(err, SnapError::InvalidIndex, "{}", bad);
            assert_eq!(
                err.to_string(),
                "Invalid BIP-32 index: Must be a non-negative integer."
            );
        }
    }

    #[tokio::test]
    async fn test_derive_is_deterministic() {
        let platform = MockPlatform::new();
        let a = derive(&platform, 506, 0).await.unwrap();
        let b = derive(&platform, 506, 0).await.unwrap();
        let c = derive(&platform, 506, 1).await.unwrap();
        assert_eq!(a.public_key, b.public_key);
        assert_ne!(a.public_key, c.public_key);
        assert_eq!(a.curve, Curve::Ed25519);
        assert_eq!(a.public_key.to_hex().len(), 66);
    }

    #[tokio::test]
    async fn test_derive_secp256k1() {
        let platform = MockPlatform::new().with_curve("secp256k1");
        let key = derive(&platform, 506, 0).await.unwrap();
        assert_eq!(key.curve, Curve::Secp256k1);
        assert!(key.public_key.to_hex().starts_with("02"));
        assert_eq!(key.public_key.to_hex().len(), 68);
        assert_eq!(key.signer().unwrap().public_key(), key.public_key);
    }

    #[tokio::test]
    async fn test_derive_unsupported_curve() {
        let platform = MockPlatform::new().with_curve("sr25519");
        let err = derive(&platform, 506, 0).await.err().unwrap();
        assert_eq!(err, SnapError::UnsupportedCurve("sr25519".into()));
        assert_eq!(
            err.to_string(),
            "Unsupported curve. Received sr25519. Only Secp256K1 && Ed25519 are supported."
        );
    }

    #[tokio::test]
    async fn test_no_private_key() {
        let mut platform = MockPlatform::new();
        platform.set_withhold_private_key(true);
        let key = derive(&platform, 506, 4).await.unwrap();
        let err = key.signer().err().unwrap();
        assert_eq!(
            err.to_string(),
            "No private key associated with the account 4."
        );
    }
}
