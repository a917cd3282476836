//! Casper public keys, signatures and account hashes.
//!
//! Keys and signatures carry a one-byte algorithm tag in front of the raw
//! bytes: 00 system, 01 ed25519, 02 secp256k1.

use core::fmt;

use casper_snap_common::{Curve, Hash256};

use super::bytesrepr::{CodecError, Reader, Writer};
use crate::crypto::blake2b256;

/// Prefix of formatted account hashes.
pub const ACCOUNT_HASH_PREFIX: &str = "account-hash-";

const SYSTEM_TAG: u8 = 0x00;
const ED25519_TAG: u8 = 0x01;
const SECP256K1_TAG: u8 = 0x02;

/// Casper public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    System,
    Ed25519([u8; 32]),
    Secp256k1([u8; 33]),
}

impl PublicKey {
    /// Builds a key from a curve and its raw bytes.
    pub fn from_raw(curve: Curve, raw: &[u8]) -> Result<Self, CodecError> {
        match curve {
            Curve::Ed25519 => raw
                .try_into()
                .map(PublicKey::Ed25519)
                .map_err(|_| CodecError::LengthOverflow(raw.len())),
            Curve::Secp256k1 => raw
                .try_into()
                .map(PublicKey::Secp256k1)
                .map_err(|_| CodecError::LengthOverflow(raw.len())),
        }
    }

    /// Parses tagged hex, e.g. `01` followed by 32 key bytes.
    pub fn from_hex(s: &str) -> Result<Self, CodecError> {
        let bytes = hex::decode(s)?;
        let mut r = Reader::new(&bytes);
        let key = Self::read(&mut r)?;
        r.finish()?;
        Ok(key)
    }

    /// Reads the tagged wire form.
    pub fn read(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        match r.u8()? {
            SYSTEM_TAG => Ok(PublicKey::System),
            ED25519_TAG => Ok(PublicKey::Ed25519(r.array()?)),
            SECP256K1_TAG => Ok(PublicKey::Secp256k1(r.array()?)),
            tag => Err(CodecError::InvalidTag(tag)),
        }
    }

    /// Appends the tagged wire form.
    pub fn write_bytes(&self, w: &mut Writer) {
        w.u8(self.tag()).raw(self.raw());
    }

    /// Returns the tagged wire form.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = Writer::new();
        self.write_bytes(&mut w);
        w.into_bytes()
    }

    #[inline]
    pub fn tag(&self) -> u8 {
        match self {
            PublicKey::System => SYSTEM_TAG,
            PublicKey::Ed25519(_) => ED25519_TAG,
            PublicKey::Secp256k1(_) => SECP256K1_TAG,
        }
    }

    /// Returns the key bytes without the tag.
    pub fn raw(&self) -> &[u8] {
        match self {
            PublicKey::System => &[],
            PublicKey::Ed25519(k) => k,
            PublicKey::Secp256k1(k) => k,
        }
    }

    /// Returns the curve, or `None` for the system key.
    pub fn curve(&self) -> Option<Curve> {
        match self {
            PublicKey::System => None,
            PublicKey::Ed25519(_) => Some(Curve::Ed25519),
            PublicKey::Secp256k1(_) => Some(Curve::Secp256k1),
        }
    }

    fn algorithm_name(&self) -> &'static str {
        match self {
            PublicKey::System => "system",
            PublicKey::Ed25519(_) => "ed25519",
            PublicKey::Secp256k1(_) => "secp256k1",
        }
    }

    /// Account hash: blake2b256(algorithm name || 0x00 || raw key).
    pub fn to_account_hash(&self) -> AccountHash {
        let name = self.algorithm_name().as_bytes();
        let mut preimage = Vec::with_capacity(name.len() + 1 + self.raw().len());
        preimage.extend_from_slice(name);
        preimage.push(0);
        preimage.extend_from_slice(self.raw());
        AccountHash(blake2b256(&preimage))
    }

    /// Tagged lower-case hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// =============================================================================
// Account Hash
// =============================================================================

/// 32-byte account identifier derived from a public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountHash(pub Hash256);

impl AccountHash {
    /// Parses `account-hash-<hex>`.
    pub fn from_formatted_str(s: &str) -> Result<Self, CodecError> {
        let hex_part = s
            .strip_prefix(ACCOUNT_HASH_PREFIX)
            .ok_or_else(|| CodecError::InvalidHex(format!("missing {} prefix", ACCOUNT_HASH_PREFIX)))?;
        Ok(AccountHash(parse_hash(hex_part)?))
    }

    /// Parses either a formatted account hash or a tagged public key hex.
    pub fn from_key_or_hash(s: &str) -> Result<Self, CodecError> {
        if s.starts_with(ACCOUNT_HASH_PREFIX) {
            Self::from_formatted_str(s)
        } else {
            Ok(PublicKey::from_hex(s)?.to_account_hash())
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> &Hash256 {
        &self.0
    }
}

impl fmt::Display for AccountHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", ACCOUNT_HASH_PREFIX, hex::encode(self.0))
    }
}

/// Decodes a 32-byte hex hash.
pub fn parse_hash(s: &str) -> Result<Hash256, CodecError> {
    let bytes = hex::decode(s)?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| CodecError::LengthOverflow(bytes.len()))
}

// =============================================================================
// Signature
// =============================================================================

/// Tagged Casper signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signature {
    Ed25519([u8; 64]),
    Secp256k1([u8; 64]),
}

impl Signature {
    pub fn new(curve: Curve, bytes: [u8; 64]) -> Self {
        match curve {
            Curve::Ed25519 => Signature::Ed25519(bytes),
            Curve::Secp256k1 => Signature::Secp256k1(bytes),
        }
    }

    /// Parses tagged hex.
    pub fn from_hex(s: &str) -> Result<Self, CodecError> {
        let bytes = hex::decode(s)?;
        let mut r = Reader::new(&bytes);
        let sig = match r.u8()? {
            ED25519_TAG => Signature::Ed25519(r.array()?),
            SECP256K1_TAG => Signature::Secp256k1(r.array()?),
            tag => return Err(CodecError::InvalidTag(tag)),
        };
        r.finish()?;
        Ok(sig)
    }

    pub fn curve(&self) -> Curve {
        match self {
            Signature::Ed25519(_) => Curve::Ed25519,
            Signature::Secp256k1(_) => Curve::Secp256k1,
        }
    }

    /// Returns the 64 signature bytes without the tag.
    pub fn raw(&self) -> &[u8; 64] {
        match self {
            Signature::Ed25519(s) | Signature::Secp256k1(s) => s,
        }
    }

    /// Tagged lower-case hex.
    pub fn to_hex(&self) -> String {
        let mut out = Vec::with_capacity(65);
        out.push(self.curve().tag());
        out.extend_from_slice(self.raw());
        hex::encode(out)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
