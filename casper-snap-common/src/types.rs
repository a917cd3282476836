//! Core types for the Casper snap.
//!
//! These types are shared between the snap core and the client library.
//! All validation happens in the snap core after deserialization.

use core::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::HARDENED_OFFSET;

/// Maximum message size for `casper_signMessage` (64KB).
pub const MAX_MESSAGE_SIZE: usize = 65536;

/// Blake2b-256 digest (32 bytes).
pub type Hash256 = [u8; 32];

// =============================================================================
// Curves
// =============================================================================

/// Signature schemes supported by Casper accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Curve {
    Ed25519,
    Secp256k1,
}

impl Curve {
    /// Parses the curve name reported by the host keyring.
    pub fn from_host_name(name: &str) -> Option<Self> {
        match name {
            "ed25519" => Some(Curve::Ed25519),
            "secp256k1" => Some(Curve::Secp256k1),
            _ => None,
        }
    }

    /// Returns the curve name used by the host keyring.
    #[inline]
    pub fn host_name(self) -> &'static str {
        match self {
            Curve::Ed25519 => "ed25519",
            Curve::Secp256k1 => "secp256k1",
        }
    }

    /// Returns the Casper algorithm tag prefixed to keys and signatures.
    #[inline]
    pub fn tag(self) -> u8 {
        match self {
            Curve::Ed25519 => 0x01,
            Curve::Secp256k1 => 0x02,
        }
    }

    /// Returns the raw public key length for this curve.
    #[inline]
    pub fn public_key_len(self) -> usize {
        match self {
            Curve::Ed25519 => 32,
            Curve::Secp256k1 => 33,
        }
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.host_name())
    }
}

// =============================================================================
// BIP32 Path
// =============================================================================

/// BIP32 derivation path.
///
/// The path is stored as a vector of u32 values where hardened indices
/// have the 0x80000000 bit set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bip32Path {
    /// Path components (hardened indices have bit 31 set).
    pub components: Vec<u32>,
}

impl Bip32Path {
    /// Hardened index marker (bit 31).
    pub const HARDENED: u32 = HARDENED_OFFSET;

    /// Creates a path from a slice.
    pub fn from_slice(path: &[u32]) -> Self {
        Self {
            components: path.to_vec(),
        }
    }

    /// Creates the BIP-44 address path: m/44'/coin'/0'/0/index
    pub fn bip44(coin_type: u32, index: u32) -> Self {
        Self {
            components: vec![
                44 | Self::HARDENED,
                coin_type | Self::HARDENED,
                Self::HARDENED,
                0,
                index,
            ],
        }
    }

    /// Creates the fully hardened path used by SLIP-10 ed25519:
    /// m/44'/coin'/0'/0'/index'
    pub fn slip10(coin_type: u32, index: u32) -> Self {
        Self {
            components: Self::bip44(coin_type, index)
                .components
                .into_iter()
                .map(|c| c | Self::HARDENED)
                .collect(),
        }
    }

    /// Returns the path length.
    #[inline]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns true if the path is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Returns the path as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[u32] {
        &self.components
    }

    /// Returns true if every component is hardened.
    pub fn is_fully_hardened(&self) -> bool {
        self.components.iter().all(|c| c & Self::HARDENED != 0)
    }
}

impl fmt::Display for Bip32Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for c in &self.components {
            if c & Self::HARDENED != 0 {
                write!(f, "/{}'", c & !Self::HARDENED)?;
            } else {
                write!(f, "/{}", c)?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// Responses
// =============================================================================

/// Response to `casper_getAccount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    /// Casper public key hex, algorithm tag first.
    pub public_key: String,
}

/// Result of a signing request.
///
/// Exactly one shape is produced per response. A rejected dialog
/// serializes to the JSON literal `false`.
#[derive(Debug, Clone, PartialEq)]
pub enum SignatureResult {
    /// Tagged signature hex (`casper_signMessage`).
    Signature(String),
    /// Signed legacy deploy JSON.
    Deploy(Value),
    /// Signed unified transaction JSON.
    Transaction(Value),
    /// Recoverable failure reported to the caller.
    Error(String),
    /// User rejected the dialog.
    Rejected,
}

impl SignatureResult {
    /// Returns true if the user rejected the request.
    #[inline]
    pub fn is_rejected(&self) -> bool {
        matches!(self, SignatureResult::Rejected)
    }

    /// Returns the error message, if any.
    pub fn error(&self) -> Option<&str> {
        match self {
            SignatureResult::Error(msg) => Some(msg),
            _ => None,
        }
    }

    /// Converts to the JSON value returned to the host.
    pub fn to_value(&self) -> Value {
        let (key, value) = match self {
            SignatureResult::Rejected => return Value::Bool(false),
            SignatureResult::Signature(s) => ("signature", Value::String(s.clone())),
            SignatureResult::Deploy(d) => ("deploy", d.clone()),
            SignatureResult::Transaction(t) => ("transaction", t.clone()),
            SignatureResult::Error(e) => ("error", Value::String(e.clone())),
        };
        let mut map = serde_json::Map::new();
        map.insert(key.to_string(), value);
        Value::Object(map)
    }

    /// Parses a JSON value returned by the snap.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(false) => Some(SignatureResult::Rejected),
            Value::Object(map) => {
                if let Some(Value::String(e)) = map.get("error") {
                    Some(SignatureResult::Error(e.clone()))
                } else if let Some(Value::String(s)) = map.get("signature") {
                    Some(SignatureResult::Signature(s.clone()))
                } else if let Some(d) = map.get("deploy") {
                    Some(SignatureResult::Deploy(d.clone()))
                } else {
                    map.get("transaction")
                        .map(|t| SignatureResult::Transaction(t.clone()))
                }
            }
            _ => None,
        }
    }
}

impl Serialize for SignatureResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bip44_path() {
        let path = Bip32Path::bip44(506, 3);
        assert_eq!(path.to_string(), "m/44'/506'/0'/0/3");
        assert!(!path.is_fully_hardened());

        let path = Bip32Path::slip10(506, 3);
        assert_eq!(path.to_string(), "m/44'/506'/0'/0'/3'");
        assert!(path.is_fully_hardened());
        assert_eq!(path.len(), 5);
    }

    #[test]
    fn test_curve_names() {
        assert_eq!(Curve::from_host_name("ed25519"), Some(Curve::Ed25519));
        assert_eq!(Curve::from_host_name("secp256k1"), Some(Curve::Secp256k1));
        assert_eq!(Curve::from_host_name("Secp256K1"), None);
        assert_eq!(Curve::Secp256k1.tag(), 2);
    }

    #[test]
    fn test_signature_result_shapes() {
        assert_eq!(serde_json::to_value(SignatureResult::Rejected).unwrap(), json!(false));
        assert_eq!(
            serde_json::to_value(SignatureResult::Error("boom".into())).unwrap(),
            json!({ "error": "boom" })
        );
        assert_eq!(
            SignatureResult::Signature("01ab".into()).to_value(),
            json!({ "signature": "01ab" })
        );
    }

    #[test]
    fn test_signature_result_parse() {
        assert_eq!(
            SignatureResult::from_value(&json!(false)),
            Some(SignatureResult::Rejected)
        );
        assert_eq!(
            SignatureResult::from_value(&json!({ "deploy": { "hash": "00" } })),
            Some(SignatureResult::Deploy(json!({ "hash": "00" })))
        );
        assert_eq!(SignatureResult::from_value(&json!(true)), None);
    }

    #[test]
    fn test_account_response_camel_case() {
        let resp = AccountResponse {
            public_key: "01aa".into(),
        };
        assert_eq!(serde_json::to_value(resp).unwrap(), json!({ "publicKey": "01aa" }));
    }
}
