//! Error types for the Casper snap.
//!
//! Some failures are thrown to the host as JSON-RPC errors, others are
//! folded into an `{error}` result object. [`SnapError::is_thrown`] draws
//! that line in one place.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JSON-RPC error code the host uses for internal errors.
pub const INTERNAL_ERROR_CODE: i64 = -32603;

/// Error conditions raised by the snap.
///
/// User rejection is not an error: it is reported as a `false` result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapError {
    /// Address index is not a non-negative integer below 2^31.
    #[error("Invalid BIP-32 index: Must be a non-negative integer.")]
    InvalidIndex,

    /// Host returned key material on a curve we cannot sign with.
    #[error("Unsupported curve. Received {0}. Only Secp256K1 && Ed25519 are supported.")]
    UnsupportedCurve(String),

    /// Request payload could not be parsed or failed a consistency check.
    #[error("{0}")]
    MalformedInput(String),

    /// Host exposed only public material for the index.
    #[error("No private key associated with the account {0}.")]
    NoPrivateKey(u32),

    /// Signed envelope failed re-validation.
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// Unknown RPC method.
    #[error("Method not found.")]
    MethodNotFound,

    /// Signature could not be produced.
    #[error("Signing failed")]
    SigningFailed,

    /// Host capability (keyring, dialog) failed.
    #[error("Host error: {0}")]
    Host(String),
}

impl SnapError {
    /// Returns true if this error propagates to the host as a thrown error
    /// instead of an `{error}` result object.
    #[inline]
    pub fn is_thrown(&self) -> bool {
        matches!(
            self,
            SnapError::InvalidIndex | SnapError::MethodNotFound | SnapError::Host(_)
        )
    }

    /// Returns true if the caller supplied bad input.
    #[inline]
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            SnapError::InvalidIndex | SnapError::MalformedInput(_) | SnapError::MethodNotFound
        )
    }

    /// Returns the JSON-RPC error code for thrown errors.
    #[inline]
    pub fn code(&self) -> i64 {
        INTERNAL_ERROR_CODE
    }
}

/// JSON-RPC error object wrapping a thrown [`SnapError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

impl From<&SnapError> for JsonRpcError {
    fn from(e: &SnapError) -> Self {
        JsonRpcError {
            code: e.code(),
            message: e.to_string(),
        }
    }
}

impl From<SnapError> for JsonRpcError {
    fn from(e: SnapError) -> Self {
        JsonRpcError::from(&e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            SnapError::InvalidIndex.to_string(),
            "Invalid BIP-32 index: Must be a non-negative integer."
        );
        assert_eq!(
            SnapError::UnsupportedCurve("ed448".into()).to_string(),
            "Unsupported curve. Received ed448. Only Secp256K1 && Ed25519 are supported."
        );
        assert_eq!(
            SnapError::NoPrivateKey(3).to_string(),
            "No private key associated with the account 3."
        );
        assert_eq!(SnapError::MethodNotFound.to_string(), "Method not found.");
    }

    #[test]
    fn test_error_classification() {
        assert!(SnapError::InvalidIndex.is_thrown());
        assert!(SnapError::MethodNotFound.is_thrown());
        assert!(!SnapError::UnsupportedCurve("x".into()).is_thrown());
        assert!(!SnapError::NoPrivateKey(0).is_thrown());
        assert!(SnapError::MalformedInput("bad".into()).is_input_error());
    }

    #[test]
    fn test_json_rpc_error() {
        let err = JsonRpcError::from(SnapError::MethodNotFound);
        assert_eq!(err.code, -32603);
        assert_eq!(err.message, "Method not found.");
    }
}
