//! API-level error types for the client library.
//!
//! These errors wrap both transport failures and snap-level errors,
//! providing a unified error type for client code.

use casper_snap_common::JsonRpcError;
use thiserror::Error;

/// Errors that can occur when using the snap client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The wallet provider could not be reached.
    #[error("Transport failed: {0}")]
    Transport(String),

    /// The snap returned an `{error}` result.
    #[error("{0}")]
    Snap(String),

    /// The user rejected the request.
    #[error("{0}")]
    Rejected(String),

    /// The snap threw a JSON-RPC error.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Response did not have the expected shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Returns true if this error indicates the user rejected the operation.
    #[inline]
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, ApiError::Rejected(_))
    }

    /// Returns the message reported by the snap, if the snap produced it.
    pub fn snap_message(&self) -> Option<&str> {
        match self {
            ApiError::Snap(msg) | ApiError::Rpc { message: msg, .. } => Some(msg),
            _ => None,
        }
    }
}

impl From<JsonRpcError> for ApiError {
    fn from(e: JsonRpcError) -> Self {
        ApiError::Rpc {
            code: e.code,
            message: e.message,
        }
    }
}
