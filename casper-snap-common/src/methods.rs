//! RPC methods exposed by the snap.
//!
//! Each method corresponds to a specific operation that can be
//! requested through `wallet_invokeSnap`.

use core::fmt;
use core::str::FromStr;

use crate::error::SnapError;

/// Methods routed by the snap dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcMethod {
    // === Key Management ===

    /// Get the Casper public key for an address index.
    /// Params: `{ addressIndex? }`.
    /// Returns: `{ publicKey }`.
    GetAccount,

    // === Transaction Signing ===

    /// Sign a legacy deploy or a unified transaction.
    /// Params: `{ deployJson? | transaction?, addressIndex?, expectedTarget? }`.
    /// Returns: `{ deploy } | { transaction } | { error } | false`.
    Sign,

    // === Message Signing ===

    /// Sign a prefixed UTF-8 message.
    /// Params: `{ message, addressIndex? }`.
    /// Returns: `{ signature } | { error } | false`.
    SignMessage,
}

impl RpcMethod {
    /// All routed methods.
    pub const ALL: [RpcMethod; 3] = [RpcMethod::GetAccount, RpcMethod::Sign, RpcMethod::SignMessage];

    /// Returns the wire name of the method.
    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            RpcMethod::GetAccount => "casper_getAccount",
            RpcMethod::Sign => "casper_sign",
            RpcMethod::SignMessage => "casper_signMessage",
        }
    }

    /// Returns true if the method produces a signature.
    #[inline]
    pub fn is_signing(self) -> bool {
        matches!(self, RpcMethod::Sign | RpcMethod::SignMessage)
    }
}

impl FromStr for RpcMethod {
    type Err = SnapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RpcMethod::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or(SnapError::MethodNotFound)
    }
}

impl fmt::Display for RpcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
