//! Common types for the Casper snap.
//!
//! This crate provides shared types used by both the snap core and the
//! client library: the RPC method table, request/response shapes, the
//! error type and the snap configuration.
//!
//! # Security Note
//!
//! These types cross trust boundaries. All validation must happen
//! in the snap core after deserialization.

pub mod config;
pub mod error;
pub mod methods;
pub mod types;

pub use config::SnapConfig;
pub use error::{JsonRpcError, SnapError};
pub use methods::RpcMethod;
pub use types::*;

/// SLIP-44 coin type registered for Casper.
pub const COIN_TYPE: u32 = 506;

/// Default snap identifier used by the client library.
pub const SNAP_ID: &str = "npm:casper-manager";

/// Prefix prepended to every message before signing.
pub const MESSAGE_PREFIX: &str = "Casper Message:\n";

/// Default block explorer search URL.
pub const EXPLORER_URL: &str = "https://cspr.live/search/";

/// Number of motes in one CSPR.
pub const MOTES_PER_CSPR: u64 = 1_000_000_000;

/// First hardened BIP-32 index; address indices must stay below it.
pub const HARDENED_OFFSET: u32 = 0x8000_0000;
