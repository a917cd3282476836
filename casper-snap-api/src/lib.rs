//! Client library for the Casper wallet snap.
//!
//! This crate provides a typed API for dapps to talk to the snap through
//! the wallet provider's JSON-RPC interface.
//!
//! # Example
//!
//! ```ignore
//! use casper_snap_api::{SignOptions, SnapClient};
//!
//! let client = SnapClient::new(provider);
//! if client.get_snap().await?.is_none() {
//!     client.install(None).await?;
//! }
//!
//! // Get the public key for account 0
//! let public_key = client.get_account(0).await?;
//!
//! // Sign a deploy
//! let signed = client.sign_deploy(&deploy_json, &SignOptions::index(0)).await?;
//! ```
//!
//! # Security
//!
//! - Keys never leave the snap
//! - User confirmation is required for signing operations
//! - A rejected dialog surfaces as [`ApiError::Rejected`]

mod client;
mod error;

pub use client::{SignOptions, SnapClient, SnapInfo, SnapTransport};
pub use error::ApiError;

// Re-export common types for convenience
pub use casper_snap_common::{
    AccountResponse, JsonRpcError, RpcMethod, SignatureResult, SnapError, SNAP_ID,
};
