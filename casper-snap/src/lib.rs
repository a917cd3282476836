//! Casper transaction review and signing core.
//!
//! This crate implements the request handling of a Casper wallet snap:
//! it decodes deploys and unified transactions, shows the user what they
//! are about to sign, and signs with keys derived from the host wallet.
//!
//! # Architecture
//!
//! The host forwards each `wallet_invokeSnap` request to [`Dispatcher`]:
//! 1. The dispatcher routes the method and validates the address index
//! 2. Key material comes from the host keyring ([`KeyringHost`])
//! 3. Envelopes are parsed, hash-checked and classified
//! 4. A review dialog is shown through [`DialogHost`]
//! 5. On approval the signed envelope is re-validated and returned
//!
//! # Security Model
//!
//! - Private keys never leave the request that derived them
//! - User confirmation required for all signing operations
//! - Fail closed on any validation error
//!
//! # Example
//!
//! ```ignore
//! use casper_snap::{Dispatcher, MockPlatform, SnapConfig};
//!
//! let snap = Dispatcher::new(MockPlatform::new(), SnapConfig::default());
//! let account = snap.handle("https://dapp.example", "casper_getAccount", None).await?;
//! ```

pub mod classifier;
pub mod codec;
pub mod crypto;
pub mod decoder;
pub mod keys;
pub mod platform;
pub mod presentation;
pub mod rpc;
pub mod signer;
pub mod transaction;
pub mod ui;

pub use classifier::{classify, Classification, StakingAction, TransactionKind};
pub use decoder::{decode, DecodeOptions, DisplayForm, TypedValue};
pub use platform::{DialogHost, HostKey, KeyringHost, MockPlatform, Platform};
pub use rpc::Dispatcher;
pub use signer::SignInput;
pub use transaction::{EnvelopeKind, Transaction};
pub use ui::DialogContent;

pub use casper_snap_common::{
    AccountResponse, Bip32Path, Curve, JsonRpcError, RpcMethod, SignatureResult, SnapConfig,
    SnapError,
};

/// Installs `env_logger` for host-side diagnostics.
///
/// Respects `RUST_LOG`; defaults to `info`. Safe to call more than once.
#[cfg(feature = "debug")]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
