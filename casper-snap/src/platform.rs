//! Platform abstraction layer for the snap host.
//!
//! This module provides the interface to the host capabilities the snap
//! depends on:
//! - Keyring: per-index key material derived from the wallet's entropy
//! - Dialog: confirmation screens
//!
//! # Design
//!
//! The host traits hide the wallet-specific RPC details. The host wires
//! in its own implementation; tests use [`MockPlatform`].

use std::sync::Mutex;

use async_trait::async_trait;
use casper_snap_common::{Bip32Path, Curve, SnapError};
use zeroize::Zeroizing;

use crate::crypto::{self, Seed};
use crate::ui::DialogContent;

/// Key material handed out by the host for one address index.
pub struct HostKey {
    /// Curve name as reported by the host, e.g. `ed25519`.
    pub curve: String,
    /// Public key bytes, without the Casper algorithm tag.
    pub public_key: Vec<u8>,
    /// Private key bytes, absent when the host exposes public material only.
    pub private_key: Option<Zeroizing<Vec<u8>>>,
}

impl std::fmt::Debug for HostKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostKey")
            .field("curve", &self.curve)
            .field("public_key", &hex::encode(&self.public_key))
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Host entropy service.
#[async_trait]
pub trait KeyringHost: Send + Sync {
    /// Returns the key material for `index` under the coin-type node.
    async fn derive_address_key(&self, coin_type: u32, index: u32) -> Result<HostKey, SnapError>;
}

/// Host confirmation dialog.
#[async_trait]
pub trait DialogHost: Send + Sync {
    /// Shows `content` and returns true if the user approved.
    async fn confirm(&self, content: &DialogContent) -> Result<bool, SnapError>;
}

/// Everything the snap needs from its host.
pub trait Platform: KeyringHost + DialogHost {}

impl<T: KeyringHost + DialogHost> Platform for T {}

// =============================================================================
// Mock Platform (for testing)
// =============================================================================

/// BIP-39 seed of the "abandon abandon ... about" test mnemonic.
const TEST_SEED: [u8; 64] = [
    0x5e, 0xb0, 0x0b, 0xbd, 0xdc, 0xf0, 0x69, 0x08, 0x48, 0x89, 0xa8, 0xab, 0x91, 0x55, 0x56, 0x81,
    0x65, 0xf5, 0xc4, 0x53, 0xcc, 0xb8, 0x5e, 0x70, 0x81, 0x1a, 0xae, 0xd6, 0xf6, 0xda, 0x5f, 0xc1,
    0x9a, 0x5a, 0xc4, 0x0b, 0x38, 0x9c, 0xd3, 0x70, 0xd0, 0x86, 0x20, 0x6d, 0xec, 0x8a, 0xa6, 0xc4,
    0x3d, 0xae, 0xa6, 0x69, 0x0f, 0x20, 0xad, 0x3d, 0x8d, 0x48, 0xb2, 0xd2, 0xce, 0x9e, 0x38, 0xe4,
];

/// Seed-backed platform for tests.
pub struct MockPlatform {
    seed: Seed,
    curve: String,
    auto_approve: bool,
    withhold_private_key: bool,
    dialogs: Mutex<DialogLog>,
}

#[derive(Default)]
struct DialogLog {
    last: Option<DialogContent>,
    count: usize,
}

impl MockPlatform {
    /// Ed25519 keyring over the test seed, approving every dialog.
    pub fn new() -> Self {
        Self::with_seed(Seed::from_bytes(&TEST_SEED))
    }

    pub fn with_seed(seed: Seed) -> Self {
        Self {
            seed,
            curve: Curve::Ed25519.host_name().to_string(),
            auto_approve: true,
            withhold_private_key: false,
            dialogs: Mutex::new(DialogLog::default()),
        }
    }

    /// Selects the curve the keyring reports. Any name is accepted.
    pub fn with_curve(mut self, curve: &str) -> Self {
        self.curve = curve.to_string();
        self
    }

    /// Set auto-approve mode for testing.
    pub fn set_auto_approve(&mut self, approve: bool) {
        self.auto_approve = approve;
    }

    /// Hand out public key material only.
    pub fn set_withhold_private_key(&mut self, withhold: bool) {
        self.withhold_private_key = withhold;
    }

    /// Content of the most recent dialog.
    pub fn last_dialog(&self) -> Option<DialogContent> {
        self.dialogs.lock().ok().and_then(|log| log.last.clone())
    }

    /// Number of dialogs shown so far.
    pub fn dialog_count(&self) -> usize {
        self.dialogs.lock().map(|log| log.count).unwrap_or(0)
    }
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyringHost for MockPlatform {
    async fn derive_address_key(&self, coin_type: u32, index: u32) -> Result<HostKey, SnapError> {
        let (public_key, private_key) = match Curve::from_host_name(&self.curve) {
            Some(Curve::Secp256k1) => {
                let key = crypto::derive_secp256k1(&self.seed, &Bip32Path::bip44(coin_type, index))?;
                let public_key = crypto::get_compressed_pubkey(&key).to_vec();
                (public_key, Zeroizing::new(key.to_bytes().to_vec()))
            }
            Some(Curve::Ed25519) => {
                let key = crypto::derive_ed25519(&self.seed, &Bip32Path::slip10(coin_type, index))?;
                // The keyring reports ed25519 keys with a zero prefix byte.
                let mut public_key = vec![0u8];
                public_key.extend_from_slice(key.verifying_key().as_bytes());
                (public_key, Zeroizing::new(key.to_bytes().to_vec()))
            }
            None => (vec![0u8; 33], Zeroizing::new(vec![0u8; 32])),
        };

        log::debug!("MockPlatform: derived {} key for index {}", self.curve, index);
        Ok(HostKey {
            curve: self.curve.clone(),
            public_key,
            private_key: (!self.withhold_private_key).then_some(private_key),
        })
    }
}

#[async_trait]
impl DialogHost for MockPlatform {
    async fn confirm(&self, content: &DialogContent) -> Result<bool, SnapError> {
        let mut log = self
            .dialogs
            .lock()
            .map_err(|_| SnapError::Host("dialog log poisoned".into()))?;
        log.last = Some(content.clone());
        log.count += 1;
        log::info!(
            "MockPlatform: dialog with {} components -> {}",
            content.components.len(),
            self.auto_approve
        );
        Ok(self.auto_approve)
    }
}
