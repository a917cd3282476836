//! RPC dispatcher.
//!
//! Routes `wallet_invokeSnap` requests to their handlers and shapes the
//! responses. Recoverable failures come back as `{error}` objects; the
//! rest are returned as `Err` for the host to throw.

use casper_snap_common::{AccountResponse, JsonRpcError, RpcMethod, SnapConfig, SnapError};
use serde_json::Value;

use crate::keys;
use crate::platform::Platform;
use crate::signer;

/// Request router holding the host capabilities and configuration.
pub struct Dispatcher<P> {
    platform: P,
    config: SnapConfig,
}

impl<P: Platform> Dispatcher<P> {
    pub fn new(platform: P, config: SnapConfig) -> Self {
        Self { platform, config }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn config(&self) -> &SnapConfig {
        &self.config
    }

    /// Handles one request and returns its JSON result.
    pub async fn handle(
        &self,
        origin: &str,
        method: &str,
        params: Option<&Value>,
    ) -> Result<Value, SnapError> {
        let method: RpcMethod = method.parse().map_err(|e| {
            log::warn!("snap: unknown method '{}' from {}", method, origin);
            e
        })?;
        if method.is_signing() {
            log::info!("snap: {} from {}", method, origin);
        } else {
            log::debug!("snap: {} from {}", method, origin);
        }

        match method {
            RpcMethod::GetAccount => {
                let account = self.get_account(params).await?;
                serde_json::to_value(account).map_err(|e| SnapError::Host(e.to_string()))
            }
            RpcMethod::Sign => {
                signer::sign(&self.platform, &self.config, origin, params)
                    .await
                    .map(|r| r.to_value())
            }
            RpcMethod::SignMessage => {
                signer::sign_message(&self.platform, &self.config, origin, params)
                    .await
                    .map(|r| r.to_value())
            }
        }
    }

    /// Handles `casper_getAccount`. Every failure is thrown.
    pub async fn get_account(&self, params: Option<&Value>) -> Result<AccountResponse, SnapError> {
        let index = keys::parse_address_index(params.and_then(|p| p.get("addressIndex")))?;
        let key = keys::derive(&self.platform, self.config.coin_type, index).await?;
        Ok(AccountResponse {
            public_key: key.public_key.to_hex(),
        })
    }

    /// Like [`Dispatcher::handle`], with thrown errors wrapped as JSON-RPC
    /// error objects.
    pub async fn handle_json_rpc(
        &self,
        origin: &str,
        method: &str,
        params: Option<&Value>,
    ) -> Result<Value, JsonRpcError> {
        self.handle(origin, method, params).await.map_err(|e| {
            log::warn!("snap: {} failed: {}", method, e);
            JsonRpcError::from(e)
        })
    }
}
