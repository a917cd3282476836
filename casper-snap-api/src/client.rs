//! Snap client over a wallet provider transport.
//!
//! This module provides the client type that wraps every snap method in
//! a `wallet_invokeSnap` request and turns the snap's loosely typed
//! responses into `Result`s.

use async_trait::async_trait;
use casper_snap_common::{AccountResponse, RpcMethod, SignatureResult, SNAP_ID};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::ApiError;

/// Request channel to the wallet provider (`window.ethereum` in a dapp).
#[async_trait]
pub trait SnapTransport: Send + Sync {
    /// Sends one provider request and returns its result.
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, ApiError>;
}

/// Installed snap as reported by `wallet_getSnaps`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapInfo {
    pub id: String,
    pub version: String,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub blocked: Option<bool>,
}

/// Per-request signing options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignOptions {
    /// Account index; the snap defaults to 0.
    pub address_index: Option<u32>,
    /// Transfer recipient the dapp expects, checked by the snap.
    pub expected_target: Option<String>,
}

impl SignOptions {
    pub fn index(address_index: u32) -> Self {
        Self {
            address_index: Some(address_index),
            expected_target: None,
        }
    }

    fn write(&self, params: &mut Map<String, Value>) {
        if let Some(index) = self.address_index {
            params.insert("addressIndex".into(), json!(index));
        }
        if let Some(target) = &self.expected_target {
            params.insert("expectedTarget".into(), json!(target));
        }
    }
}

/// Client for the Casper snap.
///
/// # Example
///
/// ```ignore
/// let client = SnapClient::new(provider);
/// let public_key = client.get_account(0).await?;
/// let signed = client.sign_deploy(&deploy_json, &SignOptions::default()).await?;
/// ```
pub struct SnapClient<T> {
    transport: T,
    snap_id: String,
}

impl<T: SnapTransport> SnapClient<T> {
    /// Creates a client for the default snap id.
    pub fn new(transport: T) -> Self {
        Self::with_snap_id(transport, SNAP_ID)
    }

    pub fn with_snap_id(transport: T, snap_id: impl Into<String>) -> Self {
        Self {
            transport,
            snap_id: snap_id.into(),
        }
    }

    pub fn snap_id(&self) -> &str {
        &self.snap_id
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // =========================================================================
    // Provider
    // =========================================================================

    /// Returns true if the provider is a Flask build.
    ///
    /// Any provider error counts as "not Flask".
    pub async fn is_flask(&self) -> bool {
        match self.transport.request("web3_clientVersion", None).await {
            Ok(Value::String(version)) => version.contains("flask"),
            Ok(Value::Array(items)) => items.iter().any(|v| v.as_str() == Some("flask")),
            _ => false,
        }
    }

    /// Requests installation of the snap, optionally pinned to `version`.
    pub async fn install(&self, version: Option<&str>) -> Result<(), ApiError> {
        let mut options = Map::new();
        if let Some(version) = version {
            options.insert("version".into(), json!(version));
        }
        let mut params = Map::new();
        params.insert(self.snap_id.clone(), Value::Object(options));

        log::info!("snap-api: installing {}", self.snap_id);
        self.transport
            .request("wallet_requestSnaps", Some(Value::Object(params)))
            .await?;
        Ok(())
    }

    /// Returns the installed snap matching this client's id, if any.
    pub async fn get_snap(&self) -> Result<Option<SnapInfo>, ApiError> {
        let snaps = self.transport.request("wallet_getSnaps", None).await?;
        let Value::Object(snaps) = snaps else {
            return Err(ApiError::InvalidResponse("wallet_getSnaps".into()));
        };
        for snap in snaps.values() {
            let info: SnapInfo = serde_json::from_value(snap.clone())
                .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
            if info.id == self.snap_id {
                return Ok(Some(info));
            }
        }
        Ok(None)
    }

    // =========================================================================
    // Snap methods
    // =========================================================================

    /// Returns the public key hex for `address_index`.
    pub async fn get_account(&self, address_index: u32) -> Result<String, ApiError> {
        let response = self
            .invoke(RpcMethod::GetAccount, json!({ "addressIndex": address_index }))
            .await?;
        if let Some(error) = response.get("error").and_then(Value::as_str) {
            return Err(ApiError::Snap(error.to_string()));
        }
        let account: AccountResponse = serde_json::from_value(response)
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        Ok(account.public_key)
    }

    /// Signs a legacy deploy and returns the signed deploy JSON.
    pub async fn sign_deploy(&self, deploy: &Value, options: &SignOptions) -> Result<Value, ApiError> {
        match self.sign("deployJson", deploy, options).await? {
            SignatureResult::Deploy(signed) => Ok(signed),
            SignatureResult::Rejected => Err(ApiError::Rejected("Rejected deploy.".into())),
            other => Err(unexpected(other)),
        }
    }

    /// Signs a unified transaction and returns the signed transaction JSON.
    pub async fn sign_transaction(
        &self,
        transaction: &Value,
        options: &SignOptions,
    ) -> Result<Value, ApiError> {
        match self.sign("transaction", transaction, options).await? {
            SignatureResult::Transaction(signed) | SignatureResult::Deploy(signed) => Ok(signed),
            SignatureResult::Rejected => Err(ApiError::Rejected("Rejected transaction.".into())),
            other => Err(unexpected(other)),
        }
    }

    /// Signs a message and returns the tagged signature hex.
    pub async fn sign_message(
        &self,
        message: &str,
        options: &SignOptions,
    ) -> Result<String, ApiError> {
        let mut params = Map::new();
        params.insert("message".into(), json!(message));
        options.write(&mut params);

        let response = self
            .invoke(RpcMethod::SignMessage, Value::Object(params))
            .await?;
        match parse_result(&response)? {
            SignatureResult::Signature(signature) => Ok(signature),
            SignatureResult::Rejected => Err(ApiError::Rejected("Rejected message.".into())),
            other => Err(unexpected(other)),
        }
    }

    async fn sign(
        &self,
        field: &str,
        envelope: &Value,
        options: &SignOptions,
    ) -> Result<SignatureResult, ApiError> {
        let mut params = Map::new();
        params.insert(field.into(), envelope.clone());
        options.write(&mut params);

        let response = self.invoke(RpcMethod::Sign, Value::Object(params)).await?;
        parse_result(&response)
    }

    async fn invoke(&self, method: RpcMethod, params: Value) -> Result<Value, ApiError> {
        log::debug!("snap-api: {} via {}", method, self.snap_id);
        self.transport
            .request(
                "wallet_invokeSnap",
                Some(json!({
                    "snapId": self.snap_id,
                    "request": { "method": method.name(), "params": params },
                })),
            )
            .await
    }
}

/// Maps `{error}` to [`ApiError::Snap`] and keeps every other shape.
fn parse_result(response: &Value) -> Result<SignatureResult, ApiError> {
    match SignatureResult::from_value(response) {
        Some(SignatureResult::Error(error)) => Err(ApiError::Snap(error)),
        Some(result) => Ok(result),
        None => Err(ApiError::InvalidResponse(response.to_string())),
    }
}

fn unexpected(result: SignatureResult) -> ApiError {
    ApiError::InvalidResponse(result.to_value().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Replays a fixed response and records the last request.
    struct Canned {
        response: Value,
        last: Mutex<Option<(String, Option<Value>)>>,
    }

    impl Canned {
        fn new(response: Value) -> Self {
            Self {
                response,
                last: Mutex::new(None),
            }
        }

        fn last(&self) -> (String, Option<Value>) {
            self.last.lock().unwrap().clone().unwrap()
        }
    }

    #[async_trait]
    impl SnapTransport for Canned {
        async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, ApiError> {
            *self.last.lock().unwrap() = Some((method.to_string(), params));
            Ok(self.response.clone())
        }
    }

    #[tokio::test]
    async fn test_invoke_envelope() {
        let client = SnapClient::new(Canned::new(json!({ "publicKey": "01ab" })));
        assert_eq!(client.get_account(2).await.unwrap(), "01ab");

        let (method, params) = client.transport().last();
        assert_eq!(method, "wallet_invokeSnap");
        assert_eq!(
            params.unwrap(),
            json!({
                "snapId": "npm:casper-manager",
                "request": { "method": "casper_getAccount", "params": { "addressIndex": 2 } },
            })
        );
    }

    #[tokio::test]
    async fn test_sign_options_written() {
        let client = SnapClient::new(Canned::new(json!({ "deploy": {} })));
        let options = SignOptions {
            address_index: Some(1),
            expected_target: Some("account-hash-00".into()),
        };
        client.sign_deploy(&json!({ "hash": "" }), &options).await.unwrap();

        let (_, params) = client.transport().last();
        let params = &params.unwrap()["request"]["params"];
        assert_eq!(params["addressIndex"], 1);
        assert_eq!(params["expectedTarget"], "account-hash-00");
        assert_eq!(params["deployJson"], json!({ "hash": "" }));
    }

    #[tokio::test]
    async fn test_rejections() {
        let client = SnapClient::new(Canned::new(Value::Bool(false)));
        let opts = SignOptions::default();
        let err = client.sign_deploy(&json!({}), &opts).await.unwrap_err();
        assert_eq!(err, ApiError::Rejected("Rejected deploy.".into()));
        let err = client.sign_transaction(&json!({}), &opts).await.unwrap_err();
        assert_eq!(err.to_string(), "Rejected transaction.");
        let err = client.sign_message("hi", &opts).await.unwrap_err();
        assert_eq!(err.to_string(), "Rejected message.");
    }

    #[tokio::test]
    async fn test_error_result() {
        let client = SnapClient::new(Canned::new(json!({ "error": "Unsupported transaction type" })));
        let err = client
            .sign_transaction(&json!({}), &SignOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::Snap("Unsupported transaction type".into()));
    }

    #[tokio::test]
    async fn test_is_flask() {
        let client = SnapClient::new(Canned::new(json!("MetaMask/v11.3.0-flask.1")));
        assert!(client.is_flask().await);
        let client = SnapClient::new(Canned::new(json!("MetaMask/v11.3.0")));
        assert!(!client.is_flask().await);
    }

    #[tokio::test]
    async fn test_get_snap() {
        let client = SnapClient::with_snap_id(
            Canned::new(json!({
                "local:http://localhost:8080": { "id": "local:http://localhost:8080", "version": "0.1.0" },
                "npm:other": { "id": "npm:other", "version": "1.0.0" },
            })),
            "local:http://localhost:8080",
        );
        let snap = client.get_snap().await.unwrap().unwrap();
        assert_eq!(snap.version, "0.1.0");
    }

    #[tokio::test]
    async fn test_install_params() {
        let client = SnapClient::new(Canned::new(Value::Null));
        client.install(Some("^1.0.0")).await.unwrap();
        let (method, params) = client.transport().last();
        assert_eq!(method, "wallet_requestSnaps");
        assert_eq!(params.unwrap(), json!({ "npm:casper-manager": { "version": "^1.0.0" } }));
    }
}
