//! Transaction and message signing.
//!
//! A request moves through these steps:
//! 1. Validate the address index (thrown on failure)
//! 2. Fetch the key material
//! 3. Check that exactly one envelope field is populated
//! 4. Parse and hash-check the envelope
//! 5. Classify and build the review dialog
//! 6. Wait for the user
//! 7. Sign the hash, attach the approval and re-validate
//!
//! # Security
//!
//! - Nothing is signed without an approved dialog
//! - The hash carried in the request is recomputed before display
//! - The signed envelope is re-validated before it leaves the snap

use casper_snap_common::{SignatureResult, SnapConfig, SnapError, MAX_MESSAGE_SIZE};
use serde_json::Value;

use crate::classifier::{classify, TransactionKind};
use crate::decoder::DecodeOptions;
use crate::keys;
use crate::platform::Platform;
use crate::presentation;
use crate::transaction::{attach_approval, detect, Approval, EnvelopeKind, Transaction};
use crate::ui;

// =============================================================================
// Input validation
// =============================================================================

/// The one envelope a sign request carries.
#[derive(Debug, Clone, PartialEq)]
pub enum SignInput {
    /// `deployJson`: legacy deploys only.
    Deploy(Value),
    /// `transaction`: deploys or unified transactions.
    Transaction(Value),
}

/// Parsed envelope plus the JSON body it came from.
#[derive(Debug, Clone)]
pub struct ParsedEnvelope {
    pub tx: Transaction,
    pub body: Value,
}

fn populated(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null() && v.as_str() != Some(""))
}

fn convert_error(cause: impl std::fmt::Display) -> SnapError {
    SnapError::MalformedInput(format!(
        "Unable to convert json into deploy object. Details : {}",
        cause
    ))
}

impl SignInput {
    /// Accepts exactly one populated field.
    pub fn new(deploy_json: Option<&Value>, transaction: Option<&Value>) -> Result<Self, SnapError> {
        match (populated(deploy_json), populated(transaction)) {
            (Some(_), Some(_)) => Err(SnapError::MalformedInput(
                "Only deployJson field or transaction field should be populated not both.".into(),
            )),
            (None, None) => Err(SnapError::MalformedInput(
                "Either deployJson field or transaction field should be populated.".into(),
            )),
            (Some(deploy), None) => Ok(SignInput::Deploy(deploy.clone())),
            (None, Some(tx)) => Ok(SignInput::Transaction(tx.clone())),
        }
    }

    /// Reads the field from a request's params.
    pub fn from_params(params: Option<&Value>) -> Result<Self, SnapError> {
        Self::new(
            params.and_then(|p| p.get("deployJson")),
            params.and_then(|p| p.get("transaction")),
        )
    }

    /// Parses the envelope and checks its hashes.
    ///
    /// The field may hold the document itself or a JSON string of it.
    pub fn parse(&self) -> Result<ParsedEnvelope, SnapError> {
        let raw = match self {
            SignInput::Deploy(v) | SignInput::Transaction(v) => v,
        };
        let document = match raw {
            Value::String(s) => serde_json::from_str(s).map_err(convert_error)?,
            other => other.clone(),
        };

        let (kind, body) = detect(&document).map_err(convert_error)?;
        if matches!(self, SignInput::Deploy(_)) && kind == EnvelopeKind::TransactionV1 {
            return Err(SnapError::MalformedInput(
                "The field deployJson only supports legacy deploys".into(),
            ));
        }
        let tx = Transaction::from_json(kind, body).map_err(convert_error)?;
        Ok(ParsedEnvelope {
            tx,
            body: body.clone(),
        })
    }
}

fn expected_target(params: Option<&Value>) -> Option<&str> {
    params
        .and_then(|p| p.get("expectedTarget"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Folds recoverable failures into an `{error}` result.
fn fold_errors(result: Result<SignatureResult, SnapError>) -> Result<SignatureResult, SnapError> {
    match result {
        Err(e) if !e.is_thrown() => {
            if e.is_input_error() {
                log::info!("snap: rejected input: {}", e);
            } else {
                log::warn!("snap: request failed: {}", e);
            }
            Ok(SignatureResult::Error(e.to_string()))
        }
        other => other,
    }
}

// =============================================================================
// casper_sign
// =============================================================================

/// Handles `casper_sign`.
pub async fn sign<P: Platform + ?Sized>(
    platform: &P,
    config: &SnapConfig,
    origin: &str,
    params: Option<&Value>,
) -> Result<SignatureResult, SnapError> {
    let index = keys::parse_address_index(params.and_then(|p| p.get("addressIndex")))?;
    fold_errors(sign_envelope(platform, config, origin, params, index).await)
}

async fn sign_envelope<P: Platform + ?Sized>(
    platform: &P,
    config: &SnapConfig,
    origin: &str,
    params: Option<&Value>,
    index: u32,
) -> Result<SignatureResult, SnapError> {
    let key = keys::derive(platform, config.coin_type, index).await?;

    let input = SignInput::from_params(params)?;
    let envelope = input.parse()?;
    let tx = &envelope.tx;

    let opts = DecodeOptions {
        expand_nested_lists: config.expand_nested_lists,
    };
    let classification = classify(tx, expected_target(params), &opts)?;
    if classification.kind == TransactionKind::Unsupported {
        return Err(SnapError::MalformedInput("Unsupported transaction type".into()));
    }
    log::info!(
        "snap: {} request on {} for account {}",
        classification.kind.label(),
        tx.chain_name(),
        index
    );

    let signer = key.signer()?;

    let payload = presentation::build(tx, &classification, &key.public_key.to_hex(), origin);
    let dialog = ui::render_transaction(&payload, config);
    if !ui::confirm(platform, &dialog).await? {
        log::info!("snap: user rejected {}", hex::encode(tx.hash()));
        return Ok(SignatureResult::Rejected);
    }

    let approval = Approval {
        signer: key.public_key.clone(),
        signature: signer.sign(tx.hash())?,
    };
    let signed = attach_approval(&envelope.body, &approval)
        .map_err(|e| SnapError::ValidationFailed(e.to_string()))?;
    Transaction::from_json(tx.kind(), &signed)
        .map_err(|e| SnapError::ValidationFailed(e.to_string()))?
        .validate()
        .map_err(SnapError::ValidationFailed)?;

    log::info!("snap: signed {}", hex::encode(tx.hash()));
    Ok(match tx.kind() {
        EnvelopeKind::Deploy => SignatureResult::Deploy(signed),
        EnvelopeKind::TransactionV1 => SignatureResult::Transaction(signed),
    })
}

// =============================================================================
// casper_signMessage
// =============================================================================

/// Handles `casper_signMessage`.
pub async fn sign_message<P: Platform + ?Sized>(
    platform: &P,
    config: &SnapConfig,
    origin: &str,
    params: Option<&Value>,
) -> Result<SignatureResult, SnapError> {
    let index = keys::parse_address_index(params.and_then(|p| p.get("addressIndex")))?;
    fold_errors(sign_prefixed_message(platform, config, origin, params, index).await)
}

async fn sign_prefixed_message<P: Platform + ?Sized>(
    platform: &P,
    config: &SnapConfig,
    origin: &str,
    params: Option<&Value>,
    index: u32,
) -> Result<SignatureResult, SnapError> {
    let message = params
        .and_then(|p| p.get("message"))
        .and_then(Value::as_str)
        .ok_or_else(|| SnapError::MalformedInput("Message must be a string.".into()))?;
    if message.len() > MAX_MESSAGE_SIZE {
        return Err(SnapError::MalformedInput(format!(
            "Message exceeds maximum size of {} bytes.",
            MAX_MESSAGE_SIZE
        )));
    }

    let key = keys::derive(platform, config.coin_type, index).await?;
    let signer = key.signer()?;

    let dialog = ui::render_message(origin, &key.public_key.to_hex(), message);
    if !ui::confirm(platform, &dialog).await? {
        log::info!("snap: user rejected message signing");
        return Ok(SignatureResult::Rejected);
    }

    let mut payload = Vec::with_capacity(config.message_prefix.len() + message.len());
    payload.extend_from_slice(config.message_prefix.as_bytes());
    payload.extend_from_slice(message.as_bytes());
    let signature = signer.sign(&payload)?;

    log::info!("snap: signed message for account {}", index);
    Ok(SignatureResult::Signature(signature.to_hex()))
}
